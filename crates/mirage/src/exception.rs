use std::fmt::{self, Display};

use strum::{Display, EnumString, IntoStaticStr};

/// Result type alias for operations that can produce a runtime error.
pub type RunResult<T> = Result<T, RunError>;

/// Exception types raised by the value model and the proxy forwarding surface.
///
/// Uses strum derives for automatic `Display`, `FromStr`, and `Into<&'static str>`
/// implementations. The string representation matches the variant name exactly
/// (e.g., `ValueError` -> "ValueError").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub enum ExcType {
    /// primary exception class - matches any exception in subtype checks.
    Exception,

    // --- ArithmeticError hierarchy ---
    /// Intermediate class for arithmetic errors.
    ArithmeticError,
    /// Subclass of ArithmeticError.
    OverflowError,
    /// Subclass of ArithmeticError.
    ZeroDivisionError,

    // --- LookupError hierarchy ---
    /// Intermediate class for lookup errors.
    LookupError,
    /// Subclass of LookupError.
    IndexError,
    /// Subclass of LookupError.
    KeyError,

    // --- Standalone exception types ---
    AttributeError,
    RuntimeError,
    StopIteration,
    TypeError,
    ValueError,
}

impl ExcType {
    /// Checks if this exception type is a subclass of another exception type.
    ///
    /// Implements the standard hierarchy: `Exception` is the base of everything,
    /// `LookupError` is the base for `KeyError` and `IndexError`, and
    /// `ArithmeticError` is the base for `OverflowError` and `ZeroDivisionError`.
    #[must_use]
    pub fn is_subtype_of(self, base: Self) -> bool {
        if self == base || base == Self::Exception {
            return true;
        }
        match base {
            Self::ArithmeticError => matches!(self, Self::OverflowError | Self::ZeroDivisionError),
            Self::LookupError => matches!(self, Self::IndexError | Self::KeyError),
            _ => false,
        }
    }

    /// Creates an `AttributeError` for a missing attribute.
    ///
    /// Matches CPython's format: `AttributeError: '{type}' object has no attribute '{attr}'`
    pub(crate) fn attribute_error(type_name: impl Display, attr: &str) -> RunError {
        RunError::new(
            Self::AttributeError,
            format!("'{type_name}' object has no attribute '{attr}'"),
        )
    }

    /// Creates a `TypeError` for an object that does not support iteration.
    ///
    /// Matches CPython's format: `TypeError: '{type}' object is not iterable`
    pub(crate) fn type_error_not_iterable(type_name: impl Display) -> RunError {
        RunError::new(Self::TypeError, format!("'{type_name}' object is not iterable"))
    }

    /// Creates a `TypeError` for calling an object that is not callable.
    pub(crate) fn type_error_not_callable(type_name: impl Display) -> RunError {
        RunError::new(Self::TypeError, format!("'{type_name}' object is not callable"))
    }

    /// Creates a `TypeError` for a binary operator applied to unsupported operand types.
    ///
    /// Matches CPython's format:
    /// `unsupported operand type(s) for {op}: '{left}' and '{right}'`
    pub(crate) fn type_error_operand(op: &str, lhs: impl Display, rhs: impl Display) -> RunError {
        RunError::new(
            Self::TypeError,
            format!("unsupported operand type(s) for {op}: '{lhs}' and '{rhs}'"),
        )
    }

    /// Creates a `TypeError` for an unsupported ordering comparison.
    ///
    /// Matches CPython's format:
    /// `'{op}' not supported between instances of '{left}' and '{right}'`
    pub(crate) fn type_error_cmp(op: &str, lhs: impl Display, rhs: impl Display) -> RunError {
        RunError::new(
            Self::TypeError,
            format!("'{op}' not supported between instances of '{lhs}' and '{rhs}'"),
        )
    }

    /// Creates a `TypeError` for hashing an unhashable type.
    pub(crate) fn type_error_unhashable(type_name: impl Display) -> RunError {
        RunError::new(Self::TypeError, format!("unhashable type: '{type_name}'"))
    }

    /// Creates a `TypeError` for subscripting a value that is not subscriptable.
    pub(crate) fn type_error_not_sub(type_name: impl Display) -> RunError {
        RunError::new(Self::TypeError, format!("'{type_name}' object is not subscriptable"))
    }

    /// Creates a `TypeError` for item assignment on a value that does not support it.
    pub(crate) fn type_error_not_sub_assignment(type_name: impl Display) -> RunError {
        RunError::new(
            Self::TypeError,
            format!("'{type_name}' object does not support item assignment"),
        )
    }

    /// Creates a `TypeError` for item deletion on a value that does not support it.
    pub(crate) fn type_error_not_sub_deletion(type_name: impl Display) -> RunError {
        RunError::new(
            Self::TypeError,
            format!("'{type_name}' object doesn't support item deletion"),
        )
    }

    /// Creates a `TypeError` for `len()` on a value without a length.
    pub(crate) fn type_error_no_len(type_name: impl Display) -> RunError {
        RunError::new(Self::TypeError, format!("object of type '{type_name}' has no len()"))
    }

    /// Creates a `TypeError` for a function called with arguments when it takes none.
    pub(crate) fn type_error_no_args(name: &str, count: usize) -> RunError {
        RunError::new(
            Self::TypeError,
            format!("{name}() takes no arguments ({count} given)"),
        )
    }

    /// Creates a `TypeError` for a function called with the wrong number of positional arguments.
    pub(crate) fn type_error_arg_count(name: &str, expected: usize, count: usize) -> RunError {
        let plural = if expected == 1 { "" } else { "s" };
        RunError::new(
            Self::TypeError,
            format!("{name}() takes exactly {expected} positional argument{plural} ({count} given)"),
        )
    }

    /// Creates a `ZeroDivisionError` for true division by zero.
    ///
    /// Matches CPython's format: `ZeroDivisionError: division by zero`
    pub(crate) fn zero_division() -> RunError {
        RunError::new(Self::ZeroDivisionError, "division by zero")
    }

    /// Creates a `ZeroDivisionError` for integer floor division by zero.
    pub(crate) fn zero_division_floor_int() -> RunError {
        RunError::new(Self::ZeroDivisionError, "integer division or modulo by zero")
    }

    /// Creates a `ZeroDivisionError` for float floor division by zero.
    pub(crate) fn zero_division_floor_float() -> RunError {
        RunError::new(Self::ZeroDivisionError, "float floor division by zero")
    }

    /// Creates an `IndexError` for a list index outside the valid range.
    pub(crate) fn index_error() -> RunError {
        RunError::new(Self::IndexError, "list index out of range")
    }

    /// Creates a `KeyError` carrying the repr of the missing key.
    pub(crate) fn key_error(key_repr: String) -> RunError {
        RunError::new(Self::KeyError, key_repr)
    }

    /// Creates an `OverflowError` for an i64 arithmetic overflow.
    pub(crate) fn int_overflow() -> RunError {
        RunError::new(Self::OverflowError, "int too large to represent")
    }

    /// Creates an `OverflowError` for a sequence repetition too large to allocate.
    pub(crate) fn overflow_repeat() -> RunError {
        RunError::new(Self::OverflowError, "repeated sequence is too long")
    }

    /// Creates a `TypeError` for repeating a sequence by a non-integer.
    ///
    /// Matches CPython's format: `can't multiply sequence by non-int of type '{type}'`
    pub(crate) fn type_error_sequence_repeat(type_name: impl Display) -> RunError {
        RunError::new(
            Self::TypeError,
            format!("can't multiply sequence by non-int of type '{type_name}'"),
        )
    }
}

/// A runtime error: an exception type plus an optional message argument.
///
/// This is the single error currency of the crate. Errors raised by the value
/// model (missing attribute, division by zero, unsupported operand) and errors
/// raised by proxy factories all take this shape and propagate unchanged
/// through the forwarding surface.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunError {
    exc_type: ExcType,
    arg: Option<String>,
}

impl RunError {
    /// Creates an error with a message argument.
    pub fn new(exc_type: ExcType, arg: impl Into<String>) -> Self {
        Self {
            exc_type,
            arg: Some(arg.into()),
        }
    }

    /// Creates an error with no message argument.
    #[must_use]
    pub fn empty(exc_type: ExcType) -> Self {
        Self { exc_type, arg: None }
    }

    /// Returns the exception type.
    #[must_use]
    pub fn exc_type(&self) -> ExcType {
        self.exc_type
    }

    /// Returns the message argument, if any.
    #[must_use]
    pub fn arg(&self) -> Option<&str> {
        self.arg.as_deref()
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.arg {
            Some(arg) => write!(f, "{}: {}", self.exc_type, arg),
            None => write!(f, "{}", self.exc_type),
        }
    }
}

impl std::error::Error for RunError {}

impl From<ExcType> for RunError {
    fn from(exc_type: ExcType) -> Self {
        Self::empty(exc_type)
    }
}
