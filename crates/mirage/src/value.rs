use std::{
    borrow::Cow,
    cell::RefCell,
    cmp::Ordering,
    fmt::{self, Write},
    rc::Rc,
};

use ahash::AHashSet;
use indexmap::IndexMap;

use crate::{
    args::ArgValues,
    dict::Dict,
    exception::{ExcType, RunError, RunResult},
    hash::{NONE_HASH, float_hash, int_hash, pointer_hash, str_hash},
    iter::ValueIter,
};

/// Primary dynamic value type: the kind of target a [`Proxy`](crate::Proxy) wraps.
///
/// Small immediate values (`None`, `Bool`, `Int`, `Float`) are stored inline;
/// strings, containers, instances, and functions are reference-counted handles.
/// Cloning a `Value` therefore clones a *handle*: two clones of a list share
/// the same storage, so a mutation through one is observable through the
/// other. This mirrors the reference semantics of the objects the original
/// forwarding surface operates on, and is what makes mutation through a proxy
/// visible via [`extract`](crate::extract).
#[derive(Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Immutable text, cheap to clone.
    Str(Rc<str>),
    /// Mutable sequence with shared identity.
    List(Rc<RefCell<Vec<Value>>>),
    /// Insertion-ordered mapping with shared identity.
    Dict(Rc<RefCell<Dict>>),
    /// A named attribute namespace: the target of the attribute protocol.
    Instance(Rc<RefCell<Instance>>),
    /// A named native callable.
    Function(NativeFunction),
}

/// An object with a class name and an ordered attribute namespace.
///
/// Attribute get/set/delete through the forwarding surface lands here.
/// Equality and hashing are by identity, as for Python instances without
/// `__eq__`/`__hash__` overrides.
#[derive(Debug)]
pub struct Instance {
    class_name: Rc<str>,
    attrs: IndexMap<String, Value>,
}

impl Instance {
    /// Returns the class name used in reprs and error messages.
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }
}

/// A native function: a name plus a reference-counted closure.
#[derive(Clone)]
pub struct NativeFunction {
    name: Rc<str>,
    func: Rc<dyn Fn(ArgValues) -> RunResult<Value>>,
}

impl NativeFunction {
    /// Returns the function's name, used in reprs and arity errors.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<function {}>", self.name)
    }
}

/// The six rich comparison operators of the forwarding surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Lt,
    Le,
    Eq,
    Ne,
    Gt,
    Ge,
}

impl CmpOp {
    pub(crate) fn symbol(self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }

    fn evaluate(self, ord: Ordering) -> bool {
        match self {
            Self::Lt => ord.is_lt(),
            Self::Le => ord.is_le(),
            Self::Eq => ord.is_eq(),
            Self::Ne => !ord.is_eq(),
            Self::Gt => ord.is_gt(),
            Self::Ge => ord.is_ge(),
        }
    }

    /// Direct float comparison: NaN operands make every ordering false
    /// rather than an error, matching IEEE 754 and CPython.
    fn evaluate_f64(self, a: f64, b: f64) -> bool {
        match self {
            Self::Lt => a < b,
            Self::Le => a <= b,
            Self::Eq => a == b,
            Self::Ne => a != b,
            Self::Gt => a > b,
            Self::Ge => a >= b,
        }
    }
}

impl Value {
    /// Creates a list value from items.
    #[must_use]
    pub fn list(items: Vec<Self>) -> Self {
        Self::List(Rc::new(RefCell::new(items)))
    }

    /// Creates a dict value from key-value pairs.
    ///
    /// Fails if any key is unhashable.
    pub fn dict(pairs: impl IntoIterator<Item = (Self, Self)>) -> RunResult<Self> {
        Ok(Self::Dict(Rc::new(RefCell::new(Dict::from_pairs(pairs)?))))
    }

    /// Creates an instance with a class name and initial attributes.
    pub fn instance<K: Into<String>>(
        class_name: impl Into<Rc<str>>,
        attrs: impl IntoIterator<Item = (K, Self)>,
    ) -> Self {
        Self::Instance(Rc::new(RefCell::new(Instance {
            class_name: class_name.into(),
            attrs: attrs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        })))
    }

    /// Creates a named native function.
    pub fn function(name: impl Into<Rc<str>>, func: impl Fn(ArgValues) -> RunResult<Self> + 'static) -> Self {
        Self::Function(NativeFunction {
            name: name.into(),
            func: Rc::new(func),
        })
    }

    /// Returns the value's type name as used in error messages and reprs.
    #[must_use]
    pub fn py_type(&self) -> Cow<'static, str> {
        match self {
            Self::None => Cow::Borrowed("NoneType"),
            Self::Bool(_) => Cow::Borrowed("bool"),
            Self::Int(_) => Cow::Borrowed("int"),
            Self::Float(_) => Cow::Borrowed("float"),
            Self::Str(_) => Cow::Borrowed("str"),
            Self::List(_) => Cow::Borrowed("list"),
            Self::Dict(_) => Cow::Borrowed("dict"),
            Self::Instance(inst) => Cow::Owned(inst.borrow().class_name.to_string()),
            Self::Function(_) => Cow::Borrowed("function"),
        }
    }

    /// Integer view for operations where bool participates as 0/1.
    /// Floats are deliberately excluded so integer paths stay exact.
    fn as_int(&self) -> Option<i64> {
        match self {
            Self::Bool(b) => Some(i64::from(*b)),
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view covering bool, int, and float.
    fn as_float(&self) -> Option<f64> {
        match self {
            Self::Bool(b) => Some(f64::from(u8::from(*b))),
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Truthiness: `None` is false, numbers are false iff zero, strings and
    /// containers are false iff empty, instances and functions are true.
    #[must_use]
    pub fn py_bool(&self) -> bool {
        match self {
            Self::None => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::Str(s) => !s.is_empty(),
            Self::List(list) => !list.borrow().is_empty(),
            Self::Dict(dict) => !dict.borrow().is_empty(),
            Self::Instance(_) | Self::Function(_) => true,
        }
    }

    /// Length of the value, if it has one. Strings count characters, not bytes.
    #[must_use]
    pub fn py_len(&self) -> Option<usize> {
        match self {
            Self::Str(s) => Some(s.chars().count()),
            Self::List(list) => Some(list.borrow().len()),
            Self::Dict(dict) => Some(dict.borrow().len()),
            _ => None,
        }
    }

    /// Equality with numeric cross-type semantics (`1 == 1.0 == True`).
    ///
    /// Lists compare element-wise, dicts as unordered key-value maps,
    /// instances and functions by identity.
    #[must_use]
    pub fn py_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.py_eq(y))
            }
            (Self::Dict(a), Self::Dict(b)) => Rc::ptr_eq(a, b) || a.borrow().py_eq(&b.borrow()),
            (Self::Instance(a), Self::Instance(b)) => Rc::ptr_eq(a, b),
            (Self::Function(a), Self::Function(b)) => Rc::ptr_eq(&a.func, &b.func),
            _ => match (self.as_float(), other.as_float()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }

    /// Ordering for homogeneous comparable pairs.
    ///
    /// `op` only shapes the error message; lists compare element-wise, so an
    /// unorderable pair nested in a list names the element types, as CPython
    /// does for `[1] < ['a']`.
    fn py_ord(&self, op: CmpOp, other: &Self) -> RunResult<Ordering> {
        match (self, other) {
            (Self::Str(a), Self::Str(b)) => Ok(a.cmp(b)),
            (Self::List(a), Self::List(b)) => {
                let (a, b) = (a.borrow(), b.borrow());
                for (x, y) in a.iter().zip(b.iter()) {
                    if !x.py_eq(y) {
                        return x.py_ord(op, y);
                    }
                }
                Ok(a.len().cmp(&b.len()))
            }
            _ => match (self.as_float(), other.as_float()) {
                (Some(a), Some(b)) => a
                    .partial_cmp(&b)
                    .ok_or_else(|| ExcType::type_error_cmp(op.symbol(), self.py_type(), other.py_type())),
                _ => Err(ExcType::type_error_cmp(op.symbol(), self.py_type(), other.py_type())),
            },
        }
    }

    /// Rich comparison returning a plain bool.
    ///
    /// Equality never fails; ordering an unorderable pair raises CPython's
    /// `'{op}' not supported between instances of '{a}' and '{b}'`.
    pub fn py_compare(&self, op: CmpOp, other: &Self) -> RunResult<bool> {
        match op {
            CmpOp::Eq => Ok(self.py_eq(other)),
            CmpOp::Ne => Ok(!self.py_eq(other)),
            _ => {
                // exact path for int/bool pairs, float path otherwise
                if let (Some(a), Some(b)) = (self.as_int(), other.as_int()) {
                    return Ok(op.evaluate(a.cmp(&b)));
                }
                if let (Some(a), Some(b)) = (self.as_float(), other.as_float()) {
                    return Ok(op.evaluate_f64(a, b));
                }
                Ok(op.evaluate(self.py_ord(op, other)?))
            }
        }
    }

    /// CPython-compatible hash. Lists and dicts are unhashable; instances and
    /// functions hash by identity.
    pub fn py_hash(&self) -> RunResult<u64> {
        match self {
            Self::None => Ok(NONE_HASH),
            Self::Bool(b) => Ok(int_hash(i64::from(*b))),
            Self::Int(i) => Ok(int_hash(*i)),
            Self::Float(f) => Ok(float_hash(*f)),
            Self::Str(s) => Ok(str_hash(s)),
            Self::List(_) | Self::Dict(_) => Err(ExcType::type_error_unhashable(self.py_type())),
            Self::Instance(inst) => Ok(pointer_hash(Rc::as_ptr(inst) as usize)),
            Self::Function(f) => Ok(pointer_hash(Rc::as_ptr(&f.func).cast::<()>() as usize)),
        }
    }

    /// Reads a named attribute; only instances have attributes.
    pub fn py_getattr(&self, name: &str) -> RunResult<Self> {
        if let Self::Instance(inst) = self {
            if let Some(value) = inst.borrow().attrs.get(name) {
                return Ok(value.clone());
            }
        }
        Err(ExcType::attribute_error(self.py_type(), name))
    }

    /// Writes a named attribute in place on the shared instance.
    pub fn py_setattr(&self, name: &str, value: Self) -> RunResult<()> {
        if let Self::Instance(inst) = self {
            inst.borrow_mut().attrs.insert(name.to_owned(), value);
            Ok(())
        } else {
            Err(ExcType::attribute_error(self.py_type(), name))
        }
    }

    /// Deletes a named attribute; deleting a missing attribute raises
    /// `AttributeError`, and the instance stays alive (deletion never
    /// un-resolves anything upstream).
    pub fn py_delattr(&self, name: &str) -> RunResult<()> {
        if let Self::Instance(inst) = self {
            if inst.borrow_mut().attrs.shift_remove(name).is_some() {
                return Ok(());
            }
        }
        Err(ExcType::attribute_error(self.py_type(), name))
    }

    /// Subscript read: list/string indexing with negative wrap-around, dict lookup.
    pub fn py_getitem(&self, key: &Self) -> RunResult<Self> {
        match self {
            Self::List(list) => {
                let list = list.borrow();
                let index = key.as_int().ok_or_else(|| {
                    RunError::new(
                        ExcType::TypeError,
                        format!("list indices must be integers or slices, not {}", key.py_type()),
                    )
                })?;
                let index = normalize_index(index, list.len()).ok_or_else(ExcType::index_error)?;
                Ok(list[index].clone())
            }
            Self::Str(s) => {
                let index = key.as_int().ok_or_else(|| {
                    RunError::new(
                        ExcType::TypeError,
                        format!("string indices must be integers, not '{}'", key.py_type()),
                    )
                })?;
                let count = s.chars().count();
                let index = normalize_index(index, count)
                    .ok_or_else(|| RunError::new(ExcType::IndexError, "string index out of range"))?;
                let ch = s.chars().nth(index).unwrap_or_default();
                Ok(Self::from(ch.to_string()))
            }
            Self::Dict(dict) => match dict.borrow().get(key)? {
                Some(value) => Ok(value),
                None => Err(ExcType::key_error(key.py_repr())),
            },
            _ => Err(ExcType::type_error_not_sub(self.py_type())),
        }
    }

    /// Subscript write, applied in place on the shared container.
    pub fn py_setitem(&self, key: &Self, value: Self) -> RunResult<()> {
        match self {
            Self::List(list) => {
                let mut list = list.borrow_mut();
                let index = key.as_int().ok_or_else(|| {
                    RunError::new(
                        ExcType::TypeError,
                        format!("list indices must be integers or slices, not {}", key.py_type()),
                    )
                })?;
                let index = normalize_index(index, list.len())
                    .ok_or_else(|| RunError::new(ExcType::IndexError, "list assignment index out of range"))?;
                list[index] = value;
                Ok(())
            }
            Self::Dict(dict) => dict.borrow_mut().set(key.clone(), value),
            _ => Err(ExcType::type_error_not_sub_assignment(self.py_type())),
        }
    }

    /// Subscript deletion, applied in place on the shared container.
    pub fn py_delitem(&self, key: &Self) -> RunResult<()> {
        match self {
            Self::List(list) => {
                let mut list = list.borrow_mut();
                let index = key.as_int().ok_or_else(|| {
                    RunError::new(
                        ExcType::TypeError,
                        format!("list indices must be integers or slices, not {}", key.py_type()),
                    )
                })?;
                let index = normalize_index(index, list.len())
                    .ok_or_else(|| RunError::new(ExcType::IndexError, "list assignment index out of range"))?;
                list.remove(index);
                Ok(())
            }
            Self::Dict(dict) => match dict.borrow_mut().remove(key)? {
                Some(_) => Ok(()),
                None => Err(ExcType::key_error(key.py_repr())),
            },
            _ => Err(ExcType::type_error_not_sub_deletion(self.py_type())),
        }
    }

    /// Membership test: substring for strings, element for lists, key for dicts.
    pub fn py_contains(&self, item: &Self) -> RunResult<bool> {
        match self {
            Self::Str(s) => match item {
                Self::Str(sub) => Ok(s.contains(&**sub)),
                _ => Err(RunError::new(
                    ExcType::TypeError,
                    format!("'in <string>' requires string as left operand, not {}", item.py_type()),
                )),
            },
            Self::List(list) => Ok(list.borrow().iter().any(|v| v.py_eq(item))),
            Self::Dict(dict) => dict.borrow().contains(item),
            _ => Err(RunError::new(
                ExcType::TypeError,
                format!("argument of type '{}' is not iterable", self.py_type()),
            )),
        }
    }

    /// Returns an iterator over the value, or the target type's own
    /// "not iterable" error.
    pub fn py_iter(&self) -> RunResult<ValueIter> {
        match self {
            Self::Str(s) => Ok(ValueIter::over_str(s.clone())),
            Self::List(list) => Ok(ValueIter::over_list(list.clone())),
            Self::Dict(dict) => Ok(ValueIter::over_dict(dict.clone())),
            _ => Err(ExcType::type_error_not_iterable(self.py_type())),
        }
    }

    /// Calls the value with the given arguments; non-callables raise `TypeError`.
    pub fn py_call(&self, args: ArgValues) -> RunResult<Self> {
        match self {
            Self::Function(f) => (f.func)(args),
            _ => Err(ExcType::type_error_not_callable(self.py_type())),
        }
    }

    /// Addition: numeric promotion, string and list concatenation.
    pub fn py_add(&self, other: &Self) -> RunResult<Self> {
        if let (Some(a), Some(b)) = (self.as_int(), other.as_int()) {
            return a.checked_add(b).map(Self::Int).ok_or_else(ExcType::int_overflow);
        }
        if let (Some(a), Some(b)) = (self.as_float(), other.as_float()) {
            return Ok(Self::Float(a + b));
        }
        match (self, other) {
            (Self::Str(a), Self::Str(b)) => {
                let mut out = String::with_capacity(a.len() + b.len());
                out.push_str(a);
                out.push_str(b);
                Ok(Self::from(out))
            }
            (Self::List(a), Self::List(b)) => {
                let mut items = a.borrow().clone();
                items.extend(b.borrow().iter().cloned());
                Ok(Self::list(items))
            }
            _ => Err(ExcType::type_error_operand("+", self.py_type(), other.py_type())),
        }
    }

    /// Subtraction: numeric only.
    pub fn py_sub(&self, other: &Self) -> RunResult<Self> {
        if let (Some(a), Some(b)) = (self.as_int(), other.as_int()) {
            return a.checked_sub(b).map(Self::Int).ok_or_else(ExcType::int_overflow);
        }
        if let (Some(a), Some(b)) = (self.as_float(), other.as_float()) {
            return Ok(Self::Float(a - b));
        }
        Err(ExcType::type_error_operand("-", self.py_type(), other.py_type()))
    }

    /// Multiplication: numeric, plus string/list repetition by an integer.
    /// A non-positive count yields an empty result, as in CPython.
    pub fn py_mult(&self, other: &Self) -> RunResult<Self> {
        if let (Some(a), Some(b)) = (self.as_int(), other.as_int()) {
            return a.checked_mul(b).map(Self::Int).ok_or_else(ExcType::int_overflow);
        }
        if let (Some(a), Some(b)) = (self.as_float(), other.as_float()) {
            return Ok(Self::Float(a * b));
        }
        // A sequence on the left repeats by the right operand; otherwise the
        // left operand is the multiplier. Matching left-first keeps CPython's
        // error for pairs like `[1] * 'a'`, which blames the right operand.
        match (self, other) {
            (Self::Str(s), n) => repeat_str(s, n),
            (Self::List(list), n) => repeat_list(list, n),
            (n, Self::Str(s)) => repeat_str(s, n),
            (n, Self::List(list)) => repeat_list(list, n),
            _ => Err(ExcType::type_error_operand("*", self.py_type(), other.py_type())),
        }
    }

    /// True division: always produces a float; division by zero raises
    /// `ZeroDivisionError` exactly as the plain numeric types do.
    pub fn py_div(&self, other: &Self) -> RunResult<Self> {
        let (Some(a), Some(b)) = (self.as_float(), other.as_float()) else {
            return Err(ExcType::type_error_operand("/", self.py_type(), other.py_type()));
        };
        if b == 0.0 {
            if self.as_int().is_some() && other.as_int().is_some() {
                return Err(ExcType::zero_division());
            }
            return Err(RunError::new(ExcType::ZeroDivisionError, "float division by zero"));
        }
        Ok(Self::Float(a / b))
    }

    /// Floor division with Python's floor-toward-negative-infinity semantics.
    pub fn py_floordiv(&self, other: &Self) -> RunResult<Self> {
        if let (Some(a), Some(b)) = (self.as_int(), other.as_int()) {
            if b == 0 {
                return Err(ExcType::zero_division_floor_int());
            }
            // i64::MIN / -1 is the one overflowing case
            let quotient = a.checked_div(b).ok_or_else(ExcType::int_overflow)?;
            let remainder = a % b;
            let floored = if remainder != 0 && (remainder < 0) != (b < 0) {
                quotient - 1
            } else {
                quotient
            };
            return Ok(Self::Int(floored));
        }
        if let (Some(a), Some(b)) = (self.as_float(), other.as_float()) {
            if b == 0.0 {
                return Err(ExcType::zero_division_floor_float());
            }
            return Ok(Self::Float((a / b).floor()));
        }
        Err(ExcType::type_error_operand("//", self.py_type(), other.py_type()))
    }

    /// Left shift on integers; negative shift counts raise `ValueError` and
    /// results that do not fit in the i64 model raise `OverflowError`.
    pub fn py_lshift(&self, other: &Self) -> RunResult<Self> {
        let (Some(a), Some(b)) = (self.as_int(), other.as_int()) else {
            return Err(ExcType::type_error_operand("<<", self.py_type(), other.py_type()));
        };
        if b < 0 {
            return Err(RunError::new(ExcType::ValueError, "negative shift count"));
        }
        if a == 0 {
            return Ok(Self::Int(0));
        }
        if b >= 64 {
            return Err(ExcType::int_overflow());
        }
        let result = a << b;
        if (result >> b) != a {
            return Err(ExcType::int_overflow());
        }
        Ok(Self::Int(result))
    }

    /// Arithmetic right shift on integers, matching Python's floor semantics
    /// for negative values (`-1 >> n == -1` for any `n`).
    pub fn py_rshift(&self, other: &Self) -> RunResult<Self> {
        let (Some(a), Some(b)) = (self.as_int(), other.as_int()) else {
            return Err(ExcType::type_error_operand(">>", self.py_type(), other.py_type()));
        };
        if b < 0 {
            return Err(RunError::new(ExcType::ValueError, "negative shift count"));
        }
        if b >= 64 {
            return Ok(Self::Int(if a < 0 { -1 } else { 0 }));
        }
        Ok(Self::Int(a >> b))
    }

    /// String conversion: unquoted for strings, repr for everything else.
    #[must_use]
    pub fn py_str(&self) -> String {
        match self {
            Self::Str(s) => s.to_string(),
            _ => self.py_repr(),
        }
    }

    /// Repr string with Python formatting rules.
    #[must_use]
    pub fn py_repr(&self) -> String {
        let mut out = String::new();
        let mut seen = AHashSet::new();
        // writing to a String cannot fail
        let _ = self.repr_fmt(&mut out, &mut seen);
        out
    }

    /// Writes the repr, tracking visited containers so self-referential
    /// structures print `[...]`/`{...}` instead of recursing forever.
    pub(crate) fn repr_fmt(&self, f: &mut impl Write, seen: &mut AHashSet<usize>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => f.write_str(&float_repr(*v)),
            Self::Str(s) => str_repr_fmt(s, f),
            Self::List(list) => {
                let ptr = Rc::as_ptr(list) as usize;
                if !seen.insert(ptr) {
                    return f.write_str("[...]");
                }
                f.write_char('[')?;
                for (i, item) in list.borrow().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    item.repr_fmt(f, seen)?;
                }
                f.write_char(']')?;
                seen.remove(&ptr);
                Ok(())
            }
            Self::Dict(dict) => {
                let ptr = Rc::as_ptr(dict) as usize;
                if !seen.insert(ptr) {
                    return f.write_str("{...}");
                }
                dict.borrow().repr_fmt(f, seen)?;
                seen.remove(&ptr);
                Ok(())
            }
            Self::Instance(inst) => write!(f, "<{} object>", inst.borrow().class_name),
            Self::Function(func) => write!(f, "<function {}>", func.name),
        }
    }
}

/// Cap on the byte/element size of a repetition result. Requests beyond it
/// raise `OverflowError` instead of attempting the allocation.
const MAX_REPEAT_SIZE: usize = 1 << 32;

/// Extracts the repetition count for `sequence * n`. Non-integer multipliers
/// raise CPython's `can't multiply sequence by non-int of type '{t}'`;
/// negative counts clamp to zero.
fn sequence_repeat_count(n: &Value) -> RunResult<usize> {
    match n.as_int() {
        Some(count) => Ok(usize::try_from(count).unwrap_or(0)),
        None => Err(ExcType::type_error_sequence_repeat(n.py_type())),
    }
}

fn repeat_str(s: &str, n: &Value) -> RunResult<Value> {
    let count = sequence_repeat_count(n)?;
    if s.len().checked_mul(count).is_none_or(|total| total > MAX_REPEAT_SIZE) {
        return Err(ExcType::overflow_repeat());
    }
    Ok(Value::from(s.repeat(count)))
}

fn repeat_list(list: &Rc<RefCell<Vec<Value>>>, n: &Value) -> RunResult<Value> {
    let count = sequence_repeat_count(n)?;
    let source = list.borrow();
    let total = source
        .len()
        .checked_mul(count)
        .filter(|&total| total <= MAX_REPEAT_SIZE)
        .ok_or_else(ExcType::overflow_repeat)?;
    let mut items = Vec::with_capacity(total);
    for _ in 0..count {
        items.extend(source.iter().cloned());
    }
    Ok(Value::list(items))
}

/// Maps a possibly-negative index onto `0..len`, Python style.
fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let adjusted = if index < 0 { index + len } else { index };
    if (0..len).contains(&adjusted) {
        Some(adjusted as usize)
    } else {
        None
    }
}

/// Formats a float the way Python's repr does: `2.0` keeps its `.0` suffix,
/// exponents are spelled `1e+16`, and the specials are `inf`/`-inf`/`nan`.
pub(crate) fn float_repr(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_owned();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_owned();
    }
    let mut buffer = ryu::Buffer::new();
    let formatted = buffer.format_finite(value);
    match formatted.find('e') {
        // ryu prints positive exponents bare ("1e16"); Python writes "1e+16"
        Some(pos) if !formatted[pos + 1..].starts_with('-') => {
            format!("{}e+{}", &formatted[..pos], &formatted[pos + 1..])
        }
        _ => formatted.to_owned(),
    }
}

/// Python string repr: single quotes, switching to double quotes when the
/// content contains a single quote but no double quote.
fn str_repr_fmt(s: &str, f: &mut impl Write) -> fmt::Result {
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    f.write_char(quote)?;
    for ch in s.chars() {
        match ch {
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if c == quote => {
                f.write_char('\\')?;
                f.write_char(c)?;
            }
            c => f.write_char(c)?,
        }
    }
    f.write_char(quote)
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.py_eq(other)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut seen = AHashSet::new();
        self.repr_fmt(f, &mut seen)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            _ => {
                let mut seen = AHashSet::new();
                self.repr_fmt(f, &mut seen)
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(Rc::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(Rc::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cross_type_numeric_equality() {
        assert!(Value::from(1).py_eq(&Value::from(1.0)));
        assert!(Value::from(true).py_eq(&Value::from(1)));
        assert!(Value::from(0).py_eq(&Value::from(false)));
        assert!(!Value::from(1).py_eq(&Value::from("1")));
    }

    #[test]
    fn list_equality_is_element_wise() {
        let a = Value::list(vec![Value::from(1), Value::from(2.0)]);
        let b = Value::list(vec![Value::from(1.0), Value::from(2)]);
        assert!(a.py_eq(&b));
    }

    #[test]
    fn ordering_mixed_types_raises() {
        let err = Value::from(1).py_compare(CmpOp::Lt, &Value::from("a")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "TypeError: '<' not supported between instances of 'int' and 'str'"
        );
    }

    #[test]
    fn ordering_lists_names_the_unorderable_element_types() {
        let ints = Value::list(vec![Value::from(1)]);
        let strs = Value::list(vec![Value::from("a")]);
        let err = ints.py_compare(CmpOp::Lt, &strs).unwrap_err();
        assert_eq!(
            err.to_string(),
            "TypeError: '<' not supported between instances of 'int' and 'str'"
        );
        // equal prefixes never touch the unorderable tail
        let a = Value::list(vec![Value::from(1), Value::from(2)]);
        let b = Value::list(vec![Value::from(1), Value::from("a")]);
        let err = a.py_compare(CmpOp::Gt, &b).unwrap_err();
        assert_eq!(
            err.to_string(),
            "TypeError: '>' not supported between instances of 'int' and 'str'"
        );
    }

    #[test]
    fn nan_comparisons_are_false_not_errors() {
        let nan = Value::from(f64::NAN);
        assert!(!nan.py_compare(CmpOp::Lt, &Value::from(1)).unwrap());
        assert!(!nan.py_compare(CmpOp::Ge, &Value::from(1)).unwrap());
        assert!(!nan.py_compare(CmpOp::Eq, &nan).unwrap());
        assert!(nan.py_compare(CmpOp::Ne, &nan).unwrap());
    }

    #[test]
    fn floor_division_floors_toward_negative_infinity() {
        assert_eq!(Value::from(-7).py_floordiv(&Value::from(2)).unwrap(), Value::from(-4));
        assert_eq!(Value::from(-7).py_floordiv(&Value::from(-2)).unwrap(), Value::from(3));
        assert_eq!(Value::from(7).py_floordiv(&Value::from(2)).unwrap(), Value::from(3));
        assert_eq!(Value::from(-7.0).py_floordiv(&Value::from(2)).unwrap(), Value::from(-4.0));
    }

    #[test]
    fn true_division_always_floats() {
        assert_eq!(Value::from(4).py_div(&Value::from(2)).unwrap(), Value::from(2.0));
        let err = Value::from(4).py_div(&Value::from(0)).unwrap_err();
        assert_eq!(err.to_string(), "ZeroDivisionError: division by zero");
        let err = Value::from(4.0).py_div(&Value::from(0)).unwrap_err();
        assert_eq!(err.to_string(), "ZeroDivisionError: float division by zero");
    }

    #[test]
    fn shifts_match_python() {
        assert_eq!(Value::from(1).py_lshift(&Value::from(4)).unwrap(), Value::from(16));
        assert_eq!(Value::from(-1).py_rshift(&Value::from(100)).unwrap(), Value::from(-1));
        assert_eq!(Value::from(1).py_rshift(&Value::from(100)).unwrap(), Value::from(0));
        let err = Value::from(1).py_lshift(&Value::from(-1)).unwrap_err();
        assert_eq!(err.to_string(), "ValueError: negative shift count");
        let err = Value::from(1).py_lshift(&Value::from(64)).unwrap_err();
        assert_eq!(err.exc_type(), ExcType::OverflowError);
    }

    #[test]
    fn int_overflow_is_reported() {
        let err = Value::from(i64::MAX).py_add(&Value::from(1)).unwrap_err();
        assert_eq!(err.exc_type(), ExcType::OverflowError);
        let err = Value::from(i64::MIN).py_floordiv(&Value::from(-1)).unwrap_err();
        assert_eq!(err.exc_type(), ExcType::OverflowError);
    }

    #[test]
    fn concatenation_and_repetition() {
        assert_eq!(Value::from("ab").py_add(&Value::from("cd")).unwrap(), Value::from("abcd"));
        assert_eq!(Value::from("ab").py_mult(&Value::from(3)).unwrap(), Value::from("ababab"));
        assert_eq!(Value::from("ab").py_mult(&Value::from(-1)).unwrap(), Value::from(""));
        let repeated = Value::list(vec![Value::from(1)]).py_mult(&Value::from(2)).unwrap();
        assert_eq!(repeated, Value::list(vec![Value::from(1), Value::from(1)]));
        let err = Value::from("ab").py_add(&Value::from(1)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "TypeError: unsupported operand type(s) for +: 'str' and 'int'"
        );
    }

    #[test]
    fn oversized_repetition_raises_instead_of_allocating() {
        let err = Value::from("ab").py_mult(&Value::from(i64::MAX / 2)).unwrap_err();
        assert_eq!(err.exc_type(), ExcType::OverflowError);
        let err = Value::list(vec![Value::from(1)])
            .py_mult(&Value::from(i64::MAX))
            .unwrap_err();
        assert_eq!(err.exc_type(), ExcType::OverflowError);
        // empty sequences repeat to empty at any count
        assert_eq!(Value::from("").py_mult(&Value::from(i64::MAX)).unwrap(), Value::from(""));
    }

    #[test]
    fn repeating_by_a_non_int_names_the_multiplier_type() {
        let err = Value::from("ab").py_mult(&Value::from(1.5)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "TypeError: can't multiply sequence by non-int of type 'float'"
        );
        let err = Value::from("ab").py_mult(&Value::from("cd")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "TypeError: can't multiply sequence by non-int of type 'str'"
        );
        // when both operands are sequences, the right one is the multiplier
        let err = Value::list(vec![Value::from(1)]).py_mult(&Value::from("a")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "TypeError: can't multiply sequence by non-int of type 'str'"
        );
        let err = Value::from("ab").py_mult(&Value::list(vec![Value::from(1)])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "TypeError: can't multiply sequence by non-int of type 'list'"
        );
    }

    #[test]
    fn repr_formats() {
        assert_eq!(Value::None.py_repr(), "None");
        assert_eq!(Value::from(true).py_repr(), "True");
        assert_eq!(Value::from(2.0).py_repr(), "2.0");
        assert_eq!(Value::from(f64::NAN).py_repr(), "nan");
        assert_eq!(Value::from("it's").py_repr(), "\"it's\"");
        assert_eq!(Value::from("a\nb").py_repr(), "'a\\nb'");
        let list = Value::list(vec![Value::from(1), Value::from("a")]);
        assert_eq!(list.py_repr(), "[1, 'a']");
        let dict = Value::dict(vec![(Value::from("k"), Value::None)]).unwrap();
        assert_eq!(dict.py_repr(), "{'k': None}");
    }

    #[test]
    fn self_referential_list_repr_terminates() {
        let list = Value::list(vec![Value::from(1)]);
        let Value::List(inner) = &list else { panic!("expected list") };
        inner.borrow_mut().push(list.clone());
        assert_eq!(list.py_repr(), "[1, [...]]");
    }

    #[test]
    fn str_and_display_differ_from_repr_for_strings() {
        let value = Value::from("plain");
        assert_eq!(value.py_str(), "plain");
        assert_eq!(value.to_string(), "plain");
        assert_eq!(value.py_repr(), "'plain'");
        assert_eq!(format!("{value:?}"), "'plain'");
    }

    #[test]
    fn negative_indexing() {
        let list = Value::list(vec![Value::from(1), Value::from(2), Value::from(3)]);
        assert_eq!(list.py_getitem(&Value::from(-1)).unwrap(), Value::from(3));
        let err = list.py_getitem(&Value::from(-4)).unwrap_err();
        assert_eq!(err.to_string(), "IndexError: list index out of range");
    }

    #[test]
    fn instances_compare_and_hash_by_identity() {
        let a = Value::instance("Foo", [("bar", Value::from(42))]);
        let b = Value::instance("Foo", [("bar", Value::from(42))]);
        assert!(!a.py_eq(&b));
        assert!(a.py_eq(&a.clone()));
        assert_ne!(a.py_hash().unwrap(), b.py_hash().unwrap());
        assert_eq!(a.py_hash().unwrap(), a.clone().py_hash().unwrap());
    }

    #[test]
    fn len_counts_characters() {
        assert_eq!(Value::from("héllo").py_len(), Some(5));
        assert_eq!(Value::from(1).py_len(), None);
    }
}
