use indexmap::IndexMap;

use crate::{
    exception::{ExcType, RunResult},
    value::Value,
};

/// Type for call arguments forwarded through the proxy to a callable target.
///
/// Uses specific variants for common cases (0-2 positional arguments) so the
/// vast majority of calls avoid a Vec allocation; the general variant carries
/// positional and keyword arguments together.
#[derive(Debug, Clone, Default)]
pub enum ArgValues {
    #[default]
    Empty,
    One(Value),
    Two(Value, Value),
    ArgsKwargs {
        args: Vec<Value>,
        kwargs: IndexMap<String, Value>,
    },
}

impl ArgValues {
    /// Creates arguments from a positional list, collapsing to the small variants.
    #[must_use]
    pub fn positional(mut args: Vec<Value>) -> Self {
        match args.len() {
            0 => Self::Empty,
            1 => Self::One(args.remove(0)),
            2 => {
                let second = args.remove(1);
                Self::Two(args.remove(0), second)
            }
            _ => Self::ArgsKwargs {
                args,
                kwargs: IndexMap::new(),
            },
        }
    }

    /// Creates arguments from positional and keyword parts.
    #[must_use]
    pub fn with_kwargs(args: Vec<Value>, kwargs: IndexMap<String, Value>) -> Self {
        if kwargs.is_empty() {
            Self::positional(args)
        } else {
            Self::ArgsKwargs { args, kwargs }
        }
    }

    /// Returns the number of positional arguments.
    #[must_use]
    pub fn count(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::One(_) => 1,
            Self::Two(..) => 2,
            Self::ArgsKwargs { args, .. } => args.len(),
        }
    }

    /// Checks that zero positional arguments were passed.
    pub fn check_zero_args(self, name: &str) -> RunResult<()> {
        match self {
            Self::Empty => Ok(()),
            Self::ArgsKwargs { ref args, ref kwargs } if args.is_empty() && kwargs.is_empty() => Ok(()),
            other => Err(ExcType::type_error_no_args(name, other.count())),
        }
    }

    /// Checks that exactly one positional argument was passed, returning it.
    pub fn get_one_arg(self, name: &str) -> RunResult<Value> {
        match self {
            Self::One(a) => Ok(a),
            other => Err(ExcType::type_error_arg_count(name, 1, other.count())),
        }
    }

    /// Checks that exactly two positional arguments were passed, returning them.
    pub fn get_two_args(self, name: &str) -> RunResult<(Value, Value)> {
        match self {
            Self::Two(a, b) => Ok((a, b)),
            other => Err(ExcType::type_error_arg_count(name, 2, other.count())),
        }
    }

    /// Splits into a positional vector and a keyword map.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Value>, IndexMap<String, Value>) {
        match self {
            Self::Empty => (Vec::new(), IndexMap::new()),
            Self::One(a) => (vec![a], IndexMap::new()),
            Self::Two(a, b) => (vec![a, b], IndexMap::new()),
            Self::ArgsKwargs { args, kwargs } => (args, kwargs),
        }
    }
}

impl From<Vec<Value>> for ArgValues {
    fn from(args: Vec<Value>) -> Self {
        Self::positional(args)
    }
}
