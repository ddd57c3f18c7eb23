use std::{cell::OnceCell, fmt, rc::Rc};

use crate::{
    args::ArgValues,
    exception::{ExcType, RunResult},
    iter::ValueIter,
    value::{CmpOp, Value},
};

/// A lazy, transparent wrapper around a [`Value`].
///
/// A `Proxy` holds a factory and defers calling it until the first operation
/// that needs the real value. Every method of the forwarding surface resolves
/// the target (once), re-issues the operation against it, and returns the
/// target's own result - plain values and plain errors, never another proxy.
/// Code using the forwarding surface cannot tell a resolved proxy apart from
/// the value it wraps.
///
/// The resolved value lives in a single-assignment cell for the proxy's whole
/// lifetime: mutating or clearing the target through the surface never
/// un-resolves it, and repeated reads never re-run the factory.
///
/// # Factory failure
///
/// An error raised by the factory propagates unchanged to whichever operation
/// triggered resolution, and the proxy stays unresolved: the next operation
/// retries the factory. (The alternative - latching the failure - would make
/// transient factory errors permanent.)
///
/// # Introspection
///
/// [`is_resolved`](crate::is_resolved), [`resolve`](crate::resolve), and
/// [`extract`](crate::extract) inspect or force the laziness state from
/// outside the forwarding surface.
///
/// Single-threaded by design: `Proxy` is neither `Send` nor `Sync`.
///
/// # Example
///
/// ```
/// use mirage::{Proxy, Value, is_resolved};
///
/// let proxy = Proxy::new(|| Value::from(4));
/// assert!(!is_resolved(&proxy));
/// assert_eq!(proxy.true_div(&Value::from(2)).unwrap(), Value::from(2.0));
/// assert!(is_resolved(&proxy));
/// ```
pub struct Proxy {
    factory: Box<dyn Fn() -> RunResult<Value>>,
    /// Label reported by the debug representation; never affects forwarding.
    factory_name: Option<Rc<str>>,
    target: OnceCell<Value>,
}

impl Proxy {
    /// Creates a proxy over an infallible factory.
    ///
    /// Construction is cheap and has no side effects; the factory runs the
    /// first time any forwarded operation needs the value.
    pub fn new(factory: impl Fn() -> Value + 'static) -> Self {
        Self::fallible(move || Ok(factory()))
    }

    /// Creates a proxy over a factory that may fail.
    pub fn fallible(factory: impl Fn() -> RunResult<Value> + 'static) -> Self {
        Self {
            factory: Box::new(factory),
            factory_name: None,
            target: OnceCell::new(),
        }
    }

    /// Attaches a factory label to the debug representation.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<Rc<str>>) -> Self {
        self.factory_name = Some(name.into());
        self
    }

    /// Reports whether the factory has produced the target yet.
    pub(crate) fn resolved(&self) -> bool {
        self.target.get().is_some()
    }

    /// Returns a handle to the target, invoking the factory on first use.
    ///
    /// On the success path the factory runs exactly once; a factory error
    /// leaves the cell empty so a later call retries.
    pub(crate) fn target(&self) -> RunResult<Value> {
        if let Some(value) = self.target.get() {
            return Ok(value.clone());
        }
        let value = (self.factory)()?;
        Ok(self.target.get_or_init(|| value).clone())
    }

    // --- attribute access ---

    /// Reads an attribute of the target.
    pub fn getattr(&self, name: &str) -> RunResult<Value> {
        self.target()?.py_getattr(name)
    }

    /// Sets an attribute on the target in place.
    pub fn setattr(&self, name: &str, value: Value) -> RunResult<()> {
        self.target()?.py_setattr(name, value)
    }

    /// Deletes an attribute of the target in place. The proxy stays resolved
    /// and keeps forwarding to the same target afterwards.
    pub fn delattr(&self, name: &str) -> RunResult<()> {
        self.target()?.py_delattr(name)
    }

    // --- representation, truthiness, hashing ---

    /// String conversion of the target.
    pub fn str_value(&self) -> RunResult<String> {
        Ok(self.target()?.py_str())
    }

    /// Repr of the target.
    pub fn repr_value(&self) -> RunResult<String> {
        Ok(self.target()?.py_repr())
    }

    /// Truthiness of the target.
    pub fn truthy(&self) -> RunResult<bool> {
        Ok(self.target()?.py_bool())
    }

    /// Hash of the target; unhashable targets raise their own `TypeError`.
    pub fn hash_value(&self) -> RunResult<u64> {
        self.target()?.py_hash()
    }

    // --- calling ---

    /// Calls the target with positional and keyword arguments, returning the
    /// call's result unwrapped.
    pub fn call(&self, args: ArgValues) -> RunResult<Value> {
        self.target()?.py_call(args)
    }

    // --- comparison ---

    /// Rich comparison between the target and another value; the result is a
    /// plain bool, never a proxy.
    pub fn compare(&self, op: CmpOp, other: &Value) -> RunResult<bool> {
        self.target()?.py_compare(op, other)
    }

    /// Equality shorthand for [`compare`](Self::compare) with [`CmpOp::Eq`].
    pub fn eq(&self, other: &Value) -> RunResult<bool> {
        self.compare(CmpOp::Eq, other)
    }

    // --- iteration ---

    /// Iterates the target; non-iterable targets raise their own `TypeError`.
    pub fn iter(&self) -> RunResult<ValueIter> {
        self.target()?.py_iter()
    }

    // --- sequence / mapping protocol ---

    /// Length of the target.
    pub fn len(&self) -> RunResult<usize> {
        let target = self.target()?;
        target.py_len().ok_or_else(|| ExcType::type_error_no_len(target.py_type()))
    }

    /// Whether the target is empty; fails like [`len`](Self::len) for
    /// targets without a length.
    pub fn is_empty(&self) -> RunResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Membership test on the target.
    pub fn contains(&self, item: &Value) -> RunResult<bool> {
        self.target()?.py_contains(item)
    }

    /// Subscript read on the target.
    pub fn getitem(&self, key: &Value) -> RunResult<Value> {
        self.target()?.py_getitem(key)
    }

    /// Subscript write, applied to the target in place - the proxy keeps no
    /// copy of its own.
    pub fn setitem(&self, key: &Value, value: Value) -> RunResult<()> {
        self.target()?.py_setitem(key, value)
    }

    /// Subscript deletion, applied to the target in place.
    pub fn delitem(&self, key: &Value) -> RunResult<()> {
        self.target()?.py_delitem(key)
    }

    // --- arithmetic / bitwise ---

    /// `target + other`
    pub fn add(&self, other: &Value) -> RunResult<Value> {
        self.target()?.py_add(other)
    }

    /// `target - other`
    pub fn sub(&self, other: &Value) -> RunResult<Value> {
        self.target()?.py_sub(other)
    }

    /// `target * other`
    pub fn mul(&self, other: &Value) -> RunResult<Value> {
        self.target()?.py_mult(other)
    }

    /// `target / other` (true division; domain errors are the target type's own)
    pub fn true_div(&self, other: &Value) -> RunResult<Value> {
        self.target()?.py_div(other)
    }

    /// `target // other`
    pub fn floor_div(&self, other: &Value) -> RunResult<Value> {
        self.target()?.py_floordiv(other)
    }

    /// `target << other`
    pub fn lshift(&self, other: &Value) -> RunResult<Value> {
        self.target()?.py_lshift(other)
    }

    /// `target >> other`
    pub fn rshift(&self, other: &Value) -> RunResult<Value> {
        self.target()?.py_rshift(other)
    }
}

/// The debug representation never forces resolution and never fails: it
/// reports the laziness state, the factory label, and - once resolved - the
/// target's repr.
impl fmt::Debug for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.factory_name.as_deref().unwrap_or("<factory>");
        match self.target.get() {
            Some(value) => write!(f, "<Proxy wrapping {value:?} with factory {name}>"),
            None => write!(f, "<Proxy with factory {name}>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use super::*;

    #[test]
    fn construction_does_not_invoke_factory() {
        let calls = Rc::new(Cell::new(0_u32));
        let counter = calls.clone();
        let proxy = Proxy::new(move || {
            counter.set(counter.get() + 1);
            Value::from(42)
        });
        assert_eq!(calls.get(), 0);
        assert!(!proxy.resolved());
    }

    #[test]
    fn factory_runs_once_across_operations() {
        let calls = Rc::new(Cell::new(0_u32));
        let counter = calls.clone();
        let proxy = Proxy::new(move || {
            counter.set(counter.get() + 1);
            Value::from(42)
        });
        assert!(proxy.truthy().unwrap());
        assert!(proxy.eq(&Value::from(42)).unwrap());
        assert_eq!(proxy.add(&Value::from(1)).unwrap(), Value::from(43));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn factory_error_propagates_and_next_access_retries() {
        let calls = Rc::new(Cell::new(0_u32));
        let counter = calls.clone();
        let proxy = Proxy::fallible(move || {
            counter.set(counter.get() + 1);
            if counter.get() == 1 {
                Err(crate::RunError::new(ExcType::RuntimeError, "flaky"))
            } else {
                Ok(Value::from(1))
            }
        });
        let err = proxy.truthy().unwrap_err();
        assert_eq!(err.to_string(), "RuntimeError: flaky");
        assert!(!proxy.resolved());
        assert!(proxy.truthy().unwrap());
        assert!(proxy.resolved());
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn debug_does_not_resolve() {
        let proxy = Proxy::new(|| Value::from(1)).with_name("make_one");
        assert_eq!(format!("{proxy:?}"), "<Proxy with factory make_one>");
        assert!(!proxy.resolved());
        proxy.truthy().unwrap();
        assert_eq!(format!("{proxy:?}"), "<Proxy wrapping 1 with factory make_one>");
    }

    #[test]
    fn debug_default_factory_label() {
        let proxy = Proxy::new(|| Value::None);
        assert_eq!(format!("{proxy:?}"), "<Proxy with factory <factory>>");
    }
}
