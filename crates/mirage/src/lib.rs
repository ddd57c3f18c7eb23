#![doc = include_str!("../../../README.md")]

mod args;
mod dict;
mod exception;
mod hash;
mod iter;
mod proxy;
mod value;

pub use crate::{
    args::ArgValues,
    dict::Dict,
    exception::{ExcType, RunError, RunResult},
    iter::ValueIter,
    proxy::Proxy,
    value::{CmpOp, Instance, NativeFunction, Value},
};

/// Reports whether the proxy's factory has run, without triggering resolution.
///
/// This is a pure observer: it never invokes the factory and never fails.
#[must_use]
pub fn is_resolved(proxy: &Proxy) -> bool {
    proxy.resolved()
}

/// Forces resolution of the proxy, returning it for chaining.
///
/// Idempotent: resolving an already-resolved proxy is a no-op. Fails only
/// with whatever error the factory raises.
pub fn resolve(proxy: &Proxy) -> RunResult<&Proxy> {
    proxy.target()?;
    Ok(proxy)
}

/// Forces resolution if needed and returns the raw underlying value.
///
/// This is the escape hatch from the wrapper: the returned handle is the
/// target itself (sharing storage with what the proxy keeps forwarding to),
/// not a `Proxy`, so exact-type checks and direct operations apply to it.
pub fn extract(proxy: &Proxy) -> RunResult<Value> {
    proxy.target()
}
