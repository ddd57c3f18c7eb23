//! The introspection utilities: `is_resolved`, `resolve`, and `extract` act
//! on the proxy from outside the forwarding surface, so they work no matter
//! what the target supports.

use std::{cell::Cell, rc::Rc};

use mirage::{ExcType, Proxy, RunError, Value, extract, is_resolved, resolve};

#[test]
fn extract_returns_the_raw_value() {
    let proxy = Proxy::new(|| Value::from("value"));
    let extracted = extract(&proxy).unwrap();
    assert_eq!(extracted, Value::from("value"));
    assert!(matches!(extracted, Value::Str(_)));
}

#[test]
fn extract_triggers_resolution_once() {
    let calls = Rc::new(Cell::new(0_u32));
    let counter = calls.clone();
    let proxy = Proxy::new(move || {
        counter.set(counter.get() + 1);
        Value::from("value")
    });
    assert!(!is_resolved(&proxy));
    extract(&proxy).unwrap();
    extract(&proxy).unwrap();
    assert!(is_resolved(&proxy));
    assert_eq!(calls.get(), 1);
}

#[test]
fn extract_shares_storage_with_the_proxy_target() {
    let proxy = Proxy::new(|| Value::list(vec![Value::from(1)]));
    let raw = extract(&proxy).unwrap();
    proxy.setitem(&Value::from(0), Value::from(2)).unwrap();
    assert_eq!(raw.py_getitem(&Value::from(0)).unwrap(), Value::from(2));
}

#[test]
fn is_resolved_flips_after_first_forwarded_operation() {
    let proxy = Proxy::new(|| Value::from("value"));
    assert!(!is_resolved(&proxy));
    assert!(proxy.eq(&Value::from("value")).unwrap());
    assert!(is_resolved(&proxy));
}

#[test]
fn resolve_forces_resolution() {
    let proxy = Proxy::new(|| Value::from("value"));
    assert!(!is_resolved(&proxy));
    resolve(&proxy).unwrap();
    assert!(is_resolved(&proxy));
}

#[test]
fn resolve_is_idempotent_and_chains() {
    let calls = Rc::new(Cell::new(0_u32));
    let counter = calls.clone();
    let proxy = Proxy::new(move || {
        counter.set(counter.get() + 1);
        Value::from(1)
    });
    let chained = resolve(resolve(&proxy).unwrap()).unwrap();
    assert!(is_resolved(chained));
    assert_eq!(calls.get(), 1);
}

#[test]
fn utilities_surface_factory_errors() {
    let proxy = Proxy::fallible(|| Err(RunError::new(ExcType::ValueError, "boom")));
    let err = resolve(&proxy).unwrap_err();
    assert_eq!(err.to_string(), "ValueError: boom");
    let err = extract(&proxy).unwrap_err();
    assert_eq!(err.to_string(), "ValueError: boom");
    // is_resolved never triggers resolution, even after failures
    assert!(!is_resolved(&proxy));
}
