//! Iteration support for the forwarding surface.
//!
//! [`ValueIter`] encapsulates iteration state for the iterable value types.
//! It uses index-based iteration internally rather than holding Rust
//! iterators, which avoids borrow conflicts with the `RefCell`-backed
//! containers: each `next()` re-borrows the container for a single lookup.
//!
//! For strings the index is a byte offset, giving O(1) UTF-8 advancement.
//! Iterating a dict yields its keys in insertion order, as in Python.

use std::{cell::RefCell, rc::Rc};

use crate::{dict::Dict, value::Value};

/// Iterator over an iterable [`Value`].
///
/// Mutations made to the underlying container while iterating are observed,
/// since the iterator holds a handle to the live container, not a copy.
#[derive(Debug)]
pub struct ValueIter {
    /// Current position: element index for lists and dicts, byte offset for strings.
    index: usize,
    target: IterTarget,
}

#[derive(Debug)]
enum IterTarget {
    Str(Rc<str>),
    List(Rc<RefCell<Vec<Value>>>),
    Dict(Rc<RefCell<Dict>>),
}

impl ValueIter {
    pub(crate) fn over_str(s: Rc<str>) -> Self {
        Self {
            index: 0,
            target: IterTarget::Str(s),
        }
    }

    pub(crate) fn over_list(list: Rc<RefCell<Vec<Value>>>) -> Self {
        Self {
            index: 0,
            target: IterTarget::List(list),
        }
    }

    pub(crate) fn over_dict(dict: Rc<RefCell<Dict>>) -> Self {
        Self {
            index: 0,
            target: IterTarget::Dict(dict),
        }
    }
}

impl Iterator for ValueIter {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        match &self.target {
            IterTarget::Str(s) => {
                let ch = s[self.index..].chars().next()?;
                self.index += ch.len_utf8();
                Some(Value::from(ch.to_string()))
            }
            IterTarget::List(list) => {
                let item = list.borrow().get(self.index).cloned()?;
                self.index += 1;
                Some(item)
            }
            IterTarget::Dict(dict) => {
                let key = dict.borrow().key_at(self.index)?;
                self.index += 1;
                Some(key)
            }
        }
    }
}
