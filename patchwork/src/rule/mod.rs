mod behavior;
mod matcher;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

pub use behavior::*;
pub use matcher::*;
use parking_lot::Mutex;

use crate::{Args, Result};

static NEXT_ID: AtomicUsize = AtomicUsize::new(1);

/// One configured behavior of a mock: an optional argument scope, the
/// behavior itself and its call bookkeeping.
pub(crate) struct Rule {
    pub id: usize,
    scope: Mutex<Option<CallScope>>,
    behavior: Mutex<Option<Behavior>>,
    calls: AtomicUsize,
    max_calls: Mutex<Option<usize>>,
    ordered: AtomicBool,
}

impl Rule {
    pub fn new() -> Self {
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            scope: Mutex::new(None),
            behavior: Mutex::new(None),
            calls: AtomicUsize::new(0),
            max_calls: Mutex::new(None),
            ordered: AtomicBool::new(false),
        }
    }

    pub fn scope(&self) -> Option<CallScope> {
        self.scope.lock().clone()
    }

    pub fn set_scope(&self, scope: CallScope) {
        *self.scope.lock() = Some(scope);
    }

    /// Matchers may run user code, so the scope is matched outside its lock.
    pub fn matches(&self, args: &Args) -> bool {
        self.scope().map_or(true, |scope| scope.matches(args))
    }

    pub fn has_behavior(&self) -> bool {
        self.behavior.lock().is_some()
    }

    pub fn set_behavior(&self, behavior: Behavior) {
        *self.behavior.lock() = Some(behavior);
    }

    pub(crate) fn next_output(&self) -> Result<Option<Output>> {
        self.behavior.lock().as_mut().map(Behavior::next).transpose()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Counts a call. A call past the ceiling is refused and not counted;
    /// the error carries the ceiling.
    pub fn record_call(&self) -> std::result::Result<usize, usize> {
        if let Some(max) = *self.max_calls.lock() {
            if self.calls() >= max {
                return Err(max);
            }
        }
        Ok(self.calls.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn set_max_calls(&self, max_calls: usize) {
        *self.max_calls.lock() = Some(max_calls);
    }

    pub fn is_ordered(&self) -> bool {
        self.ordered.load(Ordering::SeqCst)
    }

    pub fn set_ordered(&self) {
        self.ordered.store(true, Ordering::SeqCst);
    }

    /// How the rule's scope reads in diagnostics.
    pub fn describe_scope(&self, indent: usize) -> String {
        match &*self.scope.lock() {
            Some(scope) => format!("arguments:\n{}", scope.format(indent)),
            None => "any arguments ".to_string(),
        }
    }
}
