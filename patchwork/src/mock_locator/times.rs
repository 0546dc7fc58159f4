use std::fmt;

use crate::rule::Rule;
use crate::{Error, Result};

/// A call count assertion.
#[doc(hidden)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Times {
    Exactly(usize),
    AtLeast(usize),
    /// At least once and at most n times.
    AtMost(usize),
}

impl Times {
    pub(crate) fn contains(&self, count: usize) -> bool {
        match *self {
            Times::Exactly(n) => count == n,
            Times::AtLeast(n) => count >= n,
            Times::AtMost(n) => count >= 1 && count <= n,
        }
    }

    /// The number of calls after which further calls are refused.
    pub(crate) fn ceiling(&self) -> Option<usize> {
        match *self {
            Times::Exactly(0) => Some(0),
            Times::AtMost(n) => Some(n),
            _ => None,
        }
    }

    pub(crate) fn check(&self, target: &str, attribute: &str, rule: &Rule) -> Result<()> {
        let calls = rule.calls();
        if self.contains(calls) {
            return Ok(());
        }
        Err(Error::Assertion(format!(
            "calls did not match assertion.\n\
             {target}, '{attribute}':\n  \
             expected: called {self} time(s) with {}  \
             received: {calls} call(s)",
            rule.describe_scope(2)
        )))
    }
}

impl fmt::Display for Times {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Times::Exactly(n) => write!(f, "exactly {n}"),
            Times::AtLeast(n) => write!(f, "at least {n}"),
            Times::AtMost(n) => write!(f, "at most {n}"),
        }
    }
}
