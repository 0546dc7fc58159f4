use std::fmt::Write as _;

use parking_lot::Mutex;

use crate::{Error, Result};

/// One entry of an ordered call sequence.
#[derive(Clone, Debug)]
pub(crate) struct OrderedCall {
    pub rule: usize,
    pub target: String,
    pub attribute: String,
    pub scope: String,
}

impl PartialEq for OrderedCall {
    fn eq(&self, other: &Self) -> bool {
        self.rule == other.rule
    }
}

/// Expected and received sequences of the calls asserted to happen in
/// order, shared by every mock of a session.
#[derive(Default)]
pub(crate) struct OrderRecord {
    expected: Mutex<Vec<OrderedCall>>,
    received: Mutex<Vec<OrderedCall>>,
}

impl OrderRecord {
    /// Appends to the expected sequence. Returns `true` for the first
    /// expectation, when the check still has to be registered.
    pub fn expect(&self, call: OrderedCall) -> bool {
        let mut expected = self.expected.lock();
        expected.push(call);
        expected.len() == 1
    }

    pub fn receive(&self, call: OrderedCall) {
        self.received.lock().push(call);
    }

    pub fn check(&self) -> Result<()> {
        let expected = self.expected.lock();
        let received = self.received.lock();
        if *expected == *received {
            return Ok(());
        }
        let mut message = String::from("calls did not match assertion.\n");
        message.push_str("  expected calls in this order:\n");
        for call in expected.iter() {
            let _ = writeln!(message, "    {}, '{}' with {}", call.target, call.attribute, call.scope);
        }
        message.push_str("  received calls in this order:\n");
        for call in received.iter() {
            let _ = writeln!(message, "    {}, '{}' with {}", call.target, call.attribute, call.scope);
        }
        Err(Error::Assertion(message))
    }

    pub fn clear(&self) {
        self.expected.lock().clear();
        self.received.lock().clear();
    }
}
