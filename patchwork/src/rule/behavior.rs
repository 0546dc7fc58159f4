use std::collections::VecDeque;

use crate::{Error, Exception, Result, Value, ValueIter};

/// What a matched call does.
#[derive(Clone, Debug)]
pub enum Behavior {
    ReturnValue(Value),
    /// Values handed out in order, one per call, never repeated.
    ReturnValues(VecDeque<Value>),
    /// Every call returns a fresh iterator over the values.
    YieldValues(Vec<Value>),
    Raise(Exception),
    Implementation(Value),
    /// Called with the original callable first, then the call's arguments.
    Wrapper(Value),
    CallOriginal,
}

/// The next step of a behavior, detached from the behavior so it can run
/// without holding any lock.
#[derive(Debug)]
pub(crate) enum Output {
    Return(Value),
    Raise(Exception),
    Implementation(Value),
    Wrapper(Value),
    CallOriginal,
}

impl Behavior {
    pub(crate) fn next(&mut self) -> Result<Output> {
        Ok(match self {
            Behavior::ReturnValue(value) => Output::Return(value.clone()),
            Behavior::ReturnValues(values) => match values.pop_front() {
                Some(value) => Output::Return(value),
                None => return Err(Error::NoMoreValues),
            },
            Behavior::YieldValues(values) => {
                Output::Return(Value::Iterator(ValueIter::new(values.clone())))
            }
            Behavior::Raise(exception) => Output::Raise(exception.clone()),
            Behavior::Implementation(function) => Output::Implementation(function.clone()),
            Behavior::Wrapper(function) => Output::Wrapper(function.clone()),
            Behavior::CallOriginal => Output::CallOriginal,
        })
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Behavior::ReturnValue(_) => "to_return_value",
            Behavior::ReturnValues(_) => "to_return_values",
            Behavior::YieldValues(_) => "to_yield_values",
            Behavior::Raise(_) => "to_raise",
            Behavior::Implementation(_) => "with_implementation",
            Behavior::Wrapper(_) => "with_wrapper",
            Behavior::CallOriginal => "to_call_original",
        }
    }
}
