mod times;

use std::sync::Arc;

pub use times::*;

use crate::mock::CallableMock;
use crate::rule::{Behavior, CallScope, Matcher, Rule};
use crate::{Error, Result, Session, Value};

/// Configures one behavior of a mock and the assertions on it.
///
/// Every behavior setter may be used once per handle; call
/// `mock_callable()` again for each further behavior. Assertions need a
/// behavior first.
pub struct MockLocator {
    session: Session,
    mock: Arc<CallableMock>,
    rule: Arc<Rule>,
    /// Matches the argument every call of a constructor mock carries first.
    leading: Option<Matcher>,
}

impl MockLocator {
    pub(crate) fn new(session: Session, mock: Arc<CallableMock>, leading: Option<Matcher>) -> Self {
        Self {
            session,
            mock,
            rule: Arc::new(Rule::new()),
            leading,
        }
    }

    /// Restricts the behavior to calls with exactly these arguments.
    pub fn for_call(self, mut scope: CallScope) -> Self {
        if let Some(leading) = &self.leading {
            scope.prepend(leading.clone());
        }
        self.rule.set_scope(scope);
        self
    }

    /// Restricts the behavior to calls starting with these positional
    /// arguments and carrying at least these keyword arguments. A scope that
    /// already relaxes only one side through [`CallScope::partial`] keeps
    /// that choice.
    pub fn for_partial_call(self, scope: CallScope) -> Self {
        match scope.is_partial() {
            true => self.for_call(scope),
            false => self.for_call(scope.partial(true, true)),
        }
    }

    pub fn to_return_value(self, value: impl Into<Value>) -> Result<Self> {
        let value = value.into();
        if let Value::Coroutine(_) = value {
            if !self.mock.is_async() {
                return Err(Error::Usage(format!(
                    "{}, '{}': returning a coroutine from mock_callable() is not supported. \
                     Use mock_async_callable() instead.",
                    self.mock.target(),
                    self.mock.name()
                )));
            }
        }
        self.define(Behavior::ReturnValue(value))
    }

    pub fn to_return_values<T: Into<Value>>(self, values: impl IntoIterator<Item = T>) -> Result<Self> {
        self.define(Behavior::ReturnValues(values.into_iter().map(Into::into).collect()))
    }

    /// Every call returns a new iterator over `values`.
    pub fn to_yield_values<T: Into<Value>>(self, values: impl IntoIterator<Item = T>) -> Result<Self> {
        self.define(Behavior::YieldValues(values.into_iter().map(Into::into).collect()))
    }

    /// Raises an exception, or a fresh instance of an exception type.
    pub fn to_raise(self, exception: impl Into<Value>) -> Result<Self> {
        let exception = match exception.into() {
            Value::Exception(exception) => exception,
            Value::ExceptionType(kind) => kind.instantiate(),
            other => {
                return Err(Error::Usage(format!(
                    "to_raise() needs an exception or an exception type, got {}",
                    other.repr()
                )))
            }
        };
        self.define(Behavior::Raise(exception))
    }

    pub fn with_implementation(self, function: impl Into<Value>) -> Result<Self> {
        let function = callable(function.into())?;
        self.define(Behavior::Implementation(function))
    }

    /// Calls `wrapper` with the original callable followed by the call's
    /// arguments.
    pub fn with_wrapper(self, wrapper: impl Into<Value>) -> Result<Self> {
        let wrapper = callable(wrapper.into())?;
        if self.mock.original().is_none() {
            return Err(Error::NoOriginal("wrap"));
        }
        self.define(Behavior::Wrapper(wrapper))
    }

    pub fn to_call_original(self) -> Result<Self> {
        if self.mock.original().is_none() {
            return Err(Error::NoOriginal("call"));
        }
        self.define(Behavior::CallOriginal)
    }

    fn define(self, behavior: Behavior) -> Result<Self> {
        self.session.ensure_active()?;
        if self.rule.has_behavior() {
            return Err(Error::BehaviorAlreadyDefined);
        }
        self.rule.set_behavior(behavior);
        self.mock.push_rule(self.rule.clone());
        Ok(self)
    }

    pub fn and_assert_called_exactly(self, times: usize) -> Result<Self> {
        self.assert_times(Times::Exactly(times))
    }

    pub fn and_assert_called_once(self) -> Result<Self> {
        self.assert_times(Times::Exactly(1))
    }

    pub fn and_assert_called_twice(self) -> Result<Self> {
        self.assert_times(Times::Exactly(2))
    }

    pub fn and_assert_called_at_least(self, times: usize) -> Result<Self> {
        if times < 1 {
            return Err(Error::InvalidTimes);
        }
        self.assert_times(Times::AtLeast(times))
    }

    /// Also refuses calls past `times`, and fails when the behavior was
    /// never called.
    pub fn and_assert_called_at_most(self, times: usize) -> Result<Self> {
        if times < 1 {
            return Err(Error::InvalidTimes);
        }
        self.assert_times(Times::AtMost(times))
    }

    pub fn and_assert_called(self) -> Result<Self> {
        self.assert_times(Times::AtLeast(1))
    }

    /// Any call fails immediately with [`Error::UnexpectedCallReceived`].
    pub fn and_assert_not_called(self) -> Result<Self> {
        self.assert_times(Times::Exactly(0))
    }

    /// Asserts that this behavior and every other one asserted the same way
    /// are called in the order they were configured.
    pub fn and_assert_called_ordered(self) -> Result<Self> {
        self.ensure_behavior()?;
        self.rule.set_ordered();
        let order = self.session.order().clone();
        if order.expect(self.mock.ordered_call(&self.rule)) {
            self.session.register_assertion(move || order.check())?;
        }
        Ok(self)
    }

    fn assert_times(self, times: Times) -> Result<Self> {
        self.ensure_behavior()?;
        if let Some(ceiling) = times.ceiling() {
            self.rule.set_max_calls(ceiling);
        }
        let rule = self.rule.clone();
        let target = self.mock.target().to_string();
        let attribute = self.mock.name().to_string();
        self.session
            .register_assertion(move || times.check(&target, &attribute, &rule))?;
        Ok(self)
    }

    fn ensure_behavior(&self) -> Result<()> {
        self.session.ensure_active()?;
        match self.rule.has_behavior() {
            true => Ok(()),
            false => Err(Error::BehaviorNotDefined),
        }
    }
}

fn callable(value: Value) -> Result<Value> {
    match value.is_callable() {
        true => Ok(value),
        false => Err(Error::NotCallable(value.repr())),
    }
}
