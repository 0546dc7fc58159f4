mod order;

use std::sync::Arc;

pub(crate) use order::*;
use parking_lot::Mutex;
use tracing::trace;

use crate::rule::{Output, Rule};
use crate::{Args, Coroutine, Error, Function, Result, Signature, Value};

/// The substitute installed for one mocked callable: a newest-first chain
/// of rules plus what calls need to be validated and delegated.
pub(crate) struct CallableMock {
    target: String,
    name: String,
    original: Option<Value>,
    rules: Mutex<Vec<Arc<Rule>>>,
    order: Arc<OrderRecord>,
    signature: Option<Signature>,
    /// The signature's first parameter is the receiver, which calls never
    /// carry.
    skip_receiver: bool,
    /// Calls carry a leading argument that implementations, wrappers and
    /// the original never see.
    strip_first: bool,
    is_async: bool,
}

pub(crate) struct CallableMockBuilder {
    mock: CallableMock,
}

impl CallableMockBuilder {
    pub fn original(mut self, original: Option<Value>) -> Self {
        self.mock.original = original;
        self
    }

    pub fn signature(mut self, signature: Option<Signature>, skip_receiver: bool) -> Self {
        self.mock.signature = signature;
        self.mock.skip_receiver = skip_receiver;
        self
    }

    pub fn strip_first(mut self) -> Self {
        self.mock.strip_first = true;
        self
    }

    pub fn asynchronous(mut self) -> Self {
        self.mock.is_async = true;
        self
    }

    pub fn build(self) -> Arc<CallableMock> {
        Arc::new(self.mock)
    }
}

impl CallableMock {
    pub fn builder(target: String, name: &str, order: Arc<OrderRecord>) -> CallableMockBuilder {
        CallableMockBuilder {
            mock: CallableMock {
                target,
                name: name.to_string(),
                original: None,
                rules: Mutex::new(Vec::new()),
                order,
                signature: None,
                skip_receiver: false,
                strip_first: false,
                is_async: false,
            },
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn original(&self) -> Option<&Value> {
        self.original.as_ref()
    }

    pub fn is_async(&self) -> bool {
        self.is_async
    }

    /// Puts `rule` at the head of the chain.
    pub fn push_rule(&self, rule: Arc<Rule>) {
        self.rules.lock().insert(0, rule);
    }

    /// The function that stands in for the original.
    pub fn function(self: &Arc<Self>) -> Function {
        let mock = self.clone();
        if self.is_async {
            Function::new_async(&self.name, move |args| {
                let mock = mock.clone();
                async move { mock.call_async(args).await }
            })
        } else {
            Function::new(&self.name, move |args| mock.call(args))
        }
    }

    pub fn call(&self, args: Args) -> Result<Value> {
        let output = self.dispatch(&args)?;
        let value = match output {
            Output::Return(value) => value,
            Output::Raise(exception) => return Err(Error::Raised(exception)),
            Output::Implementation(function) => function.call(self.user_args(args))?,
            Output::Wrapper(function) => function.call(self.wrapper_args(args)?)?,
            Output::CallOriginal => self.original_callable()?.call(self.user_args(args))?,
        };
        self.validate_return(&value)?;
        Ok(value)
    }

    pub async fn call_async(&self, args: Args) -> Result<Value> {
        let output = self.dispatch(&args)?;
        let value = match output {
            Output::Return(value) => value,
            Output::Raise(exception) => return Err(Error::Raised(exception)),
            Output::Implementation(function) => {
                let result = function.call(self.user_args(args))?;
                self.coroutine(result, "implementation")?.await?
            }
            Output::Wrapper(function) => {
                let result = function.call(self.wrapper_args(args)?)?;
                self.coroutine(result, "wrapper")?.await?
            }
            Output::CallOriginal => {
                let result = self.original_callable()?.call(self.user_args(args))?;
                self.coroutine(result, "original callable")?.await?
            }
        };
        self.validate_return(&value)?;
        Ok(value)
    }

    /// Validates the call, selects the newest matching rule, counts the
    /// call and takes the rule's next output.
    fn dispatch(&self, args: &Args) -> Result<Output> {
        trace!(target = %self.target, attribute = %self.name, ?args, "mock called");
        if let Some(signature) = &self.signature {
            let args = match self.strip_first {
                true => args.clone().split_first().1,
                false => args.clone(),
            };
            signature.validate(&self.display_name(), &args, self.skip_receiver)?;
        }
        let rules = self.rules.lock().clone();
        let rule = match rules.iter().find(|rule| rule.matches(args)) {
            Some(rule) => rule.clone(),
            None => return Err(self.no_behavior(args, &rules)),
        };
        if let Err(max) = rule.record_call() {
            return Err(Error::UnexpectedCallReceived(format!(
                "{}, '{}':\n  Received call:\n{}  Expected to be called at most {} time(s) with {}",
                self.target,
                self.name,
                args.format(2),
                max,
                rule.describe_scope(2),
            )));
        }
        if rule.is_ordered() {
            self.order.receive(self.ordered_call(&rule));
        }
        rule.next_output()?.ok_or(Error::BehaviorNotDefined)
    }

    fn no_behavior(&self, args: &Args, rules: &[Arc<Rule>]) -> Error {
        let mut message = format!(
            "{}, '{}':\n  Received call:\n{}  But no behavior was defined for it.",
            self.target,
            self.name,
            args.format(2)
        );
        let scopes: Vec<String> = rules
            .iter()
            .filter_map(|rule| rule.scope())
            .map(|scope| scope.format(2))
            .collect();
        if scopes.is_empty() {
            return Error::UndefinedBehaviorForCall(message);
        }
        message.push_str("\n  These are the registered calls:\n");
        message.push_str(&scopes.concat());
        Error::UnexpectedCallArguments(message)
    }

    pub fn ordered_call(&self, rule: &Rule) -> OrderedCall {
        OrderedCall {
            rule: rule.id,
            target: self.target.clone(),
            attribute: self.name.clone(),
            scope: rule.describe_scope(3).trim_end().to_string(),
        }
    }

    fn display_name(&self) -> String {
        format!("{}, '{}'", self.target, self.name)
    }

    fn user_args(&self, args: Args) -> Args {
        match self.strip_first {
            true => args.split_first().1,
            false => args,
        }
    }

    fn wrapper_args(&self, args: Args) -> Result<Args> {
        let original = self.original_callable()?.clone();
        Ok(self.user_args(args).prepend(original))
    }

    fn original_callable(&self) -> Result<&Value> {
        self.original.as_ref().ok_or(Error::NoOriginal("call"))
    }

    fn coroutine(&self, value: Value, source: &str) -> Result<Coroutine> {
        match value {
            Value::Coroutine(coroutine) => Ok(coroutine),
            other => Err(Error::NotACoroutine(format!(
                "{}: the {source} returned {}, which is not a coroutine. \
                 mock_async_callable() needs a function defined with async.",
                self.display_name(),
                other.repr()
            ))),
        }
    }

    fn validate_return(&self, value: &Value) -> Result<()> {
        match &self.signature {
            Some(signature) => signature.validate_return(&self.display_name(), value),
            None => Ok(()),
        }
    }
}
