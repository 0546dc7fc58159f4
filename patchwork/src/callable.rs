use tracing::debug;

use crate::mock::CallableMock;
use crate::mock_key::MockKey;
use crate::patch::Patch;
use crate::target::{check_private, is_dunder};
use crate::{
    Attributes, Descriptor, Error, IntoTarget, MockLocator, MockOptions, Result, Session,
    Signature, Target, Value,
};

/// The callable being replaced, as seen before patching.
struct Original {
    /// What `to_call_original` and wrappers delegate to.
    callable: Option<Value>,
    /// The value describing the callable's signature and flavor; for a
    /// strict mock that is the template's entry.
    reference: Option<Value>,
    /// How the substitute must be stored so lookups hand it out unbound.
    as_static: bool,
}

impl Session {
    /// Replaces the callable `attribute` of `target` with a mock and returns
    /// the handle that configures one behavior of it.
    pub fn mock_callable(&self, target: impl IntoTarget, attribute: &str) -> Result<MockLocator> {
        self.mock_callable_with(target, attribute, MockOptions::default())
    }

    pub fn mock_callable_with(
        &self,
        target: impl IntoTarget,
        attribute: &str,
        options: MockOptions,
    ) -> Result<MockLocator> {
        self.install_callable(target, attribute, options, false)
    }

    /// Like [`Session::mock_callable`] for callables defined with `async`;
    /// the installed mock returns coroutines.
    pub fn mock_async_callable(
        &self,
        target: impl IntoTarget,
        attribute: &str,
    ) -> Result<MockLocator> {
        self.mock_async_callable_with(target, attribute, MockOptions::default())
    }

    pub fn mock_async_callable_with(
        &self,
        target: impl IntoTarget,
        attribute: &str,
        options: MockOptions,
    ) -> Result<MockLocator> {
        self.install_callable(target, attribute, options, true)
    }

    fn install_callable(
        &self,
        target: impl IntoTarget,
        attribute: &str,
        options: MockOptions,
        is_async: bool,
    ) -> Result<MockLocator> {
        self.ensure_active()?;
        let target = target.into_target(self.runtime())?;
        check_private(attribute, options.allow_private)?;
        if attribute == "__new__" {
            return Err(Error::Usage(format!(
                "Mocking __new__ of {} is not supported. Use mock_constructor() instead.",
                target.repr()
            )));
        }
        let key = MockKey::new(&target, attribute);
        if let Some(mock) = self.with_state(|state| Ok(state.mocks.callable(&key)))? {
            if mock.is_async() != is_async {
                return Err(Error::Usage(format!(
                    "'{attribute}' of {} is already mocked with {}.",
                    target.repr(),
                    match mock.is_async() {
                        true => "mock_async_callable()",
                        false => "mock_callable()",
                    }
                )));
            }
            return Ok(MockLocator::new(self.clone(), mock, None));
        }

        let original = original(&target, attribute)?;
        if let Some(reference) = &original.reference {
            check_flavor(&target, attribute, reference, &options, is_async)?;
        }
        let (signature, skip_receiver) = match options.type_validation {
            true => signature(&target, original.reference.as_ref()),
            false => (None, false),
        };
        let mut builder = CallableMock::builder(target.repr(), attribute, self.order().clone())
            .original(original.callable)
            .signature(signature, skip_receiver);
        if is_async {
            builder = builder.asynchronous();
        }
        let mock = builder.build();
        let substitute = match original.as_static {
            true => Value::Descriptor(Descriptor::StaticMethod(Box::new(mock.function().into()))),
            false => mock.function().into(),
        };
        let patch = Patch::apply(&target, attribute, substitute)?;
        debug!(target = %target.repr(), %attribute, is_async, "callable mocked");
        self.with_state(|state| {
            state.mocks.insert_callable(key, mock.clone(), patch);
            Ok(())
        })?;
        Ok(MockLocator::new(self.clone(), mock, None))
    }
}

fn original(target: &Target, attribute: &str) -> Result<Original> {
    if let Target::StrictMock(mock) = target {
        let reference = match mock.template() {
            Some(template) => match mock.template_callable(attribute) {
                None => {
                    return Err(Error::NonExistentAttribute {
                        mock: target.repr(),
                        attribute: attribute.to_string(),
                    })
                }
                Some(false) => {
                    return Err(Error::AttributeNotCallable {
                        target: target.repr(),
                        attribute: attribute.to_string(),
                        value: template.get_attr(attribute)?.repr(),
                    })
                }
                Some(true) => template.lookup_raw(attribute).map(|(_, value)| value),
            },
            None => None,
        };
        let callable = mock.own_attr(attribute);
        return Ok(Original {
            reference: callable.clone().or(reference),
            callable,
            as_static: false,
        });
    }

    let value = target.get_attr(attribute)?;
    if let Value::Class(class) = &value {
        return Err(Error::Usage(format!(
            "'{attribute}' of {} is the class {}. Use mock_constructor() instead.",
            target.repr(),
            class.qualified_name()
        )));
    }
    if !value.is_callable() {
        return Err(Error::AttributeNotCallable {
            target: target.repr(),
            attribute: attribute.to_string(),
            value: value.repr(),
        });
    }
    let mut as_static = false;
    if let Target::Class(class) = target {
        match class.lookup_raw(attribute) {
            Some((_, Value::Function(_))) if !is_dunder(attribute) => {
                return Err(Error::InstanceMethodAtClass {
                    class: class.qualified_name(),
                    attribute: attribute.to_string(),
                })
            }
            Some((
                _,
                Value::Descriptor(Descriptor::StaticMethod(_) | Descriptor::ClassMethod(_)),
            )) => as_static = true,
            _ => {}
        }
    }
    Ok(Original {
        callable: Some(value.clone()),
        reference: Some(value),
        as_static,
    })
}

fn check_flavor(
    target: &Target,
    attribute: &str,
    reference: &Value,
    options: &MockOptions,
    is_async: bool,
) -> Result<()> {
    let coroutine_function = reference.is_coroutine_function();
    if is_async && !coroutine_function && !options.callable_returns_coroutine {
        return Err(Error::Usage(format!(
            "mock_async_callable() can only be used with coroutine functions, and '{attribute}' \
             of {} is not one. Use mock_callable() instead, or set callable_returns_coroutine \
             when it returns a coroutine.",
            target.repr()
        )));
    }
    if !is_async && coroutine_function {
        return Err(Error::Usage(format!(
            "mock_callable() can not be used with coroutine functions, and '{attribute}' of {} \
             is one. Use mock_async_callable() instead.",
            target.repr()
        )));
    }
    Ok(())
}

/// The signature calls are validated against, and whether its first
/// parameter is a receiver the calls do not carry.
fn signature(target: &Target, reference: Option<&Value>) -> (Option<Signature>, bool) {
    match reference {
        Some(Value::BoundMethod(method)) => (method.function().signature().cloned(), true),
        Some(Value::Function(function)) => (
            function.signature().cloned(),
            matches!(target, Target::StrictMock(_)),
        ),
        _ => (None, false),
    }
}
