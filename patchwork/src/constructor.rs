use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::mock::CallableMock;
use crate::mock_key::MockKey;
use crate::mocks::Interception;
use crate::patch::Patch;
use crate::rule::Matcher;
use crate::target::check_private;
use crate::{
    Args, Attributes, Class, Descriptor, Error, Function, IntoTarget, MockLocator, MockOptions,
    Object, Result, Session, Target, Value,
};

/// A subclass standing in for an intercepted class, and everything moved
/// off the original to make every lookup go through it.
pub(crate) struct ConstructorShadow {
    original: Class,
    subclass: Class,
    relocated: Vec<(String, Value)>,
}

impl ConstructorShadow {
    pub fn subclass(&self) -> &Class {
        &self.subclass
    }

    /// Moves the original's own attributes back and lifts the interception
    /// flag.
    pub fn reverse(&self) {
        for name in self.subclass.own_names() {
            self.subclass.remove_raw(&name);
        }
        for (name, value) in &self.relocated {
            self.original.set_raw(name, value.clone());
        }
        self.original.release();
        debug!(class = %self.original.qualified_name(), "constructor restored");
    }
}

impl Session {
    /// Intercepts instantiation of the class bound to `class_name` on
    /// `target`. The returned handle configures what constructing it does;
    /// scopes match the constructor arguments.
    pub fn mock_constructor(&self, target: impl IntoTarget, class_name: &str) -> Result<MockLocator> {
        self.mock_constructor_with(target, class_name, MockOptions::default())
    }

    pub fn mock_constructor_with(
        &self,
        target: impl IntoTarget,
        class_name: &str,
        options: MockOptions,
    ) -> Result<MockLocator> {
        self.ensure_active()?;
        let target = target.into_target(self.runtime())?;
        check_private(class_name, options.allow_private)?;
        let key = MockKey::new(&target, class_name);
        if let Some((shadow, mock)) = self.with_state(|state| Ok(state.mocks.constructor(&key)))? {
            let current = target.get_attr(class_name)?;
            if !current.is_same(&Value::Class(shadow.subclass().clone())) {
                return Err(Error::ClassChanged {
                    target: target.repr(),
                    class_name: class_name.to_string(),
                });
            }
            let leading = Matcher::Eq(Value::Class(shadow.subclass().clone()));
            return Ok(MockLocator::new(self.clone(), mock, Some(leading)));
        }

        let original = match target.get_attr(class_name)? {
            Value::Class(class) => class,
            other => {
                return Err(Error::Usage(format!(
                    "mock_constructor() can only be used with classes, and '{class_name}' of {} \
                     is {}.",
                    target.repr(),
                    other.repr()
                )))
            }
        };
        if original.own_raw("__new__").is_some() {
            return Err(Error::Usage(format!(
                "mock_constructor() can not be used with {}: it defines __new__.",
                original.repr()
            )));
        }
        let count = original.live_instances();
        if count > 0 {
            return Err(Error::LiveInstances {
                class: original.qualified_name(),
                count,
            });
        }
        let site = format!("{}, '{class_name}'", target.repr());
        if let Err(other_target) = original.intercept(&site) {
            return Err(Error::ConstructorAlreadyMocked {
                class: original.qualified_name(),
                target: site,
                other_target,
            });
        }

        let (shadow, mock) = match shadow(self, &target, class_name, &original, &options) {
            Ok(built) => built,
            Err(error) => {
                original.release();
                return Err(error);
            }
        };
        let subclass = Value::Class(shadow.subclass().clone());
        let patch = match Patch::apply(&target, class_name, subclass.clone()) {
            Ok(patch) => patch,
            Err(error) => {
                shadow.reverse();
                return Err(error);
            }
        };
        debug!(target = %target.repr(), %class_name, "constructor mocked");
        self.with_state(|state| {
            state.mocks.push(Interception::Constructor(shadow.clone()));
            state.mocks.push(Interception::Patch(patch));
            state.mocks.insert_constructor(key, shadow, mock.clone());
            Ok(())
        })?;
        Ok(MockLocator::new(self.clone(), mock, Some(Matcher::Eq(subclass))))
    }
}

/// Builds the subclass, relocates the original's attributes onto it and
/// installs the constructor mock as its `__new__`.
fn shadow(
    session: &Session,
    target: &Target,
    class_name: &str,
    original: &Class,
    options: &MockOptions,
) -> Result<(Arc<ConstructorShadow>, Arc<CallableMock>)> {
    let subclass = Class::builder(original.name())
        .module(original.module())
        .base(original)
        .build()?;
    let guard = Descriptor::Guard(original.qualified_name().into());
    let mut relocated = Vec::new();
    for name in original.own_names() {
        if let Some(value) = original.set_raw(&name, Value::Descriptor(guard.clone())) {
            subclass.set_raw(&name, value.clone());
            relocated.push((name, value));
        }
    }
    let init = relocated
        .iter()
        .find(|(name, _)| name == "__init__")
        .map(|(_, value)| (original.clone(), value.clone()))
        .or_else(|| original.lookup_after("__init__", original));

    // Arguments of the latest allocation through the original, picked up
    // by the initializer that follows it.
    let pending: Arc<Mutex<Option<Args>>> = Default::default();

    let allocate = {
        let subclass = subclass.clone();
        let base_new = original
            .lookup_after("__new__", original)
            .map(|(owner, _)| owner);
        let pending = pending.clone();
        Function::new("__new__", move |args: Args| {
            *pending.lock() = Some(args.clone());
            match &base_new {
                Some(owner) => owner.get_attr("__new__")?.call(args.prepend(subclass.clone())),
                None => Ok(Value::Object(Object::new(&subclass))),
            }
        })
    };

    let signature = match (&init, options.type_validation) {
        (Some((_, Value::Function(function))), true) => function.signature().cloned(),
        _ => None,
    };
    let mock = CallableMock::builder(target.repr(), class_name, session.order().clone())
        .original(Some(allocate.into()))
        .signature(signature, true)
        .strip_first()
        .build();

    let initialize = {
        let subclass = subclass.clone();
        Function::new("__init__", move |args: Args| {
            let (receiver, passed) = args.split_first();
            let args = pending.lock().take().unwrap_or(passed);
            let (Some(Value::Object(object)), Some((owner, value))) = (receiver, &init) else {
                return Ok(Value::None);
            };
            subclass
                .access_from(&object, "__init__", owner, value.clone())?
                .call(args)
        })
    };
    subclass.set_raw(
        "__new__",
        Value::Descriptor(Descriptor::StaticMethod(Box::new(mock.function().into()))),
    );
    subclass.set_raw("__init__", initialize.into());

    let shadow = Arc::new(ConstructorShadow {
        original: original.clone(),
        subclass,
        relocated,
    });
    Ok((shadow, mock))
}
