use std::sync::Arc;

use tracing::debug;

use crate::target::is_dunder;
use crate::{Attributes, Class, Descriptor, Error, InstanceProxy, Result, Target, Value};

/// One applied attribute substitution and what it takes to undo it.
pub(crate) enum Patch {
    /// The own slot of the target was replaced. `restore` is the previous
    /// own slot value; `None` means the slot did not exist and is deleted.
    Attribute {
        target: Target,
        name: String,
        restore: Option<Value>,
    },
    /// An attribute the class provides to an instance, overridden for that
    /// instance only through a proxy in the class dictionary.
    Instance {
        target: Target,
        class: Class,
        instance: usize,
        name: String,
        proxy: Arc<InstanceProxy>,
        previous: Option<Value>,
        /// Set when this patch installed the proxy: the class entry it
        /// replaced.
        installed: Option<Option<Value>>,
    },
}

impl Patch {
    /// Substitutes `value` for `name` on `target`.
    pub fn apply(target: &Target, name: &str, value: Value) -> Result<Patch> {
        if is_dunder(name) {
            if let Some(class) = target.class() {
                if class.lookup_raw(name).is_none() {
                    return Err(Error::NotImplemented(format!(
                        "Patching of {name} on {} is not supported: {} does not define it, \
                         so it would never be looked up.",
                        target.repr(),
                        class.repr()
                    )));
                }
            }
        }
        let patch = match target {
            Target::Object(object) if needs_proxy(object.class(), name) => {
                let class = object.class().clone();
                let (proxy, installed) = match class.own_raw(name) {
                    Some(Value::Descriptor(Descriptor::InstanceProxy(proxy))) => (proxy, None),
                    entry => {
                        let proxy = Arc::new(InstanceProxy::new(name, entry.clone()));
                        class.set_raw(
                            name,
                            Value::Descriptor(Descriptor::InstanceProxy(proxy.clone())),
                        );
                        (proxy, Some(entry))
                    }
                };
                let previous = proxy.set(object.id(), value);
                Patch::Instance {
                    target: target.clone(),
                    class,
                    instance: object.id(),
                    name: name.to_string(),
                    proxy,
                    previous,
                    installed,
                }
            }
            _ => {
                let restore = target.own_attr(name);
                target.set_attr(name, value)?;
                Patch::Attribute {
                    target: target.clone(),
                    name: name.to_string(),
                    restore,
                }
            }
        };
        debug!(target = %target.repr(), attribute = name, "patched");
        Ok(patch)
    }

    pub fn target(&self) -> &Target {
        match self {
            Patch::Attribute { target, .. } | Patch::Instance { target, .. } => target,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Patch::Attribute { name, .. } | Patch::Instance { name, .. } => name,
        }
    }

    /// Puts back what [`Patch::apply`] replaced.
    pub fn reverse(self) -> Result<()> {
        let target = self.target().repr();
        let attribute = self.name().to_string();
        let result = match self {
            Patch::Attribute {
                target,
                name,
                restore: Some(value),
            } => target.set_attr(&name, value),
            Patch::Attribute {
                target,
                name,
                restore: None,
            } => target.del_attr(&name),
            Patch::Instance {
                class,
                instance,
                name,
                proxy,
                previous,
                installed,
                ..
            } => {
                match previous {
                    Some(value) => proxy.set(instance, value),
                    None => proxy.remove(instance),
                };
                if let Some(entry) = installed {
                    if proxy.is_empty() {
                        match entry {
                            Some(value) => class.set_raw(&name, value),
                            None => class.remove_raw(&name),
                        };
                    }
                }
                Ok(())
            }
        };
        debug!(%target, %attribute, "unpatched");
        result.map_err(|source| Error::Unpatch {
            target,
            attribute,
            source: Box::new(source),
        })
    }
}

/// Methods, data descriptors and dunders reach an instance through its
/// class, so they are overridden per instance.
fn needs_proxy(class: &Class, name: &str) -> bool {
    match class.lookup_raw(name) {
        Some((_, Value::Function(_) | Value::Descriptor(_))) => true,
        Some(_) => is_dunder(name),
        None => false,
    }
}
