use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::{Args, Attributes, Class, Descriptor, Error, Result, Value};

pub(crate) struct ObjectInner {
    class: Class,
    dict: RwLock<HashMap<String, Value>>,
    frozen: AtomicBool,
}

/// An instance of a [`Class`].
#[derive(Clone)]
pub struct Object(Arc<ObjectInner>);

impl Object {
    /// Allocates a bare instance without running any initializer.
    pub fn new(class: &Class) -> Self {
        let inner = Arc::new(ObjectInner {
            class: class.clone(),
            dict: RwLock::new(HashMap::new()),
            frozen: AtomicBool::new(false),
        });
        class.track(Arc::downgrade(&inner));
        Self(inner)
    }

    pub fn class(&self) -> &Class {
        &self.0.class
    }

    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    pub fn ptr_eq(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// A frozen object refuses to set or delete attributes.
    pub fn set_frozen(&self, frozen: bool) {
        self.0.frozen.store(frozen, Ordering::SeqCst);
    }

    pub fn repr(&self) -> String {
        format!(
            "<{} object at {:#x}>",
            self.0.class.qualified_name(),
            self.id()
        )
    }

    pub fn call(&self, args: Args) -> Result<Value> {
        match self.0.class.lookup_raw("__call__") {
            Some((owner, value)) => self
                .0
                .class
                .access_from(self, "__call__", &owner, value)?
                .call(args),
            None => Err(Error::NotCallable(self.repr())),
        }
    }

    pub(crate) fn not_found(&self, name: &str) -> Error {
        Error::AttributeNotFound {
            target: self.repr(),
            attribute: name.to_string(),
        }
    }

    fn check_frozen(&self, name: &str) -> Result<()> {
        if self.0.frozen.load(Ordering::SeqCst) {
            return Err(Error::Frozen {
                target: self.repr(),
                attribute: name.to_string(),
            });
        }
        Ok(())
    }

    fn data_descriptor(&self, name: &str) -> Option<(Class, Descriptor)> {
        match self.0.class.lookup_raw(name) {
            Some((owner, Value::Descriptor(descriptor))) if descriptor.is_data() => {
                Some((owner, descriptor))
            }
            _ => None,
        }
    }
}

impl Attributes for Object {
    fn get_attr(&self, name: &str) -> Result<Value> {
        if name == "__class__" {
            return Ok(Value::Class(self.0.class.clone()));
        }
        if let Some((owner, descriptor)) = self.data_descriptor(name) {
            return self
                .0
                .class
                .access_from(self, name, &owner, Value::Descriptor(descriptor));
        }
        if let Some(value) = self.own_attr(name) {
            return Ok(value);
        }
        match self.0.class.lookup_raw(name) {
            Some((owner, value)) => self.0.class.access_from(self, name, &owner, value),
            None => Err(self.not_found(name)),
        }
    }

    fn own_attr(&self, name: &str) -> Option<Value> {
        self.0.dict.read().get(name).cloned()
    }

    fn set_attr(&self, name: &str, value: Value) -> Result<()> {
        match self.data_descriptor(name) {
            Some((_, Descriptor::InstanceProxy(proxy))) => {
                proxy.set(self.id(), value);
                Ok(())
            }
            Some((_, Descriptor::Guard(class))) => Err(Error::AttributeAccessBlocked {
                class: class.to_string(),
                attribute: name.to_string(),
            }),
            Some(_) => Err(Error::Raised(crate::Exception::new(
                "AttributeError",
                format!("can't set attribute '{name}'"),
            ))),
            None => {
                self.check_frozen(name)?;
                self.0.dict.write().insert(name.to_string(), value);
                Ok(())
            }
        }
    }

    fn del_attr(&self, name: &str) -> Result<()> {
        if let Some((_, Descriptor::InstanceProxy(proxy))) = self.data_descriptor(name) {
            return proxy
                .remove(self.id())
                .map(|_| ())
                .ok_or_else(|| self.not_found(name));
        }
        self.check_frozen(name)?;
        self.0
            .dict
            .write()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| self.not_found(name))
    }
}

impl Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr())
    }
}
