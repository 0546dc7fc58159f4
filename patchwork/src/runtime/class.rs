use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use crate::runtime::object::ObjectInner;
use crate::{Args, Attributes, BoundMethod, Error, Function, Object, Result, Value};

/// A value stored in a class dictionary that customizes attribute access.
#[derive(Clone)]
pub enum Descriptor {
    StaticMethod(Box<Value>),
    ClassMethod(Function),
    Property(Function),
    /// Answers with a per-instance value for the instances it knows and
    /// with the previous class entry for every other instance.
    InstanceProxy(Arc<InstanceProxy>),
    /// Left on a class whose constructor is intercepted; any access fails.
    Guard(Arc<str>),
}

impl Descriptor {
    pub fn kind(&self) -> &'static str {
        match self {
            Descriptor::StaticMethod(_) => "staticmethod",
            Descriptor::ClassMethod(_) => "classmethod",
            Descriptor::Property(_) => "property",
            Descriptor::InstanceProxy(_) => "instance_proxy",
            Descriptor::Guard(_) => "guard",
        }
    }

    /// Data descriptors take precedence over the instance dictionary.
    pub fn is_data(&self) -> bool {
        matches!(
            self,
            Descriptor::Property(_) | Descriptor::InstanceProxy(_) | Descriptor::Guard(_)
        )
    }

    pub fn ptr_eq(&self, other: &Descriptor) -> bool {
        match (self, other) {
            (Descriptor::InstanceProxy(a), Descriptor::InstanceProxy(b)) => Arc::ptr_eq(a, b),
            (Descriptor::Guard(a), Descriptor::Guard(b)) => Arc::ptr_eq(a, b),
            (Descriptor::Property(a), Descriptor::Property(b))
            | (Descriptor::ClassMethod(a), Descriptor::ClassMethod(b)) => a.ptr_eq(b),
            (Descriptor::StaticMethod(a), Descriptor::StaticMethod(b)) => a.is_same(b),
            _ => false,
        }
    }
}

pub struct InstanceProxy {
    name: String,
    fallback: Option<Value>,
    overrides: Mutex<HashMap<usize, Value>>,
}

impl InstanceProxy {
    pub(crate) fn new(name: &str, fallback: Option<Value>) -> Self {
        Self {
            name: name.to_string(),
            fallback,
            overrides: Mutex::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The class entry this proxy replaced.
    pub fn fallback(&self) -> Option<&Value> {
        self.fallback.as_ref()
    }

    pub fn get(&self, instance: usize) -> Option<Value> {
        self.overrides.lock().get(&instance).cloned()
    }

    pub fn set(&self, instance: usize, value: Value) -> Option<Value> {
        self.overrides.lock().insert(instance, value)
    }

    pub fn remove(&self, instance: usize) -> Option<Value> {
        self.overrides.lock().remove(&instance)
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.lock().is_empty()
    }
}

struct ClassInner {
    name: String,
    module: String,
    bases: Vec<Class>,
    /// The linearization without the class itself.
    ancestors: Vec<Class>,
    dict: RwLock<HashMap<String, Value>>,
    instances: Mutex<Vec<Weak<ObjectInner>>>,
    /// Where the constructor is intercepted, if it is.
    intercepted: Mutex<Option<String>>,
}

#[derive(Clone)]
pub struct Class(Arc<ClassInner>);

pub struct ClassBuilder {
    name: String,
    module: String,
    bases: Vec<Class>,
    dict: HashMap<String, Value>,
}

impl ClassBuilder {
    pub fn module(mut self, module: &str) -> Self {
        self.module = module.to_string();
        self
    }

    pub fn base(mut self, base: &Class) -> Self {
        self.bases.push(base.clone());
        self
    }

    pub fn attribute(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.dict.insert(name.to_string(), value.into());
        self
    }

    pub fn method(self, name: &str, function: Function) -> Self {
        self.attribute(name, function)
    }

    pub fn static_method(self, name: &str, function: Function) -> Self {
        self.attribute(name, Descriptor::StaticMethod(Box::new(function.into())))
    }

    pub fn class_method(self, name: &str, function: Function) -> Self {
        self.attribute(name, Descriptor::ClassMethod(function))
    }

    pub fn property(self, name: &str, getter: Function) -> Self {
        self.attribute(name, Descriptor::Property(getter))
    }

    pub fn build(self) -> Result<Class> {
        let ancestors =
            linearize(&self.bases).ok_or_else(|| Error::InconsistentMro(self.name.clone()))?;
        Ok(Class(Arc::new(ClassInner {
            name: self.name,
            module: self.module,
            bases: self.bases,
            ancestors,
            dict: RwLock::new(self.dict),
            instances: Mutex::new(Vec::new()),
            intercepted: Mutex::new(None),
        })))
    }
}

/// C3 linearization of the given bases.
fn linearize(bases: &[Class]) -> Option<Vec<Class>> {
    let mut sequences: Vec<Vec<Class>> = bases.iter().map(Class::mro).collect();
    sequences.push(bases.to_vec());
    let mut result: Vec<Class> = Vec::new();
    loop {
        sequences.retain(|sequence| !sequence.is_empty());
        if sequences.is_empty() {
            return Some(result);
        }
        let head = sequences
            .iter()
            .map(|sequence| &sequence[0])
            .find(|candidate| {
                !sequences
                    .iter()
                    .any(|sequence| sequence[1..].iter().any(|class| class.ptr_eq(candidate)))
            })?
            .clone();
        for sequence in sequences.iter_mut() {
            if sequence[0].ptr_eq(&head) {
                sequence.remove(0);
            }
        }
        result.push(head);
    }
}

impl Class {
    pub fn builder(name: &str) -> ClassBuilder {
        ClassBuilder {
            name: name.to_string(),
            module: String::new(),
            bases: Vec::new(),
            dict: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn module(&self) -> &str {
        &self.0.module
    }

    pub fn qualified_name(&self) -> String {
        if self.0.module.is_empty() {
            self.0.name.clone()
        } else {
            format!("{}.{}", self.0.module, self.0.name)
        }
    }

    pub fn repr(&self) -> String {
        format!("<class '{}'>", self.qualified_name())
    }

    pub fn bases(&self) -> &[Class] {
        &self.0.bases
    }

    pub fn mro(&self) -> Vec<Class> {
        let mut mro = Vec::with_capacity(self.0.ancestors.len() + 1);
        mro.push(self.clone());
        mro.extend(self.0.ancestors.iter().cloned());
        mro
    }

    pub fn is_subclass_of(&self, other: &Class) -> bool {
        self.ptr_eq(other) || self.0.ancestors.iter().any(|class| class.ptr_eq(other))
    }

    pub fn ptr_eq(&self, other: &Class) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    /// Finds `name` along the MRO and returns the defining class together
    /// with the raw dictionary entry.
    pub fn lookup_raw(&self, name: &str) -> Option<(Class, Value)> {
        self.mro()
            .into_iter()
            .find_map(|class| class.own_raw(name).map(|value| (class, value)))
    }

    /// Like [`Class::lookup_raw`] but only considers classes after `owner`.
    pub(crate) fn lookup_after(&self, name: &str, owner: &Class) -> Option<(Class, Value)> {
        self.mro()
            .into_iter()
            .skip_while(|class| !class.ptr_eq(owner))
            .skip(1)
            .find_map(|class| class.own_raw(name).map(|value| (class, value)))
    }

    pub(crate) fn own_raw(&self, name: &str) -> Option<Value> {
        self.0.dict.read().get(name).cloned()
    }

    pub(crate) fn own_names(&self) -> Vec<String> {
        self.0.dict.read().keys().cloned().collect()
    }

    pub(crate) fn set_raw(&self, name: &str, value: Value) -> Option<Value> {
        self.0.dict.write().insert(name.to_string(), value)
    }

    pub(crate) fn remove_raw(&self, name: &str) -> Option<Value> {
        self.0.dict.write().remove(name)
    }

    fn guard_for(&self, name: &str) -> Option<Error> {
        match self.own_raw(name) {
            Some(Value::Descriptor(Descriptor::Guard(class))) => {
                Some(Error::AttributeAccessBlocked {
                    class: class.to_string(),
                    attribute: name.to_string(),
                })
            }
            _ => None,
        }
    }

    /// Resolves a dictionary entry found at `owner` for access through the
    /// class itself.
    fn access(&self, name: &str, owner: &Class, value: Value) -> Result<Value> {
        match value {
            Value::Descriptor(Descriptor::Guard(class)) => Err(Error::AttributeAccessBlocked {
                class: class.to_string(),
                attribute: name.to_string(),
            }),
            Value::Descriptor(Descriptor::StaticMethod(function)) => Ok(*function),
            Value::Descriptor(Descriptor::ClassMethod(function)) => Ok(Value::BoundMethod(
                BoundMethod::new(Value::Class(self.clone()), function),
            )),
            Value::Descriptor(Descriptor::InstanceProxy(proxy)) => match proxy.fallback() {
                Some(fallback) => self.access(name, owner, fallback.clone()),
                None => match self.lookup_after(name, owner) {
                    Some((next, value)) => self.access(name, &next, value),
                    None => Err(self.not_found(name)),
                },
            },
            other => Ok(other),
        }
    }

    /// Resolves a dictionary entry found at `owner` for access through an
    /// instance of this class.
    pub(crate) fn access_from(
        &self,
        instance: &Object,
        name: &str,
        owner: &Class,
        value: Value,
    ) -> Result<Value> {
        match value {
            Value::Function(function) => Ok(Value::BoundMethod(BoundMethod::new(
                Value::Object(instance.clone()),
                function,
            ))),
            Value::Descriptor(Descriptor::Property(getter)) => {
                getter.call(Args::new().with(instance.clone()))
            }
            Value::Descriptor(Descriptor::InstanceProxy(proxy)) => {
                if let Some(value) = proxy.get(instance.id()) {
                    return Ok(value);
                }
                match proxy.fallback() {
                    Some(fallback) => self.access_from(instance, name, owner, fallback.clone()),
                    None => match self.lookup_after(name, owner) {
                        Some((next, value)) => self.access_from(instance, name, &next, value),
                        None => Err(instance.not_found(name)),
                    },
                }
            }
            other => self.access(name, owner, other),
        }
    }

    fn not_found(&self, name: &str) -> Error {
        Error::AttributeNotFound {
            target: self.repr(),
            attribute: name.to_string(),
        }
    }

    /// Runs the construction protocol: the allocation hook, then the
    /// initializer when the allocated value is an instance of this class.
    pub fn instantiate(&self, args: Args) -> Result<Value> {
        let instance = match self.lookup_raw("__new__") {
            Some((owner, value)) => {
                let new = self.access("__new__", &owner, value)?;
                new.call(args.clone().prepend(self.clone()))?
            }
            None => Value::Object(Object::new(self)),
        };
        if let Value::Object(object) = &instance {
            if object.class().is_subclass_of(self) && self.lookup_raw("__init__").is_some() {
                object.get_attr("__init__")?.call(args)?;
            }
        }
        Ok(instance)
    }

    pub(crate) fn track(&self, instance: Weak<ObjectInner>) {
        self.0.instances.lock().push(instance);
    }

    /// Instances of exactly this class that are still alive.
    pub fn live_instances(&self) -> usize {
        let mut instances = self.0.instances.lock();
        instances.retain(|instance| instance.strong_count() > 0);
        instances.len()
    }

    pub fn is_intercepted(&self) -> bool {
        self.0.intercepted.lock().is_some()
    }

    /// Marks the constructor as intercepted at `target`. Fails with the
    /// current target when it already is.
    pub(crate) fn intercept(&self, target: &str) -> std::result::Result<(), String> {
        let mut intercepted = self.0.intercepted.lock();
        match &*intercepted {
            Some(other) => Err(other.clone()),
            None => {
                *intercepted = Some(target.to_string());
                Ok(())
            }
        }
    }

    pub(crate) fn release(&self) {
        *self.0.intercepted.lock() = None;
    }
}

impl Attributes for Class {
    fn get_attr(&self, name: &str) -> Result<Value> {
        if name == "__name__" {
            return Ok(Value::from(self.name()));
        }
        match self.lookup_raw(name) {
            Some((owner, value)) => self.access(name, &owner, value),
            None => Err(self.not_found(name)),
        }
    }

    fn own_attr(&self, name: &str) -> Option<Value> {
        self.own_raw(name)
    }

    fn set_attr(&self, name: &str, value: Value) -> Result<()> {
        if let Some(error) = self.guard_for(name) {
            return Err(error);
        }
        self.set_raw(name, value);
        Ok(())
    }

    fn del_attr(&self, name: &str) -> Result<()> {
        if let Some(error) = self.guard_for(name) {
            return Err(error);
        }
        self.remove_raw(name)
            .map(|_| ())
            .ok_or_else(|| self.not_found(name))
    }
}

impl Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr())
    }
}
