use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::{Attributes, Error, Result, Value};

struct ModuleInner {
    name: String,
    dict: RwLock<HashMap<String, Value>>,
    frozen: AtomicBool,
}

#[derive(Clone)]
pub struct Module(Arc<ModuleInner>);

impl Module {
    pub fn new(name: &str) -> Self {
        Self(Arc::new(ModuleInner {
            name: name.to_string(),
            dict: RwLock::new(HashMap::new()),
            frozen: AtomicBool::new(false),
        }))
    }

    /// Adds an attribute while building the module.
    pub fn with(self, name: &str, value: impl Into<Value>) -> Self {
        self.0.dict.write().insert(name.to_string(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn repr(&self) -> String {
        format!("<module '{}'>", self.0.name)
    }

    pub fn set_frozen(&self, frozen: bool) {
        self.0.frozen.store(frozen, Ordering::SeqCst);
    }

    pub fn ptr_eq(&self, other: &Module) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
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
}

impl Attributes for Module {
    fn get_attr(&self, name: &str) -> Result<Value> {
        if name == "__name__" {
            return Ok(Value::from(self.name()));
        }
        self.own_attr(name).ok_or_else(|| Error::AttributeNotFound {
            target: self.repr(),
            attribute: name.to_string(),
        })
    }

    fn own_attr(&self, name: &str) -> Option<Value> {
        self.0.dict.read().get(name).cloned()
    }

    fn set_attr(&self, name: &str, value: Value) -> Result<()> {
        self.check_frozen(name)?;
        self.0.dict.write().insert(name.to_string(), value);
        Ok(())
    }

    fn del_attr(&self, name: &str) -> Result<()> {
        self.check_frozen(name)?;
        self.0
            .dict
            .write()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Error::AttributeNotFound {
                target: self.repr(),
                attribute: name.to_string(),
            })
    }
}

impl Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr())
    }
}

static GLOBAL: Lazy<Runtime> = Lazy::new(Runtime::new);

/// The table of importable modules.
#[derive(Clone, Default)]
pub struct Runtime(Arc<RwLock<HashMap<String, Module>>>);

impl Runtime {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide module table.
    pub fn global() -> Runtime {
        GLOBAL.clone()
    }

    /// Registers `module` under its name and binds it on its parent module
    /// when the parent is registered.
    pub fn register(&self, module: Module) -> Module {
        let name = module.name().to_string();
        let parent = name
            .rsplit_once('.')
            .and_then(|(parent, child)| self.import(parent).ok().map(|parent| (parent, child)));
        if let Some((parent, child)) = parent {
            parent
                .0
                .dict
                .write()
                .insert(child.to_string(), Value::Module(module.clone()));
        }
        self.0.write().insert(name, module.clone());
        module
    }

    pub fn unregister(&self, name: &str) -> Option<Module> {
        self.0.write().remove(name)
    }

    pub fn import(&self, name: &str) -> Result<Module> {
        self.0
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::ModuleNotFound(name.to_string()))
    }

    /// Resolves a dotted path: the first component is imported, every next
    /// component is an attribute lookup that falls back to importing the
    /// dotted prefix walked so far.
    pub fn resolve(&self, path: &str) -> Result<Value> {
        let mut components = path.split('.');
        let first = components.next().unwrap_or_default();
        let mut import_path = first.to_string();
        let mut found = Value::Module(self.import(first)?);
        for component in components {
            import_path.push('.');
            import_path.push_str(component);
            found = match found.get_attr(component) {
                Ok(value) => value,
                Err(error @ Error::AttributeNotFound { .. }) => match self.import(&import_path) {
                    Ok(module) => Value::Module(module),
                    Err(_) => return Err(error),
                },
                Err(error) => return Err(error),
            };
        }
        Ok(found)
    }
}
