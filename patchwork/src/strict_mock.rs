use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::{Args, Attributes, Class, Error, Result, Value};

struct StrictMockInner {
    template: Option<Class>,
    name: Option<String>,
    attributes: RwLock<HashMap<String, Value>>,
}

/// A placeholder object that fails on any attribute it was not given.
///
/// With a template class, only attributes the template has can be set, and
/// attributes that are callable on the template must be set to callables.
#[derive(Clone)]
pub struct StrictMock(Arc<StrictMockInner>);

impl StrictMock {
    pub fn new() -> Self {
        Self::build(None, None)
    }

    pub fn with_template(template: &Class) -> Self {
        Self::build(Some(template.clone()), None)
    }

    fn build(template: Option<Class>, name: Option<String>) -> Self {
        Self(Arc::new(StrictMockInner {
            template,
            name,
            attributes: RwLock::new(HashMap::new()),
        }))
    }

    /// Same template, with a name shown in diagnostics.
    pub fn named(self, name: &str) -> Self {
        Self::build(self.0.template.clone(), Some(name.to_string()))
    }

    pub fn template(&self) -> Option<&Class> {
        self.0.template.as_ref()
    }

    pub fn ptr_eq(&self, other: &StrictMock) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    pub fn repr(&self) -> String {
        let mut repr = format!("<StrictMock {:#x}", self.id());
        if let Some(name) = &self.0.name {
            repr.push_str(&format!(" name='{name}'"));
        }
        if let Some(template) = &self.0.template {
            repr.push_str(&format!(" template={}", template.qualified_name()));
        }
        repr.push('>');
        repr
    }

    pub fn is_callable(&self) -> bool {
        self.own_attr("__call__").is_some()
            || self
                .template()
                .map_or(false, |template| template.lookup_raw("__call__").is_some())
    }

    pub fn call(&self, args: Args) -> Result<Value> {
        self.get_attr("__call__")?.call(args)
    }

    /// Whether the template exposes `name` as a callable. `None` when there
    /// is no template or it lacks the attribute.
    pub(crate) fn template_callable(&self, name: &str) -> Option<bool> {
        let template = self.template()?;
        template.lookup_raw(name)?;
        Some(
            template
                .get_attr(name)
                .map_or(false, |value| value.is_callable()),
        )
    }
}

impl Default for StrictMock {
    fn default() -> Self {
        Self::new()
    }
}

impl Attributes for StrictMock {
    fn get_attr(&self, name: &str) -> Result<Value> {
        self.own_attr(name).ok_or_else(|| Error::UndefinedAttribute {
            mock: self.repr(),
            attribute: name.to_string(),
        })
    }

    fn own_attr(&self, name: &str) -> Option<Value> {
        self.0.attributes.read().get(name).cloned()
    }

    fn set_attr(&self, name: &str, value: Value) -> Result<()> {
        if self.template().is_some() {
            match self.template_callable(name) {
                None => {
                    return Err(Error::NonExistentAttribute {
                        mock: self.repr(),
                        attribute: name.to_string(),
                    })
                }
                Some(true) if !value.is_callable() => {
                    return Err(Error::NonCallableValue {
                        mock: self.repr(),
                        attribute: name.to_string(),
                    })
                }
                Some(_) => {}
            }
        }
        self.0.attributes.write().insert(name.to_string(), value);
        Ok(())
    }

    fn del_attr(&self, name: &str) -> Result<()> {
        self.0
            .attributes
            .write()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Error::UndefinedAttribute {
                mock: self.repr(),
                attribute: name.to_string(),
            })
    }
}

impl Debug for StrictMock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr())
    }
}
