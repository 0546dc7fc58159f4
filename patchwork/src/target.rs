use std::fmt::{self, Debug};

use crate::{Attributes, Class, Error, Module, Object, Result, Runtime, StrictMock, Value};

/// Something whose attributes can be patched.
#[derive(Clone)]
pub enum Target {
    Module(Module),
    Class(Class),
    Object(Object),
    StrictMock(StrictMock),
}

impl Target {
    /// Identity of the underlying object; two handles to the same object
    /// share it.
    pub fn id(&self) -> usize {
        match self {
            Target::Module(module) => module.id(),
            Target::Class(class) => class.id(),
            Target::Object(object) => object.id(),
            Target::StrictMock(mock) => mock.id(),
        }
    }

    pub fn repr(&self) -> String {
        match self {
            Target::Module(module) => module.repr(),
            Target::Class(class) => class.repr(),
            Target::Object(object) => object.repr(),
            Target::StrictMock(mock) => mock.repr(),
        }
    }

    pub fn value(&self) -> Value {
        match self {
            Target::Module(module) => Value::Module(module.clone()),
            Target::Class(class) => Value::Class(class.clone()),
            Target::Object(object) => Value::Object(object.clone()),
            Target::StrictMock(mock) => Value::StrictMock(mock.clone()),
        }
    }

    /// The class whose dictionary attribute lookups go through: the class
    /// itself, or the class of an instance.
    pub fn class(&self) -> Option<&Class> {
        match self {
            Target::Class(class) => Some(class),
            Target::Object(object) => Some(object.class()),
            _ => None,
        }
    }

    fn attributes(&self) -> &dyn Attributes {
        match self {
            Target::Module(module) => module,
            Target::Class(class) => class,
            Target::Object(object) => object,
            Target::StrictMock(mock) => mock,
        }
    }
}

impl Attributes for Target {
    fn get_attr(&self, name: &str) -> Result<Value> {
        self.attributes().get_attr(name)
    }

    fn own_attr(&self, name: &str) -> Option<Value> {
        self.attributes().own_attr(name)
    }

    fn set_attr(&self, name: &str, value: Value) -> Result<()> {
        self.attributes().set_attr(name, value)
    }

    fn del_attr(&self, name: &str) -> Result<()> {
        self.attributes().del_attr(name)
    }
}

impl Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr())
    }
}

impl TryFrom<Value> for Target {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Module(module) => Ok(Target::Module(module)),
            Value::Class(class) => Ok(Target::Class(class)),
            Value::Object(object) => Ok(Target::Object(object)),
            Value::StrictMock(mock) => Ok(Target::StrictMock(mock)),
            other => Err(Error::Usage(format!(
                "{} can not be used as a mock target",
                other.repr()
            ))),
        }
    }
}

/// Conversion into a [`Target`], resolving dotted paths against a runtime.
pub trait IntoTarget {
    fn into_target(self, runtime: &Runtime) -> Result<Target>;
}

impl IntoTarget for Target {
    fn into_target(self, _: &Runtime) -> Result<Target> {
        Ok(self)
    }
}

impl IntoTarget for &Target {
    fn into_target(self, _: &Runtime) -> Result<Target> {
        Ok(self.clone())
    }
}

impl IntoTarget for &str {
    fn into_target(self, runtime: &Runtime) -> Result<Target> {
        Target::try_from(runtime.resolve(self)?)
    }
}

impl IntoTarget for String {
    fn into_target(self, runtime: &Runtime) -> Result<Target> {
        self.as_str().into_target(runtime)
    }
}

impl IntoTarget for Value {
    fn into_target(self, _: &Runtime) -> Result<Target> {
        Target::try_from(self)
    }
}

impl IntoTarget for &Value {
    fn into_target(self, _: &Runtime) -> Result<Target> {
        Target::try_from(self.clone())
    }
}

macro_rules! into_target {
    ($($ty:ident),*) => {
        $(
            impl IntoTarget for $ty {
                fn into_target(self, _: &Runtime) -> Result<Target> {
                    Ok(Target::$ty(self))
                }
            }

            impl IntoTarget for &$ty {
                fn into_target(self, _: &Runtime) -> Result<Target> {
                    Ok(Target::$ty(self.clone()))
                }
            }
        )*
    };
}

into_target!(Module, Class, Object, StrictMock);

pub(crate) fn is_dunder(name: &str) -> bool {
    name.len() > 4 && name.starts_with("__") && name.ends_with("__")
}

pub(crate) fn is_private(name: &str) -> bool {
    name.starts_with('_') && !is_dunder(name)
}

pub(crate) fn check_private(name: &str, allow_private: bool) -> Result<()> {
    if is_private(name) && !allow_private {
        return Err(Error::PrivateAttribute(name.to_string()));
    }
    Ok(())
}
