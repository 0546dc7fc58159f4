//! A small dynamic object model: the environment mocks are installed into.

mod class;
mod exception;
mod function;
mod module;
pub(crate) mod object;
mod signature;
mod value;

pub use class::{Class, ClassBuilder, Descriptor, InstanceProxy};
pub use exception::{Exception, ExceptionType};
pub use function::{BoundMethod, Coroutine, Function, ValueIter};
pub use module::{Module, Runtime};
pub use object::Object;
pub use signature::{Param, ParamKind, Signature, TypeHint};
pub(crate) use value::format_call;
pub use value::{Args, Value};

use crate::Result;

/// Attribute access by name.
pub trait Attributes {
    /// Full lookup, including inherited and descriptor-provided attributes.
    fn get_attr(&self, name: &str) -> Result<Value>;
    /// The raw entry of the target's own dictionary.
    fn own_attr(&self, name: &str) -> Option<Value>;
    fn set_attr(&self, name: &str, value: Value) -> Result<()>;
    fn del_attr(&self, name: &str) -> Result<()>;
}
