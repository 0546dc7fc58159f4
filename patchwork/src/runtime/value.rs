use std::collections::BTreeMap;
use std::fmt::{self, Debug, Write as _};

use crate::{
    Attributes, BoundMethod, Class, Coroutine, Descriptor, Error, Exception, ExceptionType,
    Function, Module, Object, Result, StrictMock, ValueIter,
};

/// A value of the object model.
///
/// Data variants compare structurally (ints and floats numerically); every
/// reference variant compares by identity.
#[derive(Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Tuple(Vec<Value>),
    List(Vec<Value>),
    Dict(BTreeMap<String, Value>),
    Function(Function),
    BoundMethod(BoundMethod),
    Class(Class),
    Object(Object),
    Module(Module),
    Exception(Exception),
    ExceptionType(ExceptionType),
    Iterator(ValueIter),
    Coroutine(Coroutine),
    StrictMock(StrictMock),
    Descriptor(Descriptor),
}

impl Value {
    pub fn type_name(&self) -> String {
        match self {
            Value::None => "NoneType".into(),
            Value::Bool(_) => "bool".into(),
            Value::Int(_) => "int".into(),
            Value::Float(_) => "float".into(),
            Value::Str(_) => "str".into(),
            Value::Tuple(_) => "tuple".into(),
            Value::List(_) => "list".into(),
            Value::Dict(_) => "dict".into(),
            Value::Function(_) => "function".into(),
            Value::BoundMethod(_) => "method".into(),
            Value::Class(_) => "type".into(),
            Value::Object(object) => object.class().name().to_string(),
            Value::Module(_) => "module".into(),
            Value::Exception(exception) => exception.kind().name().to_string(),
            Value::ExceptionType(_) => "type".into(),
            Value::Iterator(_) => "iterator".into(),
            Value::Coroutine(_) => "coroutine".into(),
            Value::StrictMock(_) => "StrictMock".into(),
            Value::Descriptor(descriptor) => descriptor.kind().into(),
        }
    }

    pub fn repr(&self) -> String {
        match self {
            Value::None => "None".into(),
            Value::Bool(true) => "True".into(),
            Value::Bool(false) => "False".into(),
            Value::Int(int) => int.to_string(),
            Value::Float(float) => {
                if float.fract() == 0.0 && float.is_finite() {
                    format!("{float:.1}")
                } else {
                    float.to_string()
                }
            }
            Value::Str(string) => format!("{string:?}").replace('"', "'"),
            Value::Tuple(items) if items.len() == 1 => format!("({},)", items[0].repr()),
            Value::Tuple(items) => format!("({})", join_reprs(items)),
            Value::List(items) => format!("[{}]", join_reprs(items)),
            Value::Dict(map) => {
                let entries: Vec<String> = map
                    .iter()
                    .map(|(key, value)| format!("'{key}': {}", value.repr()))
                    .collect();
                format!("{{{}}}", entries.join(", "))
            }
            Value::Function(function) => format!("{function:?}"),
            Value::BoundMethod(method) => format!("{method:?}"),
            Value::Class(class) => class.repr(),
            Value::Object(object) => object.repr(),
            Value::Module(module) => module.repr(),
            Value::Exception(exception) => exception.repr(),
            Value::ExceptionType(kind) => format!("<class '{}'>", kind.name()),
            Value::Iterator(_) => "<iterator object>".into(),
            Value::Coroutine(coroutine) => format!("{coroutine:?}"),
            Value::StrictMock(mock) => mock.repr(),
            Value::Descriptor(descriptor) => format!("<{} object>", descriptor.kind()),
        }
    }

    /// Identity comparison, the `is` operator of the object model.
    pub fn is_same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            (Value::Class(a), Value::Class(b)) => a.ptr_eq(b),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Module(a), Value::Module(b)) => a.ptr_eq(b),
            (Value::StrictMock(a), Value::StrictMock(b)) => a.ptr_eq(b),
            (Value::Iterator(a), Value::Iterator(b)) => a.ptr_eq(b),
            (Value::Coroutine(a), Value::Coroutine(b)) => a.ptr_eq(b),
            (Value::Descriptor(a), Value::Descriptor(b)) => a.ptr_eq(b),
            (Value::BoundMethod(a), Value::BoundMethod(b)) => a == b,
            (Value::None, Value::None) => true,
            (a, b) if a.is_data() && b.is_data() => a == b,
            _ => false,
        }
    }

    fn is_data(&self) -> bool {
        matches!(
            self,
            Value::Bool(_)
                | Value::Int(_)
                | Value::Float(_)
                | Value::Str(_)
                | Value::Tuple(_)
                | Value::List(_)
                | Value::Dict(_)
                | Value::Exception(_)
                | Value::ExceptionType(_)
        )
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn is_callable(&self) -> bool {
        match self {
            Value::Function(_)
            | Value::BoundMethod(_)
            | Value::Class(_)
            | Value::ExceptionType(_) => true,
            Value::Object(object) => object.class().lookup_raw("__call__").is_some(),
            Value::StrictMock(mock) => mock.is_callable(),
            _ => false,
        }
    }

    /// Whether calling this value produces a coroutine, the way an
    /// `async`-defined function does.
    pub fn is_coroutine_function(&self) -> bool {
        match self {
            Value::Function(function) => function.is_async(),
            Value::BoundMethod(method) => method.function().is_async(),
            _ => false,
        }
    }

    pub fn call(&self, args: Args) -> Result<Value> {
        match self {
            Value::Function(function) => function.call(args),
            Value::BoundMethod(method) => method.call(args),
            Value::Class(class) => class.instantiate(args),
            Value::ExceptionType(kind) => {
                let message = match args.positional().first() {
                    Some(Value::Str(message)) => message.clone(),
                    Some(other) => other.repr(),
                    None => String::new(),
                };
                Ok(Value::Exception(Exception::new(kind.clone(), message)))
            }
            Value::Object(object) => object.call(args),
            Value::StrictMock(mock) => mock.call(args),
            other => Err(Error::NotCallable(other.repr())),
        }
    }

    pub fn get_attr(&self, name: &str) -> Result<Value> {
        match self {
            Value::Module(module) => module.get_attr(name),
            Value::Class(class) => class.get_attr(name),
            Value::Object(object) => object.get_attr(name),
            Value::StrictMock(mock) => mock.get_attr(name),
            Value::BoundMethod(method) if name == "__self__" => Ok(method.receiver().clone()),
            Value::BoundMethod(method) if name == "__func__" => {
                Ok(Value::Function(method.function().clone()))
            }
            other => Err(Error::AttributeNotFound {
                target: other.repr(),
                attribute: name.to_string(),
            }),
        }
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.get_attr(name).is_ok()
    }

    /// Awaits this value if it is a coroutine.
    pub async fn awaited(self) -> Result<Value> {
        match self {
            Value::Coroutine(coroutine) => coroutine.await,
            other => Err(Error::NotACoroutine(format!(
                "{} is not a coroutine",
                other.repr()
            ))),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(string) => Some(string),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(int) => Some(*int),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<&Class> {
        match self {
            Value::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(function) => Some(function),
            _ => None,
        }
    }

    pub fn into_iterator(self) -> Option<ValueIter> {
        match self {
            Value::Iterator(iter) => Some(iter),
            _ => None,
        }
    }

    pub fn into_coroutine(self) -> Option<Coroutine> {
        match self {
            Value::Coroutine(coroutine) => Some(coroutine),
            _ => None,
        }
    }
}

fn join_reprs(items: &[Value]) -> String {
    items.iter().map(Value::repr).collect::<Vec<_>>().join(", ")
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                *a as f64 == *b
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Dict(a), Value::Dict(b)) => a == b,
            (Value::Exception(a), Value::Exception(b)) => a == b,
            (Value::ExceptionType(a), Value::ExceptionType(b)) => a == b,
            (a, b) => !a.is_data() && a.is_same(b),
        }
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(string) => f.write_str(string),
            other => f.write_str(&other.repr()),
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value)
                }
            }

            impl From<&$ty> for Value {
                fn from(value: &$ty) -> Self {
                    Value::$variant(value.clone())
                }
            }
        )*
    };
}

value_from! {
    bool => Bool,
    i64 => Int,
    f64 => Float,
    String => Str,
    BTreeMap<String, Value> => Dict,
    Function => Function,
    BoundMethod => BoundMethod,
    Class => Class,
    Object => Object,
    Module => Module,
    Exception => Exception,
    ExceptionType => ExceptionType,
    ValueIter => Iterator,
    Coroutine => Coroutine,
    StrictMock => StrictMock,
    Descriptor => Descriptor,
}

impl From<&Value> for Value {
    fn from(value: &Value) -> Self {
        value.clone()
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value.into())
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Value::Int(value as i64)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::None
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::None)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::List(values.into_iter().map(Into::into).collect())
    }
}

/// Arguments of a call: positional values plus keyword values.
///
/// Keywords are kept sorted so two calls with the same keywords in a
/// different order compare equal.
#[derive(Clone, Default, PartialEq)]
pub struct Args {
    positional: Vec<Value>,
    keywords: BTreeMap<String, Value>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: impl Into<Value>) {
        self.positional.push(value.into());
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.keywords.insert(key.into(), value.into());
    }

    pub fn with(mut self, value: impl Into<Value>) -> Self {
        self.push(value);
        self
    }

    pub fn with_keyword(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    pub fn keywords(&self) -> &BTreeMap<String, Value> {
        &self.keywords
    }

    pub fn keyword(&self, key: &str) -> Option<&Value> {
        self.keywords.get(key)
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.positional.get(index)
    }

    pub fn len(&self) -> usize {
        self.positional.len() + self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keywords.is_empty()
    }

    /// Inserts `value` as the first positional argument.
    pub fn prepend(mut self, value: impl Into<Value>) -> Self {
        self.positional.insert(0, value.into());
        self
    }

    /// Splits off the first positional argument.
    pub fn split_first(mut self) -> (Option<Value>, Args) {
        if self.positional.is_empty() {
            (None, self)
        } else {
            let first = self.positional.remove(0);
            (Some(first), self)
        }
    }

    pub fn format(&self, indent: usize) -> String {
        format_call(
            indent,
            self.positional.iter().map(Value::repr),
            self.keywords
                .iter()
                .map(|(key, value)| (key.as_str(), value.repr())),
        )
    }
}

impl Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = self.positional.iter().map(Value::repr).collect();
        parts.extend(
            self.keywords
                .iter()
                .map(|(key, value)| format!("{key}={}", value.repr())),
        );
        write!(f, "({})", parts.join(", "))
    }
}

impl From<Vec<Value>> for Args {
    fn from(positional: Vec<Value>) -> Self {
        Self {
            positional,
            keywords: BTreeMap::new(),
        }
    }
}

/// Renders a call the way diagnostics show it: a tuple of positional
/// arguments followed by a block of keyword arguments.
pub(crate) fn format_call<'a>(
    indent: usize,
    positional: impl Iterator<Item = String>,
    keywords: impl Iterator<Item = (&'a str, String)>,
) -> String {
    let indentation = "  ".repeat(indent);
    let positional: Vec<String> = positional.collect();
    let tuple = if positional.len() == 1 {
        format!("({},)", positional[0])
    } else {
        format!("({})", positional.join(", "))
    };
    let mut out = format!("{indentation}{tuple}\n{indentation}{{");
    let mut keywords = keywords.peekable();
    if keywords.peek().is_some() {
        out.push('\n');
        for (key, value) in keywords {
            let _ = writeln!(out, "{indentation}  {key}={value},");
        }
        out.push_str(&indentation);
    }
    out.push_str("}\n");
    out
}

/// Builds [`Args`]: positional values, then keyword values after a `;`.
///
/// ```
/// let args = patchwork::args!("first", 2; flag = true);
/// assert_eq!(args.positional().len(), 2);
/// assert_eq!(args.keyword("flag"), Some(&patchwork::Value::Bool(true)));
/// ```
#[macro_export]
macro_rules! args {
    ($($arg:expr),* $(,)? $(; $($key:ident = $value:expr),* $(,)?)?) => {{
        #[allow(unused_mut)]
        let mut args = $crate::Args::new();
        $(args.push($arg);)*
        $($(args.insert(stringify!($key), $value);)*)?
        args
    }};
}

/// Opt-in `Serialize` for values and arguments. Reference variants are
/// written as their repr.
#[cfg(feature = "serde")]
mod serialize {
    use serde::ser::{SerializeMap, SerializeSeq, SerializeStruct};
    use serde::{Serialize, Serializer};

    use super::{Args, Value};

    impl Serialize for Value {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            match self {
                Value::None => serializer.serialize_unit(),
                Value::Bool(value) => serializer.serialize_bool(*value),
                Value::Int(value) => serializer.serialize_i64(*value),
                Value::Float(value) => serializer.serialize_f64(*value),
                Value::Str(value) => serializer.serialize_str(value),
                Value::Tuple(items) | Value::List(items) => {
                    let mut seq = serializer.serialize_seq(Some(items.len()))?;
                    for item in items {
                        seq.serialize_element(item)?;
                    }
                    seq.end()
                }
                Value::Dict(entries) => {
                    let mut map = serializer.serialize_map(Some(entries.len()))?;
                    for (key, value) in entries {
                        map.serialize_entry(key, value)?;
                    }
                    map.end()
                }
                other => serializer.serialize_str(&other.repr()),
            }
        }
    }

    impl Serialize for Args {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut state = serializer.serialize_struct("Args", 2)?;
            state.serialize_field("args", &self.positional)?;
            state.serialize_field("kwargs", &self.keywords)?;
            state.end()
        }
    }
}
