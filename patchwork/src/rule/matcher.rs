use std::collections::BTreeMap;
use std::fmt::{self, Debug};
use std::sync::Arc;

use crate::runtime::format_call;
use crate::{Args, Class, Function, Module, Object, StrictMock, Value};

type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// An enum shows what an argument is expected to be
#[derive(Clone)]
pub enum Matcher {
    /// Equal to the value
    Eq(Value),
    /// Any value
    Any,
    AnyInt,
    AnyFloat,
    AnyStr,
    AnyList,
    AnyDict,
    InstanceOf(Class),
    /// An int within the inclusive bounds
    IntBetween(i64, i64),
    StrContaining(String),
    StrStartingWith(String),
    StrEndingWith(String),
    /// A list that has the value as one of its items
    ListContaining(Value),
    DictContainingKeys(Vec<String>),
    Not(Box<Matcher>),
    Custom {
        description: String,
        predicate: Predicate,
    },
}

impl Matcher {
    pub fn custom<F>(description: &str, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Matcher::Custom {
            description: description.to_string(),
            predicate: Arc::new(predicate),
        }
    }

    pub fn not(matcher: impl IntoMatcher) -> Self {
        Matcher::Not(Box::new(matcher.into_matcher()))
    }

    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Matcher::Eq(expected) => expected == value,
            Matcher::Any => true,
            Matcher::AnyInt => matches!(value, Value::Int(_)),
            Matcher::AnyFloat => matches!(value, Value::Float(_)),
            Matcher::AnyStr => matches!(value, Value::Str(_)),
            Matcher::AnyList => matches!(value, Value::List(_)),
            Matcher::AnyDict => matches!(value, Value::Dict(_)),
            Matcher::InstanceOf(class) => match value {
                Value::Object(object) => object.class().is_subclass_of(class),
                _ => false,
            },
            Matcher::IntBetween(low, high) => {
                matches!(value, Value::Int(int) if low <= int && int <= high)
            }
            Matcher::StrContaining(part) => {
                matches!(value, Value::Str(string) if string.contains(part.as_str()))
            }
            Matcher::StrStartingWith(prefix) => {
                matches!(value, Value::Str(string) if string.starts_with(prefix.as_str()))
            }
            Matcher::StrEndingWith(suffix) => {
                matches!(value, Value::Str(string) if string.ends_with(suffix.as_str()))
            }
            Matcher::ListContaining(item) => {
                matches!(value, Value::List(items) if items.contains(item))
            }
            Matcher::DictContainingKeys(keys) => {
                matches!(value, Value::Dict(map) if keys.iter().all(|key| map.contains_key(key)))
            }
            Matcher::Not(matcher) => !matcher.matches(value),
            Matcher::Custom { predicate, .. } => predicate(value),
        }
    }

    pub fn repr(&self) -> String {
        match self {
            Matcher::Eq(value) => value.repr(),
            Matcher::Any => "<Any>".into(),
            Matcher::AnyInt => "<AnyInt>".into(),
            Matcher::AnyFloat => "<AnyFloat>".into(),
            Matcher::AnyStr => "<AnyStr>".into(),
            Matcher::AnyList => "<AnyList>".into(),
            Matcher::AnyDict => "<AnyDict>".into(),
            Matcher::InstanceOf(class) => format!("<AnyInstanceOf({})>", class.name()),
            Matcher::IntBetween(low, high) => format!("<IntBetween({low}, {high})>"),
            Matcher::StrContaining(part) => format!("<StrContaining('{part}')>"),
            Matcher::StrStartingWith(prefix) => format!("<StrStartingWith('{prefix}')>"),
            Matcher::StrEndingWith(suffix) => format!("<StrEndingWith('{suffix}')>"),
            Matcher::ListContaining(item) => format!("<ListContaining({})>", item.repr()),
            Matcher::DictContainingKeys(keys) => format!("<DictContainingKeys({keys:?})>"),
            Matcher::Not(matcher) => format!("<Not({})>", matcher.repr()),
            Matcher::Custom { description, .. } => format!("<{description}>"),
        }
    }
}

impl Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr())
    }
}

/// Values usable where a [`Matcher`] is expected: matchers themselves, or
/// plain values compared by equality.
pub trait IntoMatcher {
    fn into_matcher(self) -> Matcher;
}

impl IntoMatcher for Matcher {
    fn into_matcher(self) -> Matcher {
        self
    }
}

macro_rules! into_matcher_by_eq {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoMatcher for $ty {
                fn into_matcher(self) -> Matcher {
                    Matcher::Eq(self.into())
                }
            }
        )*
    };
}

into_matcher_by_eq!(
    Value, &Value, bool, i32, i64, usize, f64, &str, String, (), Function, &Function, Class,
    &Class, Object, &Object, Module, &Module, StrictMock, &StrictMock,
);

impl<T: Into<Value>> IntoMatcher for Vec<T> {
    fn into_matcher(self) -> Matcher {
        Matcher::Eq(self.into())
    }
}

/// The arguments a behavior is restricted to.
#[derive(Clone, Default, Debug)]
pub struct CallScope {
    args: Vec<Matcher>,
    kwargs: BTreeMap<String, Matcher>,
    ignore_other_args: bool,
    ignore_other_kwargs: bool,
}

impl CallScope {
    /// A scope matching only calls without arguments.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arg(mut self, matcher: impl IntoMatcher) -> Self {
        self.args.push(matcher.into_matcher());
        self
    }

    pub fn kwarg(mut self, key: &str, matcher: impl IntoMatcher) -> Self {
        self.kwargs.insert(key.to_string(), matcher.into_matcher());
        self
    }

    /// Relaxes matching: with `ignore_other_args` positional arguments
    /// after the configured ones are ignored; with `ignore_other_kwargs`
    /// keyword arguments that were not configured are ignored.
    pub fn partial(mut self, ignore_other_args: bool, ignore_other_kwargs: bool) -> Self {
        self.ignore_other_args = ignore_other_args;
        self.ignore_other_kwargs = ignore_other_kwargs;
        self
    }

    /// Whether either relaxation was already chosen.
    pub(crate) fn is_partial(&self) -> bool {
        self.ignore_other_args || self.ignore_other_kwargs
    }

    pub(crate) fn prepend(&mut self, matcher: Matcher) {
        self.args.insert(0, matcher);
    }

    pub fn matches(&self, args: &Args) -> bool {
        let positional = args.positional();
        let arity_ok = if self.ignore_other_args {
            positional.len() >= self.args.len()
        } else {
            positional.len() == self.args.len()
        };
        if !arity_ok
            || !self
                .args
                .iter()
                .zip(positional)
                .all(|(matcher, value)| matcher.matches(value))
        {
            return false;
        }
        let keywords = args.keywords();
        if !self.ignore_other_kwargs && keywords.len() != self.kwargs.len() {
            return false;
        }
        self.kwargs.iter().all(|(key, matcher)| {
            keywords
                .get(key)
                .map_or(false, |value| matcher.matches(value))
        })
    }

    pub fn format(&self, indent: usize) -> String {
        format_call(
            indent,
            self.args.iter().map(Matcher::repr),
            self.kwargs
                .iter()
                .map(|(key, matcher)| (key.as_str(), matcher.repr())),
        )
    }
}

/// Builds a [`CallScope`] the way [`args!`](crate::args) builds arguments;
/// every value may also be a [`Matcher`].
#[macro_export]
macro_rules! call {
    ($($arg:expr),* $(,)? $(; $($key:ident = $value:expr),* $(,)?)?) => {{
        #[allow(unused_mut)]
        let mut scope = $crate::CallScope::new();
        $(scope = scope.arg($arg);)*
        $($(scope = scope.kwarg(stringify!($key), $value);)*)?
        scope
    }};
}
