use std::fmt::Write as _;

use crate::Exception;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Every failure the engine and its object model can produce.
///
/// Variants fall into four groups: errors of the object model itself
/// (attribute lookups, calls, signatures), configuration-time usage errors
/// raised synchronously by the configuration handle, call-time errors raised
/// by an installed mock, and end-of-test failures (deferred assertions and
/// reversals).
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// An exception raised by code running inside the object model.
    #[error("{0}")]
    Raised(Exception),

    #[error("{target} has no attribute '{attribute}'")]
    AttributeNotFound { target: String, attribute: String },

    #[error("No module named '{0}'")]
    ModuleNotFound(String),

    #[error("{0} is not callable")]
    NotCallable(String),

    #[error("can not set or delete '{attribute}': {target} is frozen")]
    Frozen { target: String, attribute: String },

    #[error("Cannot create a consistent method resolution order for class {0}")]
    InconsistentMro(String),

    #[error("cannot reuse already awaited coroutine")]
    AlreadyAwaited,

    #[error("{0}")]
    SignatureMismatch(String),

    #[error("{0}")]
    TypeCheck(String),

    #[error(
        "Attribute '{attribute}' of {class} is not accessible after the class \
         has been used with mock_constructor().\n\
         Get a fresh reference to the mocked class from its module instead."
    )]
    AttributeAccessBlocked { class: String, attribute: String },

    #[error(
        "'{attribute}' is not set.\n\
         {mock} must have a value set for this attribute if it is going to be accessed."
    )]
    UndefinedAttribute { mock: String, attribute: String },

    #[error(
        "'{attribute}' is not part of the API.\n\
         {mock} template class does not have this attribute so the mock can not have it as well."
    )]
    NonExistentAttribute { mock: String, attribute: String },

    #[error(
        "'{attribute}' can not be set with a non-callable value.\n\
         {mock} template class requires this attribute to be callable."
    )]
    NonCallableValue { mock: String, attribute: String },

    #[error(
        "It's disencouraged to patch/mock private interfaces ('{0}').\n\
         This would result in way too coupled tests and implementation. \
         Please consider using patterns like dependency injection instead. \
         If you really need to do this use the allow_private option."
    )]
    PrivateAttribute(String),

    #[error("mock_callable() can only be used with callable attributes and {value} ('{attribute}' of {target}) is not.")]
    AttributeNotCallable {
        target: String,
        attribute: String,
        value: String,
    },

    #[error(
        "Patching an instance method at the class is not supported: '{attribute}' of {class}.\n\
         The patch would not be scoped to an instance and assertions on calls would be ambiguous. \
         Patch the attribute at the instance instead."
    )]
    InstanceMethodAtClass { class: String, attribute: String },

    #[error("{0}")]
    NotImplemented(String),

    #[error("Can not {0} original callable that does not exist.")]
    NoOriginal(&'static str),

    #[error(
        "Can't define more than one behavior using the same mock_callable() chain. \
         Please call mock_callable() again one time for each new behavior."
    )]
    BehaviorAlreadyDefined,

    #[error(
        "You must first define a behavior. Eg: \
         mock_callable(target, \"func\").to_return_value(value).and_assert_called_exactly(times)"
    )]
    BehaviorNotDefined,

    #[error("times must be >= 1")]
    InvalidTimes,

    #[error("{0}")]
    Usage(String),

    #[error(
        "mock_constructor() was already used with {class} at {other_target}; \
         the same class can not be mocked from {target} as well"
    )]
    ConstructorAlreadyMocked {
        class: String,
        target: String,
        other_target: String,
    },

    #[error("The class {class_name} at {target} was changed after mock_constructor() mocked it!")]
    ClassChanged { target: String, class_name: String },

    #[error("mock_constructor() can not be used after instances of {class} were created: {count} live instance(s)")]
    LiveInstances { class: String, count: usize },

    #[error("the session is not active")]
    InactiveSession,

    #[error("the session is already active")]
    SessionAlreadyActive,

    /// No behavior was configured for the received call.
    #[error("{0}")]
    UndefinedBehaviorForCall(String),

    /// The values of `to_return_values` ran out. Another undefined-behavior
    /// failure: the call has nothing left to answer with.
    #[error("No more values to return!")]
    NoMoreValues,

    /// Behaviors scoped to specific arguments exist but none matches.
    #[error("{0}")]
    UnexpectedCallArguments(String),

    /// A call exceeded the ceiling set by `and_assert_not_called` or
    /// `and_assert_called_at_most`.
    #[error("{0}")]
    UnexpectedCallReceived(String),

    #[error("{0}")]
    NotACoroutine(String),

    /// A deferred assertion failed at the end of the test.
    #[error("{0}")]
    Assertion(String),

    #[error("failed to restore '{attribute}' of {target}: {source}")]
    Unpatch {
        target: String,
        attribute: String,
        #[source]
        source: Box<Error>,
    },

    #[error("{}", format_aggregate(.0))]
    Aggregate(Vec<Error>),
}

impl Error {
    /// Turns a list of collected failures into a single result: nothing
    /// failed, exactly one failure surfaced as itself, or several wrapped
    /// in [`Error::Aggregate`].
    pub fn collect(mut errors: Vec<Error>) -> Result<()> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(Error::Aggregate(errors)),
        }
    }

    /// Flattens aggregates so every leaf failure is listed once.
    pub fn failures(&self) -> Vec<&Error> {
        match self {
            Error::Aggregate(errors) => errors.iter().flat_map(Error::failures).collect(),
            other => vec![other],
        }
    }

    /// Returns the raised exception if this error carries one.
    pub fn exception(&self) -> Option<&Exception> {
        match self {
            Error::Raised(exception) => Some(exception),
            _ => None,
        }
    }
}

impl From<Exception> for Error {
    fn from(exception: Exception) -> Self {
        Error::Raised(exception)
    }
}

fn format_aggregate(errors: &[Error]) -> String {
    let mut out = format!("{} failures:", errors.len());
    for (index, error) in errors.iter().enumerate() {
        let _ = write!(out, "\n\n{}) {}", index + 1, error);
    }
    out
}
