use std::fmt::{self, Display};
use std::sync::Arc;

/// The type of an exception. Calling it with no arguments instantiates it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ExceptionType(Arc<str>);

impl ExceptionType {
    pub fn new(name: &str) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn instantiate(&self) -> Exception {
        Exception::new(self.clone(), "")
    }

    pub fn with_message(&self, message: impl Into<String>) -> Exception {
        Exception::new(self.clone(), message)
    }
}

impl From<&str> for ExceptionType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// An exception instance.
#[derive(Clone, Debug, PartialEq)]
pub struct Exception {
    kind: ExceptionType,
    message: String,
}

impl Exception {
    pub fn new(kind: impl Into<ExceptionType>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> &ExceptionType {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is(&self, kind: &str) -> bool {
        self.kind.name() == kind
    }

    pub fn repr(&self) -> String {
        format!("{}('{}')", self.kind.name(), self.message)
    }
}

impl Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            f.write_str(self.kind.name())
        } else {
            write!(f, "{}: {}", self.kind.name(), self.message)
        }
    }
}
