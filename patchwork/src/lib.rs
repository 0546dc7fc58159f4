mod assertion;
mod callable;
mod constructor;
mod error;
mod mock;
mod mock_key;
mod mock_locator;
mod mocks;
mod patch;
mod patch_attribute;
mod rule;
mod runtime;
mod session;
mod strict_mock;
mod target;

pub use error::{Error, Result};
pub use mock_locator::*;
pub use patchwork_macros::test;
pub use rule::{Behavior, CallScope, IntoMatcher, Matcher};
pub use runtime::*;
pub use session::{MockOptions, Session};
#[doc(hidden)]
pub use session::{__run_async_test, __run_test};
pub use strict_mock::StrictMock;
pub use target::{IntoTarget, Target};
pub use Matcher::Any;
