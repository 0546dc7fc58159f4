use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Mutex;
use tracing::{debug, error, warn};

use crate::assertion::Assertions;
use crate::mock::OrderRecord;
use crate::mocks::Mocks;
use crate::{Error, Result, Runtime};

/// Options accepted by the `*_with` variants of the session's mocking
/// operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockOptions {
    /// Permits names with a leading underscore.
    pub allow_private: bool,
    /// Validates calls against the original signature.
    pub type_validation: bool,
    /// Lets `mock_async_callable` mock a plain function that returns a
    /// coroutine.
    pub callable_returns_coroutine: bool,
}

impl Default for MockOptions {
    fn default() -> Self {
        Self {
            allow_private: false,
            type_validation: true,
            callable_returns_coroutine: false,
        }
    }
}

impl MockOptions {
    pub fn allow_private(mut self) -> Self {
        self.allow_private = true;
        self
    }

    pub fn without_type_validation(mut self) -> Self {
        self.type_validation = false;
        self
    }

    pub fn callable_returns_coroutine(mut self) -> Self {
        self.callable_returns_coroutine = true;
        self
    }
}

#[derive(Default)]
pub(crate) struct SessionState {
    active: bool,
    pub mocks: Mocks,
    assertions: Assertions,
}

struct SessionInner {
    runtime: Runtime,
    state: Mutex<SessionState>,
    order: Arc<OrderRecord>,
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        if state.active {
            warn!("session dropped while active; reversing its patches");
            state.mocks.reverse_all();
        }
    }
}

/// The lifecycle of one test: everything mocked through a session is
/// verified and undone by [`Session::finish`].
#[derive(Clone)]
pub struct Session(Arc<SessionInner>);

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// A session resolving dotted paths against [`Runtime::global`].
    pub fn new() -> Self {
        Self::with_runtime(Runtime::global())
    }

    pub fn with_runtime(runtime: Runtime) -> Self {
        Self(Arc::new(SessionInner {
            runtime,
            state: Mutex::new(SessionState::default()),
            order: Default::default(),
        }))
    }

    pub fn runtime(&self) -> &Runtime {
        &self.0.runtime
    }

    pub fn is_active(&self) -> bool {
        self.0.state.lock().active
    }

    pub fn start(&self) -> Result<()> {
        let mut state = self.0.state.lock();
        if state.active {
            return Err(Error::SessionAlreadyActive);
        }
        state.active = true;
        state.assertions.clear();
        self.0.order.clear();
        debug!("session started");
        Ok(())
    }

    /// Evaluates every deferred assertion, then reverses every
    /// interception even when assertions failed. All failures are
    /// reported together.
    pub fn finish(&self) -> Result<()> {
        let mut state = {
            let mut state = self.0.state.lock();
            if !state.active {
                return Err(Error::InactiveSession);
            }
            std::mem::take(&mut *state)
        };
        let mut failures = state.assertions.evaluate();
        failures.extend(state.mocks.reverse_all());
        self.0.order.clear();
        debug!(failures = failures.len(), "session finished");
        Error::collect(failures)
    }

    pub(crate) fn ensure_active(&self) -> Result<()> {
        match self.is_active() {
            true => Ok(()),
            false => Err(Error::InactiveSession),
        }
    }

    pub(crate) fn order(&self) -> &Arc<OrderRecord> {
        &self.0.order
    }

    /// Runs `f` with the registry of an active session.
    pub(crate) fn with_state<R>(&self, f: impl FnOnce(&mut SessionState) -> Result<R>) -> Result<R> {
        let mut state = self.0.state.lock();
        if !state.active {
            return Err(Error::InactiveSession);
        }
        f(&mut state)
    }

    pub(crate) fn register_assertion(
        &self,
        check: impl FnOnce() -> Result<()> + Send + 'static,
    ) -> Result<()> {
        self.with_state(|state| {
            state.assertions.register(check);
            Ok(())
        })
    }
}

fn session(runtime: Option<Runtime>) -> Session {
    let session = match runtime {
        Some(runtime) => Session::with_runtime(runtime),
        None => Session::new(),
    };
    if let Err(error) = session.start() {
        panic!("{error}");
    }
    session
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "test panicked".to_string()
    }
}

fn report(outcome: std::thread::Result<()>, verification: Result<()>) {
    match (outcome, verification) {
        (Ok(()), Ok(())) => {}
        (Ok(()), Err(error)) => panic!("{error}"),
        (Err(payload), Ok(())) => panic::resume_unwind(payload),
        (Err(payload), Err(verification)) => {
            let message = panic_message(payload.as_ref());
            error!(%verification, "test failed and its mocks did not verify either");
            panic!("{message}\n\nAfter the test failed, verification failed as well:\n{verification}");
        }
    }
}

#[doc(hidden)]
pub fn __run_test(runtime: Option<Runtime>, body: impl FnOnce(Session)) {
    let session = session(runtime);
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| body(session.clone())));
    report(outcome, session.finish());
}

#[doc(hidden)]
pub async fn __run_async_test<F, Fut>(runtime: Option<Runtime>, body: F)
where
    F: FnOnce(Session) -> Fut,
    Fut: Future<Output = ()>,
{
    let session = session(runtime);
    let outcome = AssertUnwindSafe(body(session.clone()))
        .catch_unwind()
        .await;
    report(outcome, session.finish());
}
