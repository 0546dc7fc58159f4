use std::fmt::{self, Debug};
use std::future::{Future, IntoFuture};
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;

use crate::{Args, Error, Result, Signature, Value};

type SyncBody = dyn Fn(Args) -> Result<Value> + Send + Sync;
type AsyncBody = dyn Fn(Args) -> BoxFuture<'static, Result<Value>> + Send + Sync;

#[derive(Clone)]
enum Body {
    Sync(Arc<SyncBody>),
    Async(Arc<AsyncBody>),
}

#[derive(Clone)]
struct FunctionInner {
    name: String,
    body: Body,
    signature: Option<Signature>,
}

/// A named native callable.
#[derive(Clone)]
pub struct Function(Arc<FunctionInner>);

impl Function {
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(Args) -> Result<Value> + Send + Sync + 'static,
    {
        Self(Arc::new(FunctionInner {
            name: name.into(),
            body: Body::Sync(Arc::new(body)),
            signature: None,
        }))
    }

    /// An `async` function: calling it returns a [`Coroutine`].
    pub fn new_async<F, Fut>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        Self(Arc::new(FunctionInner {
            name: name.into(),
            body: Body::Async(Arc::new(move |args| body(args).boxed())),
            signature: None,
        }))
    }

    /// Returns a new function with the same body and the given signature.
    pub fn with_signature(self, signature: Signature) -> Self {
        let mut inner = (*self.0).clone();
        inner.signature = Some(signature);
        Self(Arc::new(inner))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn signature(&self) -> Option<&Signature> {
        self.0.signature.as_ref()
    }

    pub fn is_async(&self) -> bool {
        matches!(self.0.body, Body::Async(_))
    }

    pub fn call(&self, args: Args) -> Result<Value> {
        match &self.0.body {
            Body::Sync(body) => body(args),
            Body::Async(body) => Ok(Value::Coroutine(Coroutine::from_boxed(
                &self.0.name,
                body(args),
            ))),
        }
    }

    pub fn ptr_eq(&self, other: &Function) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }
}

impl Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<function {}>", self.0.name)
    }
}

/// A function bound to a receiver, which is passed as the first argument.
#[derive(Clone)]
pub struct BoundMethod {
    receiver: Box<Value>,
    function: Function,
}

impl BoundMethod {
    pub fn new(receiver: Value, function: Function) -> Self {
        Self {
            receiver: Box::new(receiver),
            function,
        }
    }

    pub fn receiver(&self) -> &Value {
        &self.receiver
    }

    pub fn function(&self) -> &Function {
        &self.function
    }

    pub fn call(&self, args: Args) -> Result<Value> {
        self.function.call(args.prepend((*self.receiver).clone()))
    }
}

impl PartialEq for BoundMethod {
    fn eq(&self, other: &Self) -> bool {
        self.function.ptr_eq(&other.function) && self.receiver.is_same(&other.receiver)
    }
}

impl Debug for BoundMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<bound method {} of {}>",
            self.function.name(),
            self.receiver.repr()
        )
    }
}

struct CoroutineInner {
    name: String,
    future: Mutex<Option<BoxFuture<'static, Result<Value>>>>,
}

/// The awaitable produced by calling an `async` function. It can be awaited
/// once.
#[derive(Clone)]
pub struct Coroutine(Arc<CoroutineInner>);

impl Coroutine {
    pub fn new<Fut>(name: impl Into<String>, future: Fut) -> Self
    where
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        Self::from_boxed(&name.into(), future.boxed())
    }

    fn from_boxed(name: &str, future: BoxFuture<'static, Result<Value>>) -> Self {
        Self(Arc::new(CoroutineInner {
            name: name.to_string(),
            future: Mutex::new(Some(future)),
        }))
    }

    pub fn is_awaited(&self) -> bool {
        self.0.future.lock().is_none()
    }

    pub fn ptr_eq(&self, other: &Coroutine) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl IntoFuture for Coroutine {
    type Output = Result<Value>;
    type IntoFuture = BoxFuture<'static, Result<Value>>;

    fn into_future(self) -> Self::IntoFuture {
        let future = self.0.future.lock().take();
        match future {
            Some(future) => future,
            None => async { Err(Error::AlreadyAwaited) }.boxed(),
        }
    }
}

impl Debug for Coroutine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<coroutine object {}>", self.0.name)
    }
}

struct IterState {
    values: Vec<Value>,
    index: usize,
}

/// An iterator over a fixed sequence with its own cursor.
#[derive(Clone)]
pub struct ValueIter(Arc<Mutex<IterState>>);

impl ValueIter {
    pub fn new(values: Vec<Value>) -> Self {
        Self(Arc::new(Mutex::new(IterState { values, index: 0 })))
    }

    pub fn ptr_eq(&self, other: &ValueIter) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Iterator for ValueIter {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        let mut state = self.0.lock();
        let value = state.values.get(state.index).cloned();
        if value.is_some() {
            state.index += 1;
        }
        value
    }
}
