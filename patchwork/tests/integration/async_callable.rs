use patchwork::{args, Error, Function, Session, Value};

use crate::sample::call;

async fn async_test_function(session: &Session, arg: &str) -> patchwork::Result<Value> {
    call(session, "sample_module.async_test_function", args!(arg))?
        .awaited()
        .await
}

#[patchwork::test(runtime(crate::sample::runtime))]
#[async_std::test]
async fn return_value(session: Session) {
    session
        .mock_async_callable("sample_module", "async_test_function")
        .unwrap()
        .to_return_value("mocked")
        .unwrap()
        .and_assert_called_once()
        .unwrap();
    assert_eq!(
        async_test_function(&session, "a").await.unwrap(),
        Value::from("mocked")
    );
}

#[patchwork::test(runtime(crate::sample::runtime))]
#[async_std::test]
async fn call_original(session: Session) {
    session
        .mock_async_callable("sample_module", "async_test_function")
        .unwrap()
        .to_call_original()
        .unwrap();
    assert_eq!(
        async_test_function(&session, "a").await.unwrap(),
        Value::from("async a")
    );
}

#[patchwork::test(runtime(crate::sample::runtime))]
#[async_std::test]
async fn async_implementation(session: Session) {
    session
        .mock_async_callable("sample_module", "async_test_function")
        .unwrap()
        .with_implementation(Function::new_async("implementation", |args| async move {
            Ok(Value::from(format!("implemented {}", args.len())))
        }))
        .unwrap();
    assert_eq!(
        async_test_function(&session, "a").await.unwrap(),
        Value::from("implemented 1")
    );
}

#[patchwork::test(runtime(crate::sample::runtime))]
#[async_std::test]
async fn sync_implementation_is_not_awaitable(session: Session) {
    session
        .mock_async_callable("sample_module", "async_test_function")
        .unwrap()
        .with_implementation(Function::new("implementation", |_| Ok(Value::None)))
        .unwrap();
    assert!(matches!(
        async_test_function(&session, "a").await,
        Err(Error::NotACoroutine(_))
    ));
}

#[patchwork::test(runtime(crate::sample::runtime))]
#[async_std::test]
async fn raise(session: Session) {
    session
        .mock_async_callable("sample_module", "async_test_function")
        .unwrap()
        .to_raise(patchwork::ExceptionType::new("RuntimeError").with_message("boom"))
        .unwrap();
    let error = async_test_function(&session, "a").await.unwrap_err();
    assert_eq!(error.to_string(), "RuntimeError: boom");
}

#[patchwork::test(runtime(crate::sample::runtime))]
#[test]
fn flavors_must_match(session: Session) {
    assert!(matches!(
        session.mock_callable("sample_module", "async_test_function"),
        Err(Error::Usage(_))
    ));
    assert!(matches!(
        session.mock_async_callable("sample_module", "test_function"),
        Err(Error::Usage(_))
    ));
}
