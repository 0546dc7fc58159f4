use patchwork::{Attributes, Error, Module, Session, Value};

use crate::sample::{self, getcwd_of};

#[patchwork::test(runtime(crate::sample::runtime))]
#[test]
#[should_panic(expected = "received: 0 call(s)")]
fn unmet_assertion_fails_the_test(session: Session) {
    session
        .mock_callable("os", "getcwd")
        .unwrap()
        .to_return_value("/mocked")
        .unwrap()
        .and_assert_called()
        .unwrap();
}

#[patchwork::test(runtime(crate::sample::runtime))]
#[test]
#[should_panic(expected = "verification failed as well")]
fn body_and_verification_failures_together(session: Session) {
    session
        .mock_callable("os", "getcwd")
        .unwrap()
        .to_return_value("/mocked")
        .unwrap()
        .and_assert_called_twice()
        .unwrap();
    assert_eq!(getcwd_of(&session), Value::from("/elsewhere"));
}

#[test]
fn reversal_continues_past_a_failure() {
    let runtime = sample::runtime();
    let modules: Vec<Module> = ["first", "second", "third"]
        .into_iter()
        .map(|name| runtime.register(Module::new(name).with("attribute", name)))
        .collect();
    let session = Session::with_runtime(runtime);
    session.start().unwrap();
    for module in &modules {
        session.patch_attribute(module, "attribute", "patched").unwrap();
    }
    modules[1].set_frozen(true);

    let error = session.finish().unwrap_err();
    assert!(matches!(
        &error,
        Error::Unpatch { target, attribute, .. }
            if target == "<module 'second'>" && attribute == "attribute"
    ));
    assert_eq!(modules[0].get_attr("attribute").unwrap(), Value::from("first"));
    assert_eq!(modules[1].get_attr("attribute").unwrap(), Value::from("patched"));
    assert_eq!(modules[2].get_attr("attribute").unwrap(), Value::from("third"));
    assert!(!session.is_active());
}

#[test]
fn every_failure_is_reported() {
    let runtime = sample::runtime();
    let frozen = runtime.register(Module::new("frozen").with("attribute", 1));
    let session = Session::with_runtime(runtime);
    session.start().unwrap();
    session.patch_attribute(&frozen, "attribute", 2).unwrap();
    session
        .mock_callable("os", "getcwd")
        .unwrap()
        .to_return_value("/mocked")
        .unwrap()
        .and_assert_called_once()
        .unwrap();
    session
        .mock_callable("sample_module", "other_function")
        .unwrap()
        .to_return_value("mocked")
        .unwrap()
        .and_assert_called_once()
        .unwrap();
    frozen.set_frozen(true);

    let error = session.finish().unwrap_err();
    let failures = error.failures();
    assert_eq!(failures.len(), 3);
    assert!(matches!(failures[0], Error::Assertion(message) if message.contains("'getcwd'")));
    assert!(matches!(failures[1], Error::Assertion(message) if message.contains("'other_function'")));
    assert!(matches!(failures[2], Error::Unpatch { .. }));
    assert_eq!(getcwd_of(&session), Value::from("/original/cwd"));
}

#[test]
fn configuration_after_finish_is_refused() {
    let session = Session::with_runtime(sample::runtime());
    session.start().unwrap();
    let locator = session.mock_callable("os", "getcwd").unwrap();
    session.finish().unwrap();
    assert!(matches!(
        locator.to_return_value("/mocked"),
        Err(Error::InactiveSession)
    ));
    assert!(matches!(
        session.mock_callable("os", "getcwd"),
        Err(Error::InactiveSession)
    ));
}

#[test]
fn restart_starts_clean() {
    let session = Session::with_runtime(sample::runtime());
    session.start().unwrap();
    session
        .mock_callable("os", "getcwd")
        .unwrap()
        .to_return_value("/mocked")
        .unwrap()
        .and_assert_called_once()
        .unwrap();
    assert!(session.finish().is_err());
    session.start().unwrap();
    assert_eq!(getcwd_of(&session), Value::from("/original/cwd"));
    session.finish().unwrap();
}
