use patchwork::{args, Attributes, Error, Session, Value};

use crate::sample::{self, call};

fn attribute(session: &Session) -> Value {
    session.runtime().resolve("sample_module.attribute").unwrap()
}

#[patchwork::test(runtime(crate::sample::runtime))]
#[test]
fn patched_for_the_test(session: Session) {
    session
        .patch_attribute("sample_module", "attribute", "patched")
        .unwrap();
    assert_eq!(attribute(&session), Value::from("patched"));
}

#[test]
fn repatching_restores_the_first_value() {
    let session = Session::with_runtime(sample::runtime());
    session.start().unwrap();
    session
        .patch_attribute("sample_module", "attribute", "first")
        .unwrap();
    session
        .patch_attribute("sample_module", "attribute", "second")
        .unwrap();
    assert_eq!(attribute(&session), Value::from("second"));
    session.finish().unwrap();
    assert_eq!(attribute(&session), Value::from("original"));
}

#[test]
fn instance_attributes_and_properties() {
    let session = Session::with_runtime(sample::runtime());
    session.start().unwrap();
    let object = call(&session, "sample_module.Target", args!("hello")).unwrap();
    session.patch_attribute(&object, "message", "patched").unwrap();
    session.patch_attribute(&object, "prop", "patched property").unwrap();
    assert_eq!(object.get_attr("message").unwrap(), Value::from("patched"));
    assert_eq!(object.get_attr("prop").unwrap(), Value::from("patched property"));
    session.finish().unwrap();
    assert_eq!(object.get_attr("message").unwrap(), Value::from("hello"));
    assert_eq!(object.get_attr("prop").unwrap(), Value::from("property"));
}

#[test]
fn callables_and_classes_are_refused() {
    let session = Session::with_runtime(sample::runtime());
    session.start().unwrap();
    assert!(matches!(
        session.patch_attribute("sample_module", "test_function", 1),
        Err(Error::Usage(message)) if message.contains("mock_callable()")
    ));
    assert!(matches!(
        session.patch_attribute("sample_module", "Target", 1),
        Err(Error::Usage(message)) if message.contains("mock_constructor()")
    ));
    assert!(matches!(
        session.patch_attribute("sample_module", "missing", 1),
        Err(Error::AttributeNotFound { .. })
    ));
}
