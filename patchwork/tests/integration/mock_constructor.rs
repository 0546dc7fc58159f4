use pretty_assertions::assert_eq;

use patchwork::{args, call, Attributes, Error, Function, Session, StrictMock, Value};

use crate::sample::{self, call};

fn session() -> Session {
    let session = Session::with_runtime(sample::runtime());
    session.start().unwrap();
    session
}

fn construct(session: &Session, message: &str) -> patchwork::Result<Value> {
    call(session, "sample_module.Target", args!(message))
}

#[test]
fn returns_a_stand_in() {
    let session = session();
    let original = session.runtime().resolve("sample_module.Target").unwrap();
    let stand_in = StrictMock::with_template(original.as_class().unwrap());
    session
        .mock_constructor("sample_module", "Target")
        .unwrap()
        .for_call(call!("hello"))
        .to_return_value(&stand_in)
        .unwrap()
        .and_assert_called_once()
        .unwrap();
    assert!(construct(&session, "hello").unwrap().is_same(&Value::from(&stand_in)));
    session.finish().unwrap();

    session.start().unwrap();
    let restored = session.runtime().resolve("sample_module.Target").unwrap();
    assert!(restored.is_same(&original));
    let object = construct(&session, "after").unwrap();
    assert_eq!(object.get_attr("message").unwrap(), Value::from("after"));
}

#[test]
fn original_runs_the_initializer_once() {
    let session = session();
    session
        .mock_constructor("sample_module", "Target")
        .unwrap()
        .to_call_original()
        .unwrap();
    let object = construct(&session, "hello").unwrap();
    assert_eq!(object.get_attr("message").unwrap(), Value::from("hello"));
    assert_eq!(object.get_attr("inits").unwrap(), Value::Int(1));
    assert_eq!(
        object
            .get_attr("instance_method")
            .unwrap()
            .call(args!("a", "b"))
            .unwrap(),
        Value::from("original: a_b")
    );
}

#[test]
fn wrapper_rewrites_the_arguments() {
    let session = session();
    session
        .mock_constructor("sample_module", "Target")
        .unwrap()
        .with_wrapper(Function::new("wrapper", |args| {
            let (original, args) = args.split_first();
            let message = args.get(0).and_then(Value::as_str).unwrap_or_default();
            original
                .unwrap()
                .call(args!(format!("wrapped {message}")))
        }))
        .unwrap();
    let object = construct(&session, "hello").unwrap();
    assert_eq!(object.get_attr("message").unwrap(), Value::from("wrapped hello"));
    assert_eq!(object.get_attr("inits").unwrap(), Value::Int(1));
}

#[test]
fn implementation_does_not_see_the_class() {
    let session = session();
    session
        .mock_constructor("sample_module", "Target")
        .unwrap()
        .with_implementation(Function::new("implementation", |args| {
            Ok(Value::Int(args.len() as i64))
        }))
        .unwrap();
    assert_eq!(construct(&session, "hello").unwrap(), Value::Int(1));
}

#[test]
fn arguments_are_checked_against_the_initializer() {
    let session = session();
    session
        .mock_constructor("sample_module", "Target")
        .unwrap()
        .to_return_value(Value::None)
        .unwrap();
    assert!(matches!(
        call(&session, "sample_module.Target", args!(1)),
        Err(Error::TypeCheck(_))
    ));
    assert!(matches!(
        call(&session, "sample_module.Target", args!("a", "b")),
        Err(Error::SignatureMismatch(_))
    ));
}

#[test]
fn stale_references_are_guarded() {
    let session = session();
    let original = session.runtime().resolve("sample_module.Target").unwrap();
    session
        .mock_constructor("sample_module", "Target")
        .unwrap()
        .to_return_value(Value::None)
        .unwrap();
    let error = original.get_attr("CLASS_ATTR").unwrap_err();
    assert!(matches!(
        &error,
        Error::AttributeAccessBlocked { class, attribute }
            if class == "sample_module.Target" && attribute == "CLASS_ATTR"
    ));
    assert!(matches!(
        original.call(args!("hello")),
        Err(Error::AttributeAccessBlocked { .. })
    ));
    let mocked = session.runtime().resolve("sample_module.Target").unwrap();
    assert_eq!(mocked.get_attr("CLASS_ATTR").unwrap(), Value::from("class_attr"));
    session.finish().unwrap();
    assert_eq!(original.get_attr("CLASS_ATTR").unwrap(), Value::from("class_attr"));
}

#[test]
fn live_instances_prevent_mocking() {
    let session = session();
    let object = construct(&session, "alive").unwrap();
    assert!(matches!(
        session.mock_constructor("sample_module", "Target"),
        Err(Error::LiveInstances { count: 1, .. })
    ));
    drop(object);
    session
        .mock_constructor("sample_module", "Target")
        .unwrap()
        .to_return_value(Value::None)
        .unwrap();
}

#[test]
fn class_changed_after_mocking() {
    let session = session();
    session
        .mock_constructor("sample_module", "Target")
        .unwrap()
        .to_return_value(Value::None)
        .unwrap();
    let module = session.runtime().import("sample_module").unwrap();
    module.set_attr("Target", Value::None).unwrap();
    assert!(matches!(
        session.mock_constructor("sample_module", "Target"),
        Err(Error::ClassChanged { .. })
    ));
}

#[test]
fn only_classes() {
    let session = session();
    assert!(matches!(
        session.mock_constructor("sample_module", "test_function"),
        Err(Error::Usage(_))
    ));
}
