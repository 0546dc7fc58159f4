use patchwork::{args, Attributes, Error, Session, StrictMock, Value};

use crate::sample;

fn template(session: &Session) -> patchwork::Class {
    session
        .runtime()
        .resolve("sample_module.Target")
        .unwrap()
        .as_class()
        .unwrap()
        .clone()
}

#[patchwork::test(runtime(crate::sample::runtime))]
#[test]
fn template_methods(session: Session) {
    let mock = StrictMock::with_template(&template(&session));
    session
        .mock_callable(&mock, "instance_method")
        .unwrap()
        .for_call(patchwork::call!("a", "b"))
        .to_return_value("mocked")
        .unwrap()
        .and_assert_called_once()
        .unwrap();
    let method = mock.get_attr("instance_method").unwrap();
    assert_eq!(method.call(args!("a", "b")).unwrap(), Value::from("mocked"));
    assert!(matches!(
        method.call(args!("a", 1)),
        Err(Error::TypeCheck(_))
    ));
}

#[test]
fn unset_and_unknown_attributes() {
    let session = Session::with_runtime(sample::runtime());
    session.start().unwrap();
    let mock = StrictMock::with_template(&template(&session)).named("target");
    assert!(matches!(
        mock.get_attr("instance_method"),
        Err(Error::UndefinedAttribute { .. })
    ));
    assert!(matches!(
        session.mock_callable(&mock, "missing"),
        Err(Error::NonExistentAttribute { .. })
    ));
    assert!(matches!(
        session.mock_callable(&mock, "CLASS_ATTR"),
        Err(Error::AttributeNotCallable { .. })
    ));
    session.patch_attribute(&mock, "CLASS_ATTR", "patched").unwrap();
    assert_eq!(mock.get_attr("CLASS_ATTR").unwrap(), Value::from("patched"));
    session.finish().unwrap();
    assert!(matches!(
        mock.get_attr("CLASS_ATTR"),
        Err(Error::UndefinedAttribute { .. })
    ));
}

#[test]
fn return_type_rejects_a_strict_mock_of_another_type() {
    let session = Session::with_runtime(sample::runtime());
    session.start().unwrap();
    let mock = StrictMock::with_template(&template(&session));
    session
        .mock_callable("sample_module", "test_function")
        .unwrap()
        .with_implementation(patchwork::Function::new("implementation", {
            let mock = mock.clone();
            move |_| Ok(Value::from(&mock))
        }))
        .unwrap();
    let returned = session
        .runtime()
        .resolve("sample_module.test_function")
        .unwrap()
        .call(args!("a", "b"));
    assert!(matches!(returned, Err(Error::TypeCheck(_))));
}
