use pretty_assertions::assert_eq;

use patchwork::{
    args, call, Any, Attributes, Error, Function, Matcher, MockOptions, Object, Session, Value,
};

use crate::sample::{self, call, getcwd_of};

fn session() -> Session {
    let session = Session::with_runtime(sample::runtime());
    session.start().unwrap();
    session
}

#[patchwork::test(runtime(crate::sample::runtime))]
#[test]
fn getcwd_called_once(session: Session) {
    session
        .mock_callable("os", "getcwd")
        .unwrap()
        .to_return_value("/mocked")
        .unwrap()
        .and_assert_called_once()
        .unwrap();
    assert_eq!(getcwd_of(&session), Value::from("/mocked"));
}

#[test]
fn getcwd_never_called() {
    let session = session();
    session
        .mock_callable("os", "getcwd")
        .unwrap()
        .to_return_value("/mocked")
        .unwrap()
        .and_assert_called_once()
        .unwrap();
    let error = session.finish().unwrap_err();
    assert_eq!(
        error.to_string(),
        "calls did not match assertion.\n<module 'os'>, 'getcwd':\n  \
         expected: called exactly 1 time(s) with any arguments   received: 0 call(s)"
    );
    session.start().unwrap();
    assert_eq!(getcwd_of(&session), Value::from("/original/cwd"));
}

#[test]
fn return_values_then_exhausted() {
    let session = session();
    session
        .mock_callable("os", "getcwd")
        .unwrap()
        .to_return_values(["/first", "/second"])
        .unwrap();
    assert_eq!(getcwd_of(&session), Value::from("/first"));
    assert_eq!(getcwd_of(&session), Value::from("/second"));
    let error = call(&session, "os.getcwd", args!()).unwrap_err();
    assert!(matches!(error, Error::NoMoreValues));
    assert_eq!(error.to_string(), "No more values to return!");
}

#[test]
fn matcher_calling_the_same_mock() {
    let session = session();
    session
        .mock_callable("sample_module", "other_function")
        .unwrap()
        .to_return_value("fallback")
        .unwrap();
    let inner = session.clone();
    let reentrant = Matcher::custom("reenters", move |_| {
        call(&inner, "sample_module.other_function", args!()).is_ok()
    });
    session
        .mock_callable("sample_module", "other_function")
        .unwrap()
        .for_call(call!(reentrant))
        .to_return_value("scoped")
        .unwrap();
    assert_eq!(
        call(&session, "sample_module.other_function", args!(1)).unwrap(),
        Value::from("scoped")
    );
    session.finish().unwrap();
}

#[test]
fn exactly_twice_with_arguments() {
    let session = session();
    session
        .mock_callable("sample_module", "test_function")
        .unwrap()
        .for_call(call!("a", "b"))
        .to_return_value("mocked")
        .unwrap()
        .and_assert_called_exactly(2)
        .unwrap();
    call(&session, "sample_module.test_function", args!("a", "b")).unwrap();
    let error = session.finish().unwrap_err();
    assert_eq!(
        error.to_string(),
        "calls did not match assertion.\n<module 'sample_module'>, 'test_function':\n  \
         expected: called exactly 2 time(s) with arguments:\n    ('a', 'b')\n    {}\n  \
         received: 1 call(s)"
    );
}

#[test]
fn newest_behavior_wins() {
    let session = session();
    session
        .mock_callable("sample_module", "test_function")
        .unwrap()
        .to_return_value("any")
        .unwrap();
    session
        .mock_callable("sample_module", "test_function")
        .unwrap()
        .for_call(call!("a", "b"))
        .to_return_value("scoped")
        .unwrap();
    let test_function = |a: &str, b: &str| {
        call(&session, "sample_module.test_function", args!(a, b)).unwrap()
    };
    assert_eq!(test_function("a", "b"), Value::from("scoped"));
    assert_eq!(test_function("x", "y"), Value::from("any"));

    session
        .mock_callable("sample_module", "test_function")
        .unwrap()
        .to_return_value("newest")
        .unwrap();
    assert_eq!(test_function("a", "b"), Value::from("newest"));
}

#[test]
fn unexpected_arguments_list_the_registered_calls() {
    let session = session();
    session
        .mock_callable("sample_module", "test_function")
        .unwrap()
        .for_call(call!("a", "b"; kwarg1 = "c"))
        .to_return_value("scoped")
        .unwrap();
    let error = call(&session, "sample_module.test_function", args!("a", "b")).unwrap_err();
    assert!(matches!(error, Error::UnexpectedCallArguments(_)));
    assert!(error
        .to_string()
        .ends_with("These are the registered calls:\n    ('a', 'b')\n    {\n      kwarg1='c',\n    }\n"));
}

#[test]
fn matchers_and_partial_calls() {
    let session = session();
    session
        .mock_callable("sample_module", "test_function")
        .unwrap()
        .for_partial_call(call!(Matcher::StrStartingWith("pre".into())))
        .to_return_value("partial")
        .unwrap();
    session
        .mock_callable("sample_module", "test_function")
        .unwrap()
        .for_call(call!(Any, "exact"))
        .to_return_value("exact")
        .unwrap();
    let result = call(
        &session,
        "sample_module.test_function",
        args!("prefix", "b"; kwarg1 = "c"),
    );
    assert_eq!(result.unwrap(), Value::from("partial"));
    let result = call(&session, "sample_module.test_function", args!("x", "exact"));
    assert_eq!(result.unwrap(), Value::from("exact"));
}

#[test]
fn calls_are_type_checked() {
    let session = session();
    session
        .mock_callable("sample_module", "test_function")
        .unwrap()
        .to_return_value("mocked")
        .unwrap();
    let error = call(&session, "sample_module.test_function", args!("a", 1)).unwrap_err();
    assert_eq!(
        error.to_string(),
        "<module 'sample_module'>, 'test_function': type of argument 'arg2' must be str; got int instead"
    );
    assert!(matches!(
        call(&session, "sample_module.test_function", args!("a")),
        Err(Error::SignatureMismatch(_))
    ));
}

#[test]
fn type_validation_can_be_turned_off() {
    let session = session();
    session
        .mock_callable_with(
            "sample_module",
            "test_function",
            MockOptions::default().without_type_validation(),
        )
        .unwrap()
        .to_return_value(1)
        .unwrap();
    let result = call(&session, "sample_module.test_function", args!(1, 2, 3));
    assert_eq!(result.unwrap(), Value::Int(1));
}

#[test]
fn return_value_is_type_checked() {
    let session = session();
    session
        .mock_callable("os", "getcwd")
        .unwrap()
        .to_return_value(1)
        .unwrap();
    assert!(matches!(
        call(&session, "os.getcwd", args!()),
        Err(Error::TypeCheck(_))
    ));
}

#[test]
fn implementation_wrapper_and_original() {
    let session = session();
    session
        .mock_callable("sample_module", "test_function")
        .unwrap()
        .for_call(call!("implementation", "b"))
        .with_implementation(Function::new("implementation", |args| {
            Ok(Value::from(format!("implemented {}", args.len())))
        }))
        .unwrap();
    session
        .mock_callable("sample_module", "test_function")
        .unwrap()
        .for_call(call!("wrapper", "b"))
        .with_wrapper(Function::new("wrapper", |args| {
            let (original, args) = args.split_first();
            let result = original.unwrap().call(args)?;
            Ok(Value::from(format!("wrapped {}", result.as_str().unwrap())))
        }))
        .unwrap();
    session
        .mock_callable("sample_module", "test_function")
        .unwrap()
        .for_call(call!("original", "b"))
        .to_call_original()
        .unwrap();
    let test_function = |a: &str| {
        call(&session, "sample_module.test_function", args!(a, "b")).unwrap()
    };
    assert_eq!(test_function("implementation"), Value::from("implemented 2"));
    assert_eq!(test_function("wrapper"), Value::from("wrapped wrapper_b"));
    assert_eq!(test_function("original"), Value::from("original_b"));
}

#[test]
fn not_called_refuses_the_call() {
    let session = session();
    session
        .mock_callable("os", "getcwd")
        .unwrap()
        .to_return_value("/mocked")
        .unwrap()
        .and_assert_not_called()
        .unwrap();
    let error = call(&session, "os.getcwd", args!()).unwrap_err();
    assert!(matches!(error, Error::UnexpectedCallReceived(_)));
    session.finish().unwrap();
}

#[test]
fn at_most_refuses_calls_past_the_ceiling() {
    let session = session();
    session
        .mock_callable("os", "getcwd")
        .unwrap()
        .to_return_value("/mocked")
        .unwrap()
        .and_assert_called_at_most(2)
        .unwrap();
    getcwd_of(&session);
    getcwd_of(&session);
    assert!(matches!(
        call(&session, "os.getcwd", args!()),
        Err(Error::UnexpectedCallReceived(_))
    ));
    session.finish().unwrap();
}

#[test]
fn ordered_calls() {
    let session = session();
    for (target, attribute) in [
        ("os", "getcwd"),
        ("sample_module", "other_function"),
        ("sample_module", "test_function"),
    ] {
        session
            .mock_callable(target, attribute)
            .unwrap()
            .to_return_value("mocked")
            .unwrap()
            .and_assert_called_ordered()
            .unwrap();
    }
    getcwd_of(&session);
    call(&session, "sample_module.other_function", args!()).unwrap();
    call(&session, "sample_module.test_function", args!("a", "b")).unwrap();
    session.finish().unwrap();
}

#[test]
fn calls_out_of_order() {
    let session = session();
    for (target, attribute) in [
        ("os", "getcwd"),
        ("sample_module", "other_function"),
        ("sample_module", "test_function"),
    ] {
        session
            .mock_callable(target, attribute)
            .unwrap()
            .to_return_value("mocked")
            .unwrap()
            .and_assert_called_ordered()
            .unwrap();
    }
    call(&session, "sample_module.test_function", args!("a", "b")).unwrap();
    getcwd_of(&session);
    call(&session, "sample_module.other_function", args!()).unwrap();
    let message = session.finish().unwrap_err().to_string();
    assert_eq!(
        message,
        "calls did not match assertion.\n  \
         expected calls in this order:\n    \
         <module 'os'>, 'getcwd' with any arguments\n    \
         <module 'sample_module'>, 'other_function' with any arguments\n    \
         <module 'sample_module'>, 'test_function' with any arguments\n  \
         received calls in this order:\n    \
         <module 'sample_module'>, 'test_function' with any arguments\n    \
         <module 'os'>, 'getcwd' with any arguments\n    \
         <module 'sample_module'>, 'other_function' with any arguments\n"
    );
}

#[test]
fn instance_method_of_one_instance() {
    let session = session();
    let class = session.runtime().resolve("sample_module.Target").unwrap();
    let patched = class.call(args!("patched")).unwrap();
    let sibling = class.call(args!("sibling")).unwrap();
    session
        .mock_callable(&patched, "instance_method")
        .unwrap()
        .for_call(call!("a", "b"))
        .to_return_value("mocked")
        .unwrap();
    let instance_method = |object: &Value| {
        object
            .get_attr("instance_method")
            .unwrap()
            .call(args!("a", "b"))
            .unwrap()
    };
    assert_eq!(instance_method(&patched), Value::from("mocked"));
    assert_eq!(instance_method(&sibling), Value::from("original: a_b"));
    session.finish().unwrap();
    assert_eq!(instance_method(&patched), Value::from("original: a_b"));
}

#[test]
fn instance_method_at_the_class_is_refused() {
    let session = session();
    assert!(matches!(
        session.mock_callable("sample_module.Target", "instance_method"),
        Err(Error::InstanceMethodAtClass { .. })
    ));
}

#[test]
fn class_and_static_methods() {
    let session = session();
    session
        .mock_callable("sample_module.Target", "static_method")
        .unwrap()
        .to_return_value("mocked static")
        .unwrap();
    session
        .mock_callable("sample_module.Target", "class_method")
        .unwrap()
        .to_return_value("mocked class")
        .unwrap();
    let class = session.runtime().resolve("sample_module.Target").unwrap();
    let object = Object::new(class.as_class().unwrap());
    assert_eq!(
        object.get_attr("static_method").unwrap().call(args!("a")).unwrap(),
        Value::from("mocked static")
    );
    assert_eq!(
        class.get_attr("class_method").unwrap().call(args!()).unwrap(),
        Value::from("mocked class")
    );
    session.finish().unwrap();
    assert_eq!(
        class.get_attr("class_method").unwrap().call(args!()).unwrap(),
        Value::from("class: <class 'sample_module.Target'>")
    );
}

#[test]
fn guardrails() {
    let session = session();
    assert!(matches!(
        session.mock_callable("sample_module", "attribute"),
        Err(Error::AttributeNotCallable { .. })
    ));
    assert!(matches!(
        session.mock_callable("sample_module", "missing"),
        Err(Error::AttributeNotFound { .. })
    ));
    assert!(matches!(
        session.mock_callable("sample_module", "_private"),
        Err(Error::PrivateAttribute(_))
    ));
    assert!(matches!(
        session.mock_callable("missing_module", "function"),
        Err(Error::ModuleNotFound(_))
    ));
}
