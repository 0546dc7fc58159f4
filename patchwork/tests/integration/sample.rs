use patchwork::{
    args, Args, Attributes, Class, Function, Module, Param, Result, Runtime, Session, Signature,
    TypeHint, Value,
};

fn text(args: &Args, index: usize) -> String {
    args.get(index)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn getcwd() -> Function {
    Function::new("getcwd", |_| Ok(Value::from("/original/cwd")))
        .with_signature(Signature::new([]).returns(TypeHint::Str))
}

fn test_function() -> Function {
    Function::new("test_function", |args| {
        Ok(Value::from(format!("{}_{}", text(&args, 0), text(&args, 1))))
    })
    .with_signature(
        Signature::new([
            Param::positional("arg1").typed(TypeHint::Str),
            Param::positional("arg2").typed(TypeHint::Str),
            Param::keyword_only("kwarg1").optional().typed(TypeHint::Str),
            Param::var_kwargs("kwargs"),
        ])
        .returns(TypeHint::Str),
    )
}

fn async_test_function() -> Function {
    Function::new_async("async_test_function", |args| async move {
        Ok(Value::from(format!("async {}", text(&args, 0))))
    })
    .with_signature(Signature::new([Param::positional("arg1").typed(TypeHint::Str)]))
}

fn target_class() -> Class {
    Class::builder("Target")
        .module("sample_module")
        .attribute("CLASS_ATTR", "class_attr")
        .attribute("inits", 0)
        .method(
            "__init__",
            Function::new("__init__", |args| {
                let (receiver, args) = args.split_first();
                let Some(Value::Object(object)) = receiver else {
                    return Ok(Value::None);
                };
                let inits = object.get_attr("inits")?.as_int().unwrap_or_default();
                object.set_attr("inits", Value::Int(inits + 1))?;
                object.set_attr("message", Value::from(text(&args, 0)))?;
                Ok(Value::None)
            })
            .with_signature(Signature::new([
                Param::positional("self"),
                Param::positional("message").optional().typed(TypeHint::Str),
            ])),
        )
        .method(
            "instance_method",
            Function::new("instance_method", |args| {
                Ok(Value::from(format!("original: {}_{}", text(&args, 1), text(&args, 2))))
            })
            .with_signature(
                Signature::new([
                    Param::positional("self"),
                    Param::positional("arg1").typed(TypeHint::Str),
                    Param::positional("arg2").typed(TypeHint::Str),
                ])
                .returns(TypeHint::Str),
            ),
        )
        .static_method(
            "static_method",
            Function::new("static_method", |args| {
                Ok(Value::from(format!("static: {}", text(&args, 0))))
            }),
        )
        .class_method(
            "class_method",
            Function::new("class_method", |args| {
                let name = args.get(0).map(|class| class.repr()).unwrap_or_default();
                Ok(Value::from(format!("class: {name}")))
            }),
        )
        .property(
            "prop",
            Function::new("prop", |_| Ok(Value::from("property"))),
        )
        .build()
        .expect("Target has a consistent MRO")
}

/// A fresh object graph: an `os` module with `getcwd` and a
/// `sample_module` with functions, an attribute and the `Target` class.
pub fn runtime() -> Runtime {
    let runtime = Runtime::new();
    runtime.register(Module::new("os").with("getcwd", getcwd()));
    runtime.register(
        Module::new("sample_module")
            .with("attribute", "original")
            .with("test_function", test_function())
            .with("async_test_function", async_test_function())
            .with(
                "other_function",
                Function::new("other_function", |_| Ok(Value::from("other"))),
            )
            .with("Target", target_class()),
    );
    runtime
}

/// Resolves `path` against the session's runtime and calls it.
pub fn call(session: &Session, path: &str, args: Args) -> Result<Value> {
    session.runtime().resolve(path)?.call(args)
}

pub fn getcwd_of(session: &Session) -> Value {
    call(session, "os.getcwd", args!()).unwrap()
}
