use std::fmt::{self, Display};

use crate::{Args, Class, Error, Result, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamKind {
    PositionalOnly,
    PositionalOrKeyword,
    VarPositional,
    KeywordOnly,
    VarKeyword,
}

#[derive(Clone, Debug)]
pub struct Param {
    name: String,
    kind: ParamKind,
    optional: bool,
    hint: Option<TypeHint>,
}

impl Param {
    fn new(name: &str, kind: ParamKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            optional: false,
            hint: None,
        }
    }

    pub fn positional(name: &str) -> Self {
        Self::new(name, ParamKind::PositionalOrKeyword)
    }

    pub fn positional_only(name: &str) -> Self {
        Self::new(name, ParamKind::PositionalOnly)
    }

    pub fn keyword_only(name: &str) -> Self {
        Self::new(name, ParamKind::KeywordOnly)
    }

    pub fn var_args(name: &str) -> Self {
        Self::new(name, ParamKind::VarPositional)
    }

    pub fn var_kwargs(name: &str) -> Self {
        Self::new(name, ParamKind::VarKeyword)
    }

    /// The parameter has a default value.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn typed(mut self, hint: TypeHint) -> Self {
        self.hint = Some(hint);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ParamKind {
        self.kind
    }

    fn accepts_positional(&self) -> bool {
        matches!(
            self.kind,
            ParamKind::PositionalOnly | ParamKind::PositionalOrKeyword
        )
    }

    fn accepts_keyword(&self) -> bool {
        matches!(
            self.kind,
            ParamKind::PositionalOrKeyword | ParamKind::KeywordOnly
        )
    }
}

/// Parameters of a callable and its optional return annotation.
#[derive(Clone, Debug, Default)]
pub struct Signature {
    params: Vec<Param>,
    returns: Option<TypeHint>,
}

impl Signature {
    pub fn new(params: impl IntoIterator<Item = Param>) -> Self {
        Self {
            params: params.into_iter().collect(),
            returns: None,
        }
    }

    pub fn returns(mut self, hint: TypeHint) -> Self {
        self.returns = Some(hint);
        self
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Binds `args` to the parameters and type checks every annotated one.
    /// With `skip_first` the first parameter is treated as already bound,
    /// as it is for the receiver of a method.
    pub fn validate(&self, name: &str, args: &Args, skip_first: bool) -> Result<()> {
        let params = match (skip_first, self.params.first()) {
            (true, Some(first)) if first.kind != ParamKind::VarPositional => &self.params[1..],
            _ => &self.params[..],
        };
        let mismatch = |problem: String| Error::SignatureMismatch(format!("{name}: {problem}"));
        let mut bound: Vec<Option<&Value>> = vec![None; params.len()];

        let mut slots = params
            .iter()
            .enumerate()
            .filter(|(_, param)| param.accepts_positional());
        let var_args = params
            .iter()
            .position(|param| param.kind == ParamKind::VarPositional);
        for value in args.positional() {
            match slots.next() {
                Some((index, _)) => bound[index] = Some(value),
                None => match var_args {
                    Some(index) => check_type(name, &params[index], value)?,
                    None => {
                        return Err(mismatch(format!(
                            "too many positional arguments ({} given)",
                            args.positional().len()
                        )))
                    }
                },
            }
        }

        let var_kwargs = params
            .iter()
            .position(|param| param.kind == ParamKind::VarKeyword);
        for (key, value) in args.keywords() {
            let slot = params
                .iter()
                .position(|param| param.accepts_keyword() && param.name == *key);
            match (slot, var_kwargs) {
                (Some(index), _) if bound[index].is_some() => {
                    return Err(mismatch(format!("multiple values for argument '{key}'")))
                }
                (Some(index), _) => bound[index] = Some(value),
                (None, Some(index)) => check_type(name, &params[index], value)?,
                (None, None) => {
                    return Err(mismatch(format!("got an unexpected keyword argument '{key}'")))
                }
            }
        }

        for (param, value) in params.iter().zip(&bound) {
            match value {
                Some(value) => check_type(name, param, value)?,
                None if param.optional => {}
                None if matches!(
                    param.kind,
                    ParamKind::VarPositional | ParamKind::VarKeyword
                ) => {}
                None => {
                    return Err(mismatch(format!(
                        "missing a required argument: '{}'",
                        param.name
                    )))
                }
            }
        }
        Ok(())
    }

    pub fn validate_return(&self, name: &str, value: &Value) -> Result<()> {
        match &self.returns {
            Some(hint) if !hint.matches(value) => Err(Error::TypeCheck(format!(
                "{name}: type of return value must be {hint}; got {} instead",
                value.type_name()
            ))),
            _ => Ok(()),
        }
    }

    pub fn return_hint(&self) -> Option<&TypeHint> {
        self.returns.as_ref()
    }
}

fn check_type(name: &str, param: &Param, value: &Value) -> Result<()> {
    match &param.hint {
        Some(hint) if !hint.matches(value) => Err(Error::TypeCheck(format!(
            "{name}: type of argument '{}' must be {hint}; got {} instead",
            param.name,
            value.type_name()
        ))),
        _ => Ok(()),
    }
}

/// An annotation checked at call time.
#[derive(Clone, Debug)]
pub enum TypeHint {
    Any,
    None,
    Bool,
    Int,
    Float,
    Str,
    Tuple,
    List,
    Dict,
    Callable,
    Awaitable,
    InstanceOf(Class),
    Optional(Box<TypeHint>),
    Union(Vec<TypeHint>),
}

impl TypeHint {
    pub fn optional(hint: TypeHint) -> Self {
        TypeHint::Optional(Box::new(hint))
    }

    pub fn matches(&self, value: &Value) -> bool {
        // A strict mock without a template stands in for anything.
        if let Value::StrictMock(mock) = value {
            if mock.template().is_none() {
                return true;
            }
        }
        match self {
            TypeHint::Any => true,
            TypeHint::None => value.is_none(),
            TypeHint::Bool => matches!(value, Value::Bool(_)),
            TypeHint::Int => matches!(value, Value::Int(_)),
            TypeHint::Float => matches!(value, Value::Float(_) | Value::Int(_)),
            TypeHint::Str => matches!(value, Value::Str(_)),
            TypeHint::Tuple => matches!(value, Value::Tuple(_)),
            TypeHint::List => matches!(value, Value::List(_)),
            TypeHint::Dict => matches!(value, Value::Dict(_)),
            TypeHint::Callable => value.is_callable(),
            TypeHint::Awaitable => matches!(value, Value::Coroutine(_)),
            TypeHint::InstanceOf(class) => match value {
                Value::Object(object) => object.class().is_subclass_of(class),
                Value::StrictMock(mock) => mock
                    .template()
                    .map_or(false, |template| template.is_subclass_of(class)),
                _ => false,
            },
            TypeHint::Optional(hint) => value.is_none() || hint.matches(value),
            TypeHint::Union(hints) => hints.iter().any(|hint| hint.matches(value)),
        }
    }
}

impl Display for TypeHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeHint::Any => f.write_str("Any"),
            TypeHint::None => f.write_str("None"),
            TypeHint::Bool => f.write_str("bool"),
            TypeHint::Int => f.write_str("int"),
            TypeHint::Float => f.write_str("float"),
            TypeHint::Str => f.write_str("str"),
            TypeHint::Tuple => f.write_str("tuple"),
            TypeHint::List => f.write_str("list"),
            TypeHint::Dict => f.write_str("dict"),
            TypeHint::Callable => f.write_str("Callable"),
            TypeHint::Awaitable => f.write_str("Awaitable"),
            TypeHint::InstanceOf(class) => f.write_str(class.name()),
            TypeHint::Optional(hint) => write!(f, "Optional[{hint}]"),
            TypeHint::Union(hints) => {
                let hints: Vec<String> = hints.iter().map(ToString::to_string).collect();
                write!(f, "Union[{}]", hints.join(", "))
            }
        }
    }
}
