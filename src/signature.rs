//! Function signatures and argument binding.
//!
//! A [`Signature`] lists a callable's parameters and their kinds. It is used
//! to map argument names to positions (and back) and to bind concrete
//! arguments to parameters.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::value::{Kwargs, Value};

/// How a parameter may be passed.
///
/// Variants are listed in the order they must appear in a signature.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParameterKind {
    /// Only by position (`a` in `f(a, /)`).
    PositionalOnly,
    /// By position or by name.
    PositionalOrKeyword,
    /// Collects extra positional arguments (`*args`).
    VarPositional,
    /// Only by name (`c` in `f(*, c)`).
    KeywordOnly,
    /// Collects extra keyword arguments (`**kwargs`).
    VarKeyword,
}

impl ParameterKind {
    /// Returns true for kinds that consume a positional slot.
    pub const fn is_positional(self) -> bool {
        matches!(self, ParameterKind::PositionalOnly | ParameterKind::PositionalOrKeyword)
    }

    /// Returns true for kinds that may be named by a keyword argument.
    pub const fn accepts_keyword(self) -> bool {
        matches!(self, ParameterKind::PositionalOrKeyword | ParameterKind::KeywordOnly)
    }

    /// Name of the kind, as in `inspect.Parameter` kinds.
    pub const fn as_str(self) -> &'static str {
        match self {
            ParameterKind::PositionalOnly => "positional-only",
            ParameterKind::PositionalOrKeyword => "positional-or-keyword",
            ParameterKind::VarPositional => "var-positional",
            ParameterKind::KeywordOnly => "keyword-only",
            ParameterKind::VarKeyword => "var-keyword",
        }
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single parameter of a [`Signature`].
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    name: String,
    kind: ParameterKind,
    default: Option<Value>,
}

impl Parameter {
    /// A parameter without a default.
    pub fn new(name: impl Into<String>, kind: ParameterKind) -> Self {
        Self { name: name.into(), kind, default: None }
    }

    /// A positional-only parameter.
    pub fn positional_only(name: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::PositionalOnly)
    }

    /// A parameter passed by position or keyword.
    pub fn positional_or_keyword(name: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::PositionalOrKeyword)
    }

    /// A `*args` parameter.
    pub fn var_positional(name: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::VarPositional)
    }

    /// A keyword-only parameter.
    pub fn keyword_only(name: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::KeywordOnly)
    }

    /// A `**kwargs` parameter.
    pub fn var_keyword(name: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::VarKeyword)
    }

    /// Attach a default value.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// How the parameter may be passed.
    pub fn kind(&self) -> ParameterKind {
        self.kind
    }

    /// Default value, if the parameter is optional.
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

/// Ordered parameter list of a callable.
///
/// # Examples
///
/// ```
/// use jax_argspec::{ParameterKind, Signature};
///
/// let sig: Signature = "a, /, b, *args, c=1, **kwargs".parse().unwrap();
/// assert_eq!(sig.len(), 5);
/// assert_eq!(sig.parameter("c").unwrap().kind(), ParameterKind::KeywordOnly);
/// assert_eq!(sig.num_positional(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Signature {
    parameters: Vec<Parameter>,
}

impl Signature {
    /// Build a signature, checking names are unique and kinds are ordered.
    pub fn new(parameters: Vec<Parameter>) -> Result<Self> {
        let mut seen_default = false;
        for (i, param) in parameters.iter().enumerate() {
            if param.name.is_empty() {
                return Err(Error::InvalidSignature("empty parameter name".into()));
            }
            if parameters[..i].iter().any(|p| p.name == param.name) {
                return Err(Error::InvalidSignature(format!(
                    "duplicate parameter name: '{}'",
                    param.name
                )));
            }
            if let Some(prev) = i.checked_sub(1).map(|j| &parameters[j]) {
                let repeated_var = prev.kind == param.kind
                    && matches!(
                        param.kind,
                        ParameterKind::VarPositional | ParameterKind::VarKeyword
                    );
                if prev.kind > param.kind || repeated_var {
                    return Err(Error::InvalidSignature(format!(
                        "{} parameter '{}' cannot follow {} parameter '{}'",
                        param.kind, param.name, prev.kind, prev.name
                    )));
                }
            }
            if param.kind.is_positional() {
                if param.default.is_some() {
                    seen_default = true;
                } else if seen_default {
                    return Err(Error::InvalidSignature(format!(
                        "non-default parameter '{}' follows default parameter",
                        param.name
                    )));
                }
            }
            if !matches!(param.kind, ParameterKind::PositionalOnly | ParameterKind::PositionalOrKeyword | ParameterKind::KeywordOnly)
                && param.default.is_some()
            {
                return Err(Error::InvalidSignature(format!(
                    "{} parameter '{}' cannot have a default value",
                    param.kind, param.name
                )));
            }
        }
        Ok(Self { parameters })
    }

    /// Signature whose parameters are all positional-or-keyword.
    pub fn from_names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(names.into_iter().map(Parameter::positional_or_keyword).collect())
    }

    /// Parameters in declaration order.
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Look a parameter up by name.
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    /// Returns true if the function takes no parameters.
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Number of parameters that consume a positional slot.
    pub fn num_positional(&self) -> usize {
        self.parameters.iter().filter(|p| p.kind.is_positional()).count()
    }

    /// Returns true if the function takes `*args`.
    pub fn has_var_positional(&self) -> bool {
        self.parameters.iter().any(|p| p.kind == ParameterKind::VarPositional)
    }

    /// Name of the `**kwargs` parameter, if any.
    pub fn var_keyword_name(&self) -> Option<&str> {
        self.parameters
            .iter()
            .find(|p| p.kind == ParameterKind::VarKeyword)
            .map(|p| p.name.as_str())
    }

    /// Names and kinds, without defaults. Resolution only depends on this.
    pub fn kinds(&self) -> Vec<(String, ParameterKind)> {
        self.parameters.iter().map(|p| (p.name.clone(), p.kind)).collect()
    }

    /// Bind arguments to parameters.
    ///
    /// Defaults are not filled in; see [`BoundArguments::apply_defaults`].
    pub fn bind(
        &self,
        args: &[Value],
        kwargs: &Kwargs,
    ) -> std::result::Result<BoundArguments<'_>, BindError> {
        let params = &self.parameters;
        let mut kwargs = kwargs.clone();
        let mut arguments: Vec<(String, BoundValue)> = Vec::new();

        let mut i = 0;
        let mut a = 0;
        while i < params.len() && a < args.len() {
            let param = &params[i];
            match param.kind {
                ParameterKind::PositionalOnly | ParameterKind::PositionalOrKeyword => {
                    if param.kind == ParameterKind::PositionalOrKeyword
                        && kwargs.contains_key(&param.name)
                    {
                        return Err(BindError::MultipleValues(param.name.clone()));
                    }
                    arguments.push((param.name.clone(), BoundValue::Value(args[a].clone())));
                    a += 1;
                }
                ParameterKind::VarPositional => {
                    arguments.push((param.name.clone(), BoundValue::VarArgs(args[a..].to_vec())));
                    a = args.len();
                }
                ParameterKind::KeywordOnly | ParameterKind::VarKeyword => break,
            }
            i += 1;
        }
        if a < args.len() {
            return Err(BindError::TooManyPositional);
        }

        let var_keyword = self.var_keyword_name().map(str::to_string);
        for param in &params[i..] {
            match param.kind {
                ParameterKind::VarPositional | ParameterKind::VarKeyword => {}
                ParameterKind::PositionalOnly => {
                    if kwargs.contains_key(&param.name) && var_keyword.is_none() {
                        return Err(BindError::PositionalOnlyAsKeyword(param.name.clone()));
                    }
                    if param.default.is_none() {
                        return Err(BindError::Missing(param.name.clone()));
                    }
                }
                ParameterKind::PositionalOrKeyword | ParameterKind::KeywordOnly => {
                    match kwargs.remove(&param.name) {
                        Some(value) => {
                            arguments.push((param.name.clone(), BoundValue::Value(value)))
                        }
                        None if param.default.is_none() => {
                            return Err(BindError::Missing(param.name.clone()));
                        }
                        None => {}
                    }
                }
            }
        }

        if !kwargs.is_empty() {
            match var_keyword {
                Some(name) => arguments.push((name, BoundValue::VarKwargs(kwargs))),
                None => {
                    let name = kwargs.keys().next().cloned().unwrap_or_default();
                    return Err(BindError::UnexpectedKeyword(name));
                }
            }
        }

        Ok(BoundArguments { signature: self, arguments })
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        let mut keyword_marker_needed = true;
        for (i, p) in self.parameters.iter().enumerate() {
            let next_kind = self.parameters.get(i + 1).map(|n| n.kind);
            let mut part = match p.kind {
                ParameterKind::VarPositional => {
                    keyword_marker_needed = false;
                    format!("*{}", p.name)
                }
                ParameterKind::VarKeyword => format!("**{}", p.name),
                ParameterKind::KeywordOnly if keyword_marker_needed => {
                    keyword_marker_needed = false;
                    parts.push("*".to_string());
                    p.name.clone()
                }
                _ => p.name.clone(),
            };
            if let Some(default) = &p.default {
                part.push('=');
                part.push_str(&default.to_string());
            }
            parts.push(part);
            if p.kind == ParameterKind::PositionalOnly
                && next_kind != Some(ParameterKind::PositionalOnly)
            {
                parts.push("/".to_string());
            }
        }
        write!(f, "({})", parts.join(", "))
    }
}

impl FromStr for Signature {
    type Err = Error;

    /// Parse a parameter list such as `a, /, b=2, *args, c, **kwargs`.
    ///
    /// Defaults may be ints, floats, `True`, `False`, `None` or quoted
    /// strings.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let s = s
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .unwrap_or(s);
        let mut parameters: Vec<Parameter> = Vec::new();
        let mut keyword_only = false;
        for token in s.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            if token == "/" {
                for p in parameters.iter_mut() {
                    if p.kind == ParameterKind::PositionalOrKeyword {
                        p.kind = ParameterKind::PositionalOnly;
                    }
                }
                continue;
            }
            if token == "*" {
                keyword_only = true;
                continue;
            }
            if let Some(name) = token.strip_prefix("**") {
                parameters.push(Parameter::var_keyword(name.trim()));
                continue;
            }
            if let Some(name) = token.strip_prefix('*') {
                keyword_only = true;
                parameters.push(Parameter::var_positional(name.trim()));
                continue;
            }
            let (name, default) = match token.split_once('=') {
                Some((name, default)) => (name.trim(), Some(parse_default(default.trim())?)),
                None => (token, None),
            };
            let kind = if keyword_only {
                ParameterKind::KeywordOnly
            } else {
                ParameterKind::PositionalOrKeyword
            };
            parameters.push(Parameter { name: name.to_string(), kind, default });
        }
        Signature::new(parameters)
    }
}

fn parse_default(text: &str) -> Result<Value> {
    let value = match text {
        "None" => Value::None,
        "True" => Value::Bool(true),
        "False" => Value::Bool(false),
        _ => {
            let quoted = text
                .strip_prefix('\'')
                .and_then(|t| t.strip_suffix('\''))
                .or_else(|| text.strip_prefix('"').and_then(|t| t.strip_suffix('"')));
            if let Some(inner) = quoted {
                Value::Str(inner.to_string())
            } else if let Ok(i) = text.parse::<i64>() {
                Value::Int(i)
            } else if let Ok(x) = text.parse::<f64>() {
                Value::Float(x)
            } else {
                return Err(Error::InvalidSignature(format!(
                    "unsupported default value: {text}"
                )));
            }
        }
    };
    Ok(value)
}

/// Failure to match arguments against a signature.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindError {
    /// More positional arguments than positional parameters.
    #[error("too many positional arguments")]
    TooManyPositional,
    /// A required parameter got no value.
    #[error("missing a required argument: '{0}'")]
    Missing(String),
    /// A parameter got a value by position and by keyword.
    #[error("multiple values for argument '{0}'")]
    MultipleValues(String),
    /// A keyword matches no parameter.
    #[error("got an unexpected keyword argument '{0}'")]
    UnexpectedKeyword(String),
    /// A positional-only parameter was passed by keyword.
    #[error("'{0}' parameter is positional only, but was passed as a keyword")]
    PositionalOnlyAsKeyword(String),
}

/// Value bound to one parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundValue {
    /// A single value.
    Value(Value),
    /// Values collected by `*args`.
    VarArgs(Vec<Value>),
    /// Values collected by `**kwargs`.
    VarKwargs(Kwargs),
}

impl BoundValue {
    /// The bound value as a single tree: `*args` become a tuple and
    /// `**kwargs` a dict.
    pub fn to_value(&self) -> Value {
        match self {
            BoundValue::Value(v) => v.clone(),
            BoundValue::VarArgs(items) => Value::Tuple(items.clone()),
            BoundValue::VarKwargs(map) => Value::Dict(map.clone()),
        }
    }
}

/// Result of [`Signature::bind`], in parameter order.
#[derive(Debug, Clone)]
pub struct BoundArguments<'a> {
    signature: &'a Signature,
    arguments: Vec<(String, BoundValue)>,
}

impl<'a> BoundArguments<'a> {
    /// Bound parameters in declaration order.
    pub fn arguments(&self) -> &[(String, BoundValue)] {
        &self.arguments
    }

    /// Value bound to `name`.
    pub fn get(&self, name: &str) -> Option<&BoundValue> {
        self.arguments.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Returns true if `name` is bound.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Fill in defaults for unbound parameters; empty `*args` and `**kwargs`
    /// are added too.
    pub fn apply_defaults(&mut self) {
        let mut arguments = Vec::with_capacity(self.signature.len());
        let mut bound = std::mem::take(&mut self.arguments);
        for param in self.signature.parameters() {
            if let Some(pos) = bound.iter().position(|(n, _)| n == param.name()) {
                arguments.push(bound.remove(pos));
                continue;
            }
            let value = match (param.kind(), param.default()) {
                (ParameterKind::VarPositional, _) => BoundValue::VarArgs(Vec::new()),
                (ParameterKind::VarKeyword, _) => BoundValue::VarKwargs(Kwargs::new()),
                (_, Some(default)) => BoundValue::Value(default.clone()),
                (_, None) => continue,
            };
            arguments.push((param.name().to_string(), value));
        }
        self.arguments = arguments;
    }

    /// Arguments to pass positionally: leading positional parameters up to
    /// the first unbound one, with `*args` expanded.
    pub fn args(&self) -> Vec<Value> {
        let mut out = Vec::new();
        for param in self.signature.parameters() {
            if matches!(param.kind(), ParameterKind::KeywordOnly | ParameterKind::VarKeyword) {
                break;
            }
            match self.get(param.name()) {
                Some(BoundValue::VarArgs(items)) => out.extend(items.iter().cloned()),
                Some(BoundValue::Value(v)) => out.push(v.clone()),
                Some(BoundValue::VarKwargs(_)) | None => break,
            }
        }
        out
    }

    /// Arguments that must be passed by keyword.
    pub fn kwargs(&self) -> Kwargs {
        let mut out = Kwargs::new();
        let mut started = false;
        for param in self.signature.parameters() {
            if !started {
                if matches!(param.kind(), ParameterKind::KeywordOnly | ParameterKind::VarKeyword) {
                    started = true;
                } else {
                    if !self.contains(param.name()) {
                        started = true;
                    }
                    continue;
                }
            }
            match self.get(param.name()) {
                Some(BoundValue::VarKwargs(map)) => {
                    out.extend(map.iter().map(|(k, v)| (k.clone(), v.clone())))
                }
                Some(BoundValue::Value(v)) => {
                    out.insert(param.name().to_string(), v.clone());
                }
                Some(BoundValue::VarArgs(_)) | None => {}
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kw(pairs: &[(&str, i64)]) -> Kwargs {
        pairs.iter().map(|(k, v)| (k.to_string(), Value::Int(*v))).collect()
    }

    #[test]
    fn test_parse_kinds() {
        let sig: Signature = "(a, /, b, *args, c, d=2, **kw)".parse().unwrap();
        let kinds: Vec<ParameterKind> = sig.parameters().iter().map(|p| p.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                ParameterKind::PositionalOnly,
                ParameterKind::PositionalOrKeyword,
                ParameterKind::VarPositional,
                ParameterKind::KeywordOnly,
                ParameterKind::KeywordOnly,
                ParameterKind::VarKeyword,
            ]
        );
        assert_eq!(sig.parameter("d").unwrap().default(), Some(&Value::Int(2)));
        assert_eq!(sig.var_keyword_name(), Some("kw"));
        assert!(sig.has_var_positional());
        assert_eq!(sig.to_string(), "(a, /, b, *args, c, d=2, **kw)");
    }

    #[test]
    fn test_display_bare_star() {
        let sig: Signature = "a, b, *, c".parse().unwrap();
        assert_eq!(sig.to_string(), "(a, b, *, c)");
        assert_eq!(sig.num_positional(), 2);
    }

    #[test]
    fn test_invalid_signatures() {
        assert!("a, a".parse::<Signature>().is_err());
        assert!("a=1, b".parse::<Signature>().is_err());
        assert!("a=[]".parse::<Signature>().is_err());
        assert!(Signature::new(vec![
            Parameter::keyword_only("c"),
            Parameter::positional_or_keyword("a"),
        ])
        .is_err());
        assert!(Signature::new(vec![
            Parameter::var_positional("a"),
            Parameter::var_positional("b"),
        ])
        .is_err());
        assert!(Signature::new(vec![Parameter::var_keyword("kw").with_default(1)]).is_err());
    }

    #[test]
    fn test_kind_order() {
        use ParameterKind::*;
        let kinds = [PositionalOnly, PositionalOrKeyword, VarPositional, KeywordOnly, VarKeyword];
        assert!(kinds.windows(2).all(|w| w[0] < w[1]));

        assert!(Signature::new(vec![
            Parameter::var_positional("args"),
            Parameter::keyword_only("c"),
        ])
        .is_ok());
        assert!(Signature::new(vec![
            Parameter::keyword_only("c"),
            Parameter::var_positional("args"),
        ])
        .is_err());
    }

    #[test]
    fn test_bind_positional_and_keyword() {
        let sig: Signature = "a, b, *, c".parse().unwrap();
        let ba = sig.bind(&[Value::Int(1)], &kw(&[("b", 2), ("c", 3)])).unwrap();
        let names: Vec<&str> = ba.arguments().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(ba.args(), vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(ba.kwargs(), kw(&[("c", 3)]));
    }

    #[test]
    fn test_bind_errors() {
        let sig: Signature = "a, /, b".parse().unwrap();
        assert_eq!(
            sig.bind(&[Value::Int(1), Value::Int(2), Value::Int(3)], &Kwargs::new()).unwrap_err(),
            BindError::TooManyPositional
        );
        assert_eq!(
            sig.bind(&[Value::Int(1)], &Kwargs::new()).unwrap_err(),
            BindError::Missing("b".into())
        );
        assert_eq!(
            sig.bind(&[Value::Int(1), Value::Int(2)], &kw(&[("b", 3)])).unwrap_err(),
            BindError::MultipleValues("b".into())
        );
        assert_eq!(
            sig.bind(&[], &kw(&[("a", 1), ("b", 2)])).unwrap_err(),
            BindError::PositionalOnlyAsKeyword("a".into())
        );
        assert_eq!(
            sig.bind(&[Value::Int(1)], &kw(&[("b", 2), ("z", 3)])).unwrap_err(),
            BindError::UnexpectedKeyword("z".into())
        );
    }

    #[test]
    fn test_bind_var_args_and_kwargs() {
        let sig: Signature = "a, *rest, **extra".parse().unwrap();
        let ba = sig
            .bind(&[Value::Int(1), Value::Int(2), Value::Int(3)], &kw(&[("z", 9)]))
            .unwrap();
        assert_eq!(ba.get("rest"), Some(&BoundValue::VarArgs(vec![Value::Int(2), Value::Int(3)])));
        assert_eq!(ba.args(), vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert_eq!(ba.kwargs(), kw(&[("z", 9)]));
    }

    #[test]
    fn test_positional_only_name_goes_to_var_keyword() {
        let sig: Signature = "a, /, **kw".parse().unwrap();
        let ba = sig.bind(&[Value::Int(1)], &kw(&[("a", 2)])).unwrap();
        assert_eq!(ba.kwargs(), kw(&[("a", 2)]));
    }

    #[test]
    fn test_apply_defaults() {
        let sig: Signature = "a, b=5, *args, c=7, **kw".parse().unwrap();
        let mut ba = sig.bind(&[Value::Int(1)], &Kwargs::new()).unwrap();
        assert_eq!(ba.args(), vec![Value::Int(1)]);
        ba.apply_defaults();
        assert_eq!(ba.args(), vec![Value::Int(1), Value::Int(5)]);
        assert_eq!(ba.kwargs(), kw(&[("c", 7)]));
        assert_eq!(ba.arguments().len(), 5);
    }

    #[test]
    fn test_kwargs_after_unbound_positional() {
        let sig: Signature = "a, b=1, c=2".parse().unwrap();
        let ba = sig.bind(&[Value::Int(0)], &kw(&[("c", 3)])).unwrap();
        assert_eq!(ba.args(), vec![Value::Int(0)]);
        assert_eq!(ba.kwargs(), kw(&[("c", 3)]));
    }
}
