//! Callables that can be jitted.

use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use crate::error::CallError;
use crate::signature::Signature;
use crate::value::{Kwargs, Value};

/// Result of calling a user function.
pub type CallResult = std::result::Result<Value, CallError>;

/// Where a function was defined.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    /// Source file path.
    pub file: String,
    /// 1-based line number.
    pub line: u32,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

impl From<&Location<'_>> for SourceLocation {
    fn from(loc: &Location<'_>) -> Self {
        Self { file: loc.file().to_string(), line: loc.line() }
    }
}

/// A function taking positional and keyword values.
pub trait Callable: Send + Sync {
    /// Function name; no whitespace.
    fn name(&self) -> &str;

    /// Parameter list, if known.
    fn signature(&self) -> Option<&Signature> {
        None
    }

    /// Definition site, if known.
    fn source_location(&self) -> Option<&SourceLocation> {
        None
    }

    /// Call the function.
    fn call(&self, args: &[Value], kwargs: &Kwargs) -> CallResult;
}

type FnBody = dyn Fn(&[Value], &Kwargs) -> CallResult + Send + Sync;

/// A named closure with an optional signature.
///
/// `Function::new` records the caller's location as the definition site.
///
/// # Examples
///
/// ```
/// use jax_argspec::{Callable, Function, Kwargs, Value};
///
/// let add = Function::new("add", |args: &[Value], _kw: &Kwargs| {
///     match (&args[0], &args[1]) {
///         (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a + b)),
///         _ => Ok(Value::None),
///     }
/// })
/// .with_signature("a, b".parse().unwrap());
///
/// assert_eq!(add.call(&[Value::Int(1), Value::Int(2)], &Kwargs::new()), Ok(Value::Int(3)));
/// ```
#[derive(Clone)]
pub struct Function {
    name: String,
    signature: Option<Signature>,
    location: Option<SourceLocation>,
    body: Arc<FnBody>,
}

impl Function {
    /// Wrap `body`, recording the caller as the definition site.
    #[track_caller]
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&[Value], &Kwargs) -> CallResult + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            signature: None,
            location: Some(Location::caller().into()),
            body: Arc::new(body),
        }
    }

    /// Attach a parameter list.
    pub fn with_signature(mut self, signature: Signature) -> Self {
        self.signature = Some(signature);
        self
    }

    /// Override the definition site.
    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Forget the definition site, as for builtins.
    pub fn without_location(mut self) -> Self {
        self.location = None;
        self
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl Callable for Function {
    fn name(&self) -> &str {
        &self.name
    }

    fn signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    fn source_location(&self) -> Option<&SourceLocation> {
        self.location.as_ref()
    }

    fn call(&self, args: &[Value], kwargs: &Kwargs) -> CallResult {
        (self.body)(args, kwargs)
    }
}

impl<C: Callable + ?Sized> Callable for Arc<C> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn signature(&self) -> Option<&Signature> {
        (**self).signature()
    }

    fn source_location(&self) -> Option<&SourceLocation> {
        (**self).source_location()
    }

    fn call(&self, args: &[Value], kwargs: &Kwargs) -> CallResult {
        (**self).call(args, kwargs)
    }
}

/// The callable's signature, or `None` when it does not expose one.
pub fn fun_signature(fun: &dyn Callable) -> Option<Signature> {
    fun.signature().cloned()
}

/// Provenance string for `fun`: `"name at file:line"`, or just the name
/// when the definition site is unknown, or `"<unknown>"` when the name is
/// unusable.
pub fn fun_sourceinfo(fun: &dyn Callable) -> String {
    let name = fun.name();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return "<unknown>".to_string();
    }
    match fun.source_location() {
        Some(loc) => format!("{name} at {loc}"),
        None => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Function {
        Function::new("identity", |args: &[Value], _: &Kwargs| {
            Ok(args.first().cloned().unwrap_or(Value::None))
        })
    }

    #[test]
    fn test_records_caller_location() {
        let f = identity();
        let loc = f.source_location().unwrap();
        assert!(loc.file.ends_with("function.rs"));
        assert!(fun_sourceinfo(&f).starts_with("identity at "));
    }

    #[test]
    fn test_sourceinfo_without_location() {
        let f = identity().without_location();
        assert_eq!(fun_sourceinfo(&f), "identity");
        let unnamed = Function::new("not a name", |_: &[Value], _: &Kwargs| Ok(Value::None));
        assert_eq!(fun_sourceinfo(&unnamed), "<unknown>");
    }

    #[test]
    fn test_explicit_location() {
        let f = identity().with_location(SourceLocation { file: "model.rs".into(), line: 12 });
        assert_eq!(fun_sourceinfo(&f), "identity at model.rs:12");
    }

    #[test]
    fn test_signature_optional() {
        let f = identity();
        assert!(fun_signature(&f).is_none());
        let f = f.with_signature("x".parse().unwrap());
        assert_eq!(fun_signature(&f).unwrap().len(), 1);
    }

    #[test]
    fn test_arc_callable() {
        let f: Arc<dyn Callable> = Arc::new(identity());
        assert_eq!(f.call(&[Value::Int(4)], &Kwargs::new()), Ok(Value::Int(4)));
        assert_eq!(f.name(), "identity");
    }
}
