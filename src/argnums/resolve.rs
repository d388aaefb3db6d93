//! The argnum/argname resolution entry point.

use tracing::debug;

use super::normalize::{ensure_index_tuple, ensure_str_tuple, infer_argnums_and_argnames, sorted_unique};
use super::rebase::{assert_no_intersection, rebase_donate_argnums};
use super::validate::{validate_argnames, validate_argnums};
use crate::error::{Error, Result};
use crate::function::Callable;
use crate::signature::Signature;
use crate::value::Value;

/// Raw argument-role options, as given to `jit`.
///
/// Each field may be unset, a single value (`Value::Int` / `Value::Str`) or
/// a tuple or list of them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgRoles {
    /// Positions of donated arguments.
    pub donate_argnums: Option<Value>,
    /// Names of donated arguments.
    pub donate_argnames: Option<Value>,
    /// Positions of static arguments.
    pub static_argnums: Option<Value>,
    /// Names of static arguments.
    pub static_argnames: Option<Value>,
}

impl ArgRoles {
    /// No roles: every argument is dynamic and nothing is donated.
    pub fn new() -> Self {
        Self::default()
    }

    /// Donate the arguments at these positions.
    pub fn donate_argnums(mut self, argnums: impl Into<Value>) -> Self {
        self.donate_argnums = Some(argnums.into());
        self
    }

    /// Donate the arguments with these names.
    pub fn donate_argnames(mut self, argnames: impl Into<Value>) -> Self {
        self.donate_argnames = Some(argnames.into());
        self
    }

    /// Treat the arguments at these positions as static.
    pub fn static_argnums(mut self, argnums: impl Into<Value>) -> Self {
        self.static_argnums = Some(argnums.into());
        self
    }

    /// Treat the arguments with these names as static.
    pub fn static_argnames(mut self, argnames: impl Into<Value>) -> Self {
        self.static_argnames = Some(argnames.into());
        self
    }
}

/// Completed and validated argument roles.
///
/// `donate_argnums` index the dynamic arguments, i.e. the positional
/// arguments left once static ones are removed. The other fields index or
/// name the original parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ResolvedArgnums {
    /// Donated positions, rebased onto the dynamic arguments.
    pub donate_argnums: Vec<i64>,
    /// Names of donated parameters.
    pub donate_argnames: Vec<String>,
    /// Static positions in the full argument list.
    pub static_argnums: Vec<i64>,
    /// Names of static parameters.
    pub static_argnames: Vec<String>,
}

/// Validate and complete the argnum/argname specification for a jit.
///
/// * fills in missing pieces (names from numbers and vice versa),
/// * validates names and numbers against the signature,
/// * checks donated and static arguments do not intersect,
/// * rebases donated argnums onto the dynamic arguments.
///
/// Without a signature nothing is inferred or validated, and
/// `donate_argnames` is rejected since names cannot be mapped to positions.
///
/// # Examples
///
/// ```
/// use jax_argspec::{resolve_argnums, ArgRoles, Function, Kwargs, Value};
///
/// let sig = "a, b, *, c".parse().unwrap();
/// let f = Function::new("f", |_: &[Value], _: &Kwargs| Ok(Value::None));
/// let roles = ArgRoles::new().static_argnums(0).donate_argnums(1);
/// let resolved = resolve_argnums(&f, Some(&sig), &roles).unwrap();
/// assert_eq!(resolved.static_argnums, vec![0]);
/// assert_eq!(resolved.donate_argnums, vec![0]);
/// // Names are inferred for positional-or-keyword parameters.
/// assert_eq!(resolved.static_argnames, vec!["a"]);
/// assert_eq!(resolved.donate_argnames, vec!["b"]);
/// ```
pub fn resolve_argnums(
    fun: &dyn Callable,
    signature: Option<&Signature>,
    roles: &ArgRoles,
) -> Result<ResolvedArgnums> {
    let (static_argnums, static_argnames, donate_argnums, donate_argnames) = match signature {
        None => {
            if roles.donate_argnames.is_some() {
                return Err(Error::SignatureUnavailable { fun: fun.name().to_string() });
            }
            (
                optional_indices(roles.static_argnums.as_ref())?,
                optional_names(roles.static_argnames.as_ref())?,
                optional_indices(roles.donate_argnums.as_ref())?,
                Vec::new(),
            )
        }
        Some(sig) => {
            let static_nums = wrap_negative_argnums(sig, roles.static_argnums.as_ref(), "static_argnums")?;
            let donate_nums = wrap_negative_argnums(sig, roles.donate_argnums.as_ref(), "donate_argnums")?;
            let (static_argnums, static_argnames) =
                infer_argnums_and_argnames(sig, static_nums.as_ref(), roles.static_argnames.as_ref())?;
            let (donate_argnums, donate_argnames) =
                infer_argnums_and_argnames(sig, donate_nums.as_ref(), roles.donate_argnames.as_ref())?;

            validate_argnums(sig, &static_argnums, "static_argnums")?;
            validate_argnames(sig, &static_argnames, "static_argnames")?;
            validate_argnums(sig, &donate_argnums, "donate_argnums")?;
            validate_argnames(sig, &donate_argnames, "donate_argnames")?;
            (static_argnums, static_argnames, donate_argnums, donate_argnames)
        }
    };

    assert_no_intersection(&static_argnames, &donate_argnames)?;
    let donate_argnums = rebase_donate_argnums(&donate_argnums, &static_argnums)?;

    let resolved = ResolvedArgnums { donate_argnums, donate_argnames, static_argnums, static_argnames };
    debug!(
        fun = fun.name(),
        has_signature = signature.is_some(),
        ?resolved,
        "resolved argnums"
    );
    Ok(resolved)
}

/// Validate `argnums` and wrap negative indices around the positional
/// parameters. With `*args` the positional count is open, so negative
/// indices are left as given.
fn wrap_negative_argnums(
    sig: &Signature,
    argnums: Option<&Value>,
    field: &'static str,
) -> Result<Option<Value>> {
    let Some(argnums) = argnums else {
        return Ok(None);
    };
    let mut nums = ensure_index_tuple(argnums)?;
    validate_argnums(sig, &nums, field)?;
    if !sig.has_var_positional() {
        let n = sig.num_positional() as i64;
        for i in nums.iter_mut().filter(|i| **i < 0) {
            *i += n;
        }
    }
    Ok(Some(Value::tuple(nums)))
}

fn optional_indices(x: Option<&Value>) -> Result<Vec<i64>> {
    x.map_or(Ok(Vec::new()), |v| ensure_index_tuple(v).map(sorted_unique))
}

fn optional_names(x: Option<&Value>) -> Result<Vec<String>> {
    x.map_or(Ok(Vec::new()), |v| ensure_str_tuple(v).map(sorted_unique))
}
