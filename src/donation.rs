//! Donation vectors and positional resolution of keyword arguments.

use crate::error::{Error, Result};
use crate::function::Callable;
use crate::value::{Kwargs, Value};

/// One flag per flattened leaf of `(args, kwargs)`: true where the leaf
/// belongs to a donated argument.
///
/// Positional arguments come first, then keyword arguments in key order.
/// `donate_argnums` index `args`; `donate_argnames` name keys of `kwargs`.
///
/// # Examples
///
/// ```
/// use jax_argspec::{donation_vector, Kwargs, Value};
///
/// let args = vec![Value::tuple([1, 2]), Value::Int(3)];
/// let mut kwargs = Kwargs::new();
/// kwargs.insert("w".into(), Value::Int(4));
/// let v = donation_vector(&[0], &["w".to_string()], &args, &kwargs);
/// assert_eq!(v, vec![true, true, false, true]);
/// ```
pub fn donation_vector(
    donate_argnums: &[i64],
    donate_argnames: &[String],
    args: &[Value],
    kwargs: &Kwargs,
) -> Vec<bool> {
    let mut res = Vec::new();
    for (i, arg) in args.iter().enumerate() {
        let donate = donate_argnums.contains(&(i as i64));
        res.extend(std::iter::repeat(donate).take(arg.num_leaves()));
    }
    for (key, val) in kwargs {
        let donate = donate_argnames.contains(key);
        res.extend(std::iter::repeat(donate).take(val.num_leaves()));
    }
    res
}

/// Resolve `(args, kwargs)` to a purely positional argument list using
/// `fun`'s signature, with defaults applied.
///
/// Fails with [`Error::Type`] if a keyword argument the caller passed can
/// only be passed by keyword, and with [`Error::Binding`] if the arguments
/// do not match the signature. A function without a signature accepts
/// anything but keyword arguments.
pub fn resolve_kwargs(fun: &dyn Callable, args: &[Value], kwargs: &Kwargs) -> Result<Vec<Value>> {
    let Some(sig) = fun.signature() else {
        if kwargs.is_empty() {
            return Ok(args.to_vec());
        }
        return Err(unresolved(kwargs.keys()));
    };
    let mut ba = sig.bind(args, kwargs)?;
    ba.apply_defaults();
    let bound_kwargs = ba.kwargs();
    let passed: Vec<&String> = bound_kwargs.keys().filter(|k| kwargs.contains_key(*k)).collect();
    if !passed.is_empty() {
        return Err(unresolved(passed.into_iter()));
    }
    Ok(ba.args())
}

fn unresolved<'a>(keys: impl Iterator<Item = &'a String>) -> Error {
    let keys: Vec<&str> = keys.map(String::as_str).collect();
    Error::Type(format!(
        "The following keyword arguments could not be resolved to positions: {}",
        keys.join(", ")
    ))
}
