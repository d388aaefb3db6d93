//! Recovering a precise error when a jitted output holds NaN or Inf.

use std::fmt;

use tracing::warn;

use crate::error::Error;
use crate::function::Callable;
use crate::value::{InvalidKind, Kwargs, Value};

/// An invalid value found in the output of a jitted function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidValue {
    /// Name of the function that produced it.
    pub name: String,
    /// Whether a NaN or an Inf was found.
    pub kind: InvalidKind,
}

impl fmt::Display for InvalidValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid value ({}) encountered in {}", self.kind, self.name)
    }
}

/// Look for an invalid value in `output` according to the enabled checks.
pub fn check_output(name: &str, output: &Value, nans: bool, infs: bool) -> Option<InvalidValue> {
    output
        .find_invalid(nans, infs)
        .map(|kind| InvalidValue { name: name.to_string(), kind })
}

/// Re-run the de-optimized `fun` to find where `err` came from.
///
/// Always produces an error:
/// * the de-optimized call's own error, if it fails;
/// * a floating-point error if its output is also invalid;
/// * otherwise an error explaining that the invalid value most likely comes
///   from `jit` optimizations.
pub fn maybe_recursive_nan_check(
    err: &InvalidValue,
    fun: &dyn Callable,
    args: &[Value],
    kwargs: &Kwargs,
    nans: bool,
    infs: bool,
) -> Error {
    warn!(
        fun = fun.name(),
        "Invalid {} value encountered in the output of a jit function. \
         Calling the de-optimized version.",
        err.kind
    );
    match fun.call(args, kwargs) {
        Err(e) => Error::Call(e),
        Ok(output) => match check_output(fun.name(), &output, nans, infs) {
            Some(invalid) => Error::FloatingPoint(invalid.to_string()),
            None => no_invalid_in_deoptimized(err),
        },
    }
}

fn no_invalid_in_deoptimized(err: &InvalidValue) -> Error {
    Error::FloatingPoint(format!(
        "{err}. Because debug_nans and/or debug_infs is set, the de-optimized \
         function (i.e., the function as if the `jit` decorator were removed) was \
         called in an attempt to get a more precise error message. However, the \
         de-optimized function did not produce invalid values during its \
         execution. This behavior can result from `jit` optimizations causing \
         the invalid value to be produced. It may also arise from having nan/inf \
         literals as inputs or outputs.\n\n\
         It may be possible to avoid the invalid value by removing the `jit` \
         decorator, at the cost of losing optimizations."
    ))
}
