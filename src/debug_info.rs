//! Provenance records for traced functions.

use std::collections::BTreeSet;

use crate::error::Result;
use crate::function::{fun_sourceinfo, Callable};
use crate::signature::Signature;
use crate::value::{Kwargs, Value};
use crate::wrapped::ensure_inbounds;

/// Where a traced function came from and what its arguments are called.
///
/// Only used to make error messages point at user code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugInfo {
    /// The transformation being applied, e.g. `"jit"`.
    pub traced_for: String,
    /// `"name at file:line"`, see [`fun_sourceinfo`].
    pub func_src_info: String,
    /// One name per flattened, non-static argument leaf.
    pub arg_names: Vec<String>,
    /// One name per flattened result leaf, once known.
    pub result_paths: Option<Vec<String>>,
}

impl DebugInfo {
    /// Function name without the location suffix.
    pub fn func_name(&self) -> &str {
        self.func_src_info
            .split_once(" at ")
            .map_or(self.func_src_info.as_str(), |(name, _)| name)
    }

    /// `arg_names` if there are exactly `expected` of them, otherwise
    /// `expected` empty names.
    pub fn safe_arg_names(&self, expected: usize) -> Vec<String> {
        if self.arg_names.len() == expected {
            self.arg_names.clone()
        } else {
            vec![String::new(); expected]
        }
    }

    /// Record the result leaf names.
    pub fn with_result_paths(mut self, paths: Vec<String>) -> Self {
        self.result_paths = Some(paths);
        self
    }
}

/// Leaf names of a function result: `result`, `result[0]`, `result['k']`.
pub fn result_paths(result: &Value) -> Vec<String> {
    result
        .key_paths()
        .into_iter()
        .map(|(path, _)| format!("result{path}"))
        .collect()
}

/// Build a [`DebugInfo`] from example arguments.
///
/// `args` and `kwargs` include the static arguments, which are designated
/// by `static_argnums` and `static_argnames` and left out of `arg_names`.
/// `sourceinfo` and `signature` default to the callable's own.
#[allow(clippy::too_many_arguments)]
pub fn debug_info(
    traced_for: &str,
    fun: &dyn Callable,
    args: &[Value],
    kwargs: &Kwargs,
    static_argnums: &[i64],
    static_argnames: &[String],
    sourceinfo: Option<String>,
    signature: Option<&Signature>,
) -> Result<DebugInfo> {
    let func_src_info = sourceinfo.unwrap_or_else(|| fun_sourceinfo(fun));
    let signature = signature.or_else(|| fun.signature());
    let arg_names = non_static_arg_names(signature, args, kwargs, static_argnums, static_argnames)?;
    Ok(DebugInfo {
        traced_for: traced_for.to_string(),
        func_src_info,
        arg_names,
        result_paths: None,
    })
}

/// Names of the non-static argument leaves.
///
/// With a signature that accepts the arguments, top-level names are the
/// parameter names: positional parameters first, then keyword arguments
/// sorted by key, where keys absorbed by `**kwargs` read `kwargs['k']`.
/// Otherwise names are `args[i]` and `kwargs['k']`.
pub fn non_static_arg_names(
    signature: Option<&Signature>,
    args: &[Value],
    kwargs: &Kwargs,
    static_argnums: &[i64],
    static_argnames: &[String],
) -> Result<Vec<String>> {
    // Static arguments are replaced by None, which flattens to no leaves.
    let statics: BTreeSet<usize> = ensure_inbounds(true, args.len(), static_argnums)?.into_iter().collect();
    let masked_args: Vec<Value> = args
        .iter()
        .enumerate()
        .map(|(i, x)| if statics.contains(&i) { Value::None } else { x.clone() })
        .collect();
    let masked_kwargs: Kwargs = kwargs
        .iter()
        .map(|(k, x)| {
            let v = if static_argnames.contains(k) { Value::None } else { x.clone() };
            (k.clone(), v)
        })
        .collect();

    let bound = signature.and_then(|sig| {
        let ba = sig.bind(&masked_args, &masked_kwargs).ok()?;
        let kwargs_name = sig.var_keyword_name();
        let mut ordered: Vec<(String, Value)> = ba
            .arguments()
            .iter()
            .filter(|(name, _)| !kwargs.contains_key(name) && Some(name.as_str()) != kwargs_name)
            .map(|(name, v)| (name.clone(), v.to_value()))
            .collect();
        for (name, x) in &masked_kwargs {
            let shown = if ba.contains(name) {
                name.clone()
            } else {
                format!("{}['{name}']", kwargs_name.unwrap_or("kwargs"))
            };
            ordered.push((shown, x.clone()));
        }
        Some(ordered)
    });

    let ordered = bound.unwrap_or_else(|| {
        let mut ordered = vec![("args".to_string(), Value::Tuple(masked_args.clone()))];
        ordered.extend(
            masked_kwargs
                .iter()
                .map(|(name, x)| (format!("kwargs['{name}']"), x.clone())),
        );
        ordered
    });

    Ok(ordered
        .iter()
        .flat_map(|(name, x)| {
            x.key_paths()
                .into_iter()
                .map(move |(path, _)| format!("{name}{path}"))
        })
        .collect())
}
