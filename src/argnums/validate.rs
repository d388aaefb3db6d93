//! Checking argnums and argnames against a signature.

use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::signature::{ParameterKind, Signature};

/// Check that `argnums` index positional parameters of `sig`.
///
/// For functions that accept a variable number of positional arguments
/// (`f(..., *args)`) every argnum is considered valid.
pub fn validate_argnums(sig: &Signature, argnums: &[i64], field: &'static str) -> Result<()> {
    let mut n_pos_args = 0usize;
    for param in sig.parameters() {
        match param.kind() {
            ParameterKind::PositionalOnly | ParameterKind::PositionalOrKeyword => n_pos_args += 1,
            ParameterKind::VarPositional => return Ok(()),
            _ => {}
        }
    }

    let n = n_pos_args as i64;
    let (Some(&min), Some(&max)) = (argnums.iter().min(), argnums.iter().max()) else {
        return Ok(());
    };
    if min < -n || max >= n {
        return Err(Error::InvalidArgnums { field, argnums: argnums.to_vec(), n_pos_args });
    }
    Ok(())
}

/// Check that `argnames` name keyword-passable parameters of `sig`.
///
/// Positional-only and `*args` names are always rejected. Any other name is
/// accepted when the function takes `**kwargs`.
pub fn validate_argnames(sig: &Signature, argnames: &[String], field: &'static str) -> Result<()> {
    let mut var_kwargs = false;
    let mut valid: BTreeSet<&str> = BTreeSet::new();
    let mut invalid: BTreeSet<&str> = BTreeSet::new();
    for param in sig.parameters() {
        match param.kind() {
            ParameterKind::PositionalOrKeyword | ParameterKind::KeywordOnly => {
                valid.insert(param.name());
            }
            ParameterKind::VarKeyword => var_kwargs = true,
            ParameterKind::PositionalOnly | ParameterKind::VarPositional => {
                invalid.insert(param.name());
            }
        }
    }

    let requested: BTreeSet<&str> = argnames.iter().map(String::as_str).collect();

    let positional_only: Vec<String> =
        requested.intersection(&invalid).map(|s| s.to_string()).collect();
    if !positional_only.is_empty() {
        return Err(Error::InvalidArgnames {
            field,
            names: positional_only,
            reason: "These are positional-only",
        });
    }

    if var_kwargs {
        return Ok(());
    }

    let unknown: Vec<String> = requested.difference(&valid).map(|s| s.to_string()).collect();
    if !unknown.is_empty() {
        return Err(Error::InvalidArgnames {
            field,
            names: unknown,
            reason: "Function does not take these args.",
        });
    }
    Ok(())
}
