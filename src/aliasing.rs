//! Checks that a mutable array reference reaches a function only once.

use std::collections::{HashMap, HashSet};

use crate::debug_info::DebugInfo;
use crate::error::{Error, Result};
use crate::value::{MutableRef, Value};

fn flat_refs(args: &[Value]) -> Vec<Option<&MutableRef>> {
    args.iter()
        .flat_map(|a| a.leaves())
        .map(|leaf| match leaf {
            Value::Ref(r) => Some(r),
            _ => None,
        })
        .collect()
}

/// Fail if the same mutable array reference appears at two argument leaves.
///
/// `dbg.arg_names` name the flattened leaves of `args`.
pub fn check_no_aliased_ref_args(dbg: Option<&DebugInfo>, args: &[Value]) -> Result<()> {
    let mut seen: HashMap<usize, usize> = HashMap::new();
    for (i, leaf) in flat_refs(args).into_iter().enumerate() {
        let Some(r) = leaf else { continue };
        let dup = *seen.entry(r.id()).or_insert(i);
        if dup == i {
            continue;
        }
        let msg = match dbg {
            Some(dbg) => format!(
                "only one reference to a mutable array may be passed as an argument \
                 to a function, but when tracing {} for {} the mutable array reference \
                 of type {} appeared at both {} and {}.",
                dbg.func_src_info,
                dbg.traced_for,
                r.str_short(),
                leaf_name(dbg, dup),
                leaf_name(dbg, i),
            ),
            None => format!(
                "only one reference to a mutable array may be passed as an argument \
                 to a function, but the mutable array reference of type {} appeared \
                 at both flat index {dup} and flat index {i}.",
                r.str_short()
            ),
        };
        return Err(Error::AliasedRef(msg));
    }
    Ok(())
}

fn leaf_name(dbg: &DebugInfo, i: usize) -> String {
    match dbg.arg_names.get(i) {
        Some(name) if !name.is_empty() => name.clone(),
        _ => format!("flat index {i}"),
    }
}

/// Fail if a mutable array reference is both closed over (`consts`) and
/// passed as an argument.
pub fn check_no_aliased_closed_over_refs(
    dbg: Option<&DebugInfo>,
    consts: &[Value],
    args: &[Value],
) -> Result<()> {
    let closed_over: HashSet<usize> = flat_refs(consts).into_iter().flatten().map(MutableRef::id).collect();
    for (i, leaf) in flat_refs(args).into_iter().enumerate() {
        let Some(r) = leaf else { continue };
        if !closed_over.contains(&r.id()) {
            continue;
        }
        let msg = match dbg {
            Some(dbg) => format!(
                "when tracing {} for {}, a mutable array reference of type {} was both \
                 closed over and passed as the argument {}",
                dbg.func_src_info,
                dbg.traced_for,
                r.str_short(),
                leaf_name(dbg, i),
            ),
            None => format!(
                "a mutable array reference of type {} was both closed over and passed \
                 as the argument at flat index {i}",
                r.str_short()
            ),
        };
        return Err(Error::AliasedRef(msg));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ArrayValue;

    fn new_ref() -> MutableRef {
        MutableRef::new(ArrayValue::from_vec(vec![0.0; 3], vec![3]))
    }

    fn dbg(names: &[&str]) -> DebugInfo {
        DebugInfo {
            traced_for: "jit".into(),
            func_src_info: "step at train.rs:10".into(),
            arg_names: names.iter().map(|s| s.to_string()).collect(),
            result_paths: None,
        }
    }

    #[test]
    fn test_distinct_refs_ok() {
        let args = vec![Value::from(new_ref()), Value::from(new_ref()), Value::Int(1)];
        assert!(check_no_aliased_ref_args(None, &args).is_ok());
    }

    #[test]
    fn test_aliased_refs_named() {
        let r = new_ref();
        let args = vec![Value::from(r.clone()), Value::tuple([Value::Int(0), Value::from(r)])];
        let d = dbg(&["x", "pair[0]", "pair[1]"]);
        let err = check_no_aliased_ref_args(Some(&d), &args).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("when tracing step at train.rs:10 for jit"));
        assert!(msg.contains("Ref{f32[3]}"));
        assert!(msg.contains("appeared at both x and pair[1]"));
    }

    #[test]
    fn test_aliased_refs_without_debug_info() {
        let r = new_ref();
        let args = vec![Value::from(r.clone()), Value::from(r)];
        let err = check_no_aliased_ref_args(None, &args).unwrap_err();
        assert!(err.to_string().contains("at both flat index 0 and flat index 1"));
    }

    #[test]
    fn test_closed_over_refs() {
        let r = new_ref();
        let consts = vec![Value::from(r.clone())];
        assert!(check_no_aliased_closed_over_refs(None, &consts, &[Value::from(new_ref())]).is_ok());
        let d = dbg(&["a", "b"]);
        let err = check_no_aliased_closed_over_refs(Some(&d), &consts, &[Value::Int(1), Value::from(r)])
            .unwrap_err();
        assert!(err.to_string().ends_with("passed as the argument b"));
    }
}
