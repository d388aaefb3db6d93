//! Normalization of user-supplied argnums and argnames.

use crate::error::{Error, Result};
use crate::signature::{ParameterKind, Signature};
use crate::value::Value;

/// An index or a tuple of indices, as accepted by `argnums` options.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndexSpec {
    /// A single index.
    One(i64),
    /// A tuple or list of indices.
    Many(Vec<i64>),
}

impl IndexSpec {
    /// All indices, in the given order.
    pub fn to_vec(&self) -> Vec<i64> {
        match self {
            IndexSpec::One(i) => vec![*i],
            IndexSpec::Many(v) => v.clone(),
        }
    }
}

/// Convert `x` to a single index or a tuple of indices.
pub fn ensure_index(x: &Value) -> Result<IndexSpec> {
    match x.as_index() {
        Some(i) => Ok(IndexSpec::One(i)),
        None => index_items(x).map(IndexSpec::Many),
    }
}

/// Convert `x` to a tuple of indices. A single index becomes a singleton.
pub fn ensure_index_tuple(x: &Value) -> Result<Vec<i64>> {
    match x.as_index() {
        Some(i) => Ok(vec![i]),
        None => index_items(x),
    }
}

fn index_items(x: &Value) -> Result<Vec<i64>> {
    match x {
        Value::Tuple(items) | Value::List(items) => items
            .iter()
            .map(|item| {
                item.as_index().ok_or_else(|| {
                    Error::Type(format!(
                        "'{}' object cannot be interpreted as an integer",
                        item.type_name()
                    ))
                })
            })
            .collect(),
        other => Err(Error::Type(format!(
            "expected a static index or sequence of indices, got {} of type {}",
            other,
            other.type_name()
        ))),
    }
}

/// Convert `x` to a name, failing for anything but a string.
pub fn ensure_str(x: &Value) -> Result<String> {
    x.as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::Type(format!("argument is not a string: {x}")))
}

/// Convert `x` to a tuple of names. A single string becomes a singleton.
pub fn ensure_str_tuple(x: &Value) -> Result<Vec<String>> {
    match x {
        Value::Str(s) => Ok(vec![s.clone()]),
        Value::Tuple(items) | Value::List(items) => items.iter().map(ensure_str).collect(),
        other => Err(Error::Type(format!(
            "expected a string or sequence of strings, got {} of type {}",
            other,
            other.type_name()
        ))),
    }
}

pub(crate) fn sorted_unique<T: Ord>(mut items: Vec<T>) -> Vec<T> {
    items.sort();
    items.dedup();
    items
}

/// Fill in whichever of `argnums`/`argnames` is missing using `sig`.
///
/// Only positional-or-keyword parameters are matched: a positional-only or
/// keyword-only parameter named on one side never shows up on the other.
/// Both results are sorted and deduplicated.
pub fn infer_argnums_and_argnames(
    sig: &Signature,
    argnums: Option<&Value>,
    argnames: Option<&Value>,
) -> Result<(Vec<i64>, Vec<String>)> {
    let (argnums, argnames) = match (argnums, argnames) {
        (None, None) => return Ok((Vec::new(), Vec::new())),
        (Some(nums), Some(names)) => (ensure_index_tuple(nums)?, ensure_str_tuple(names)?),
        (None, Some(names)) => {
            let names = ensure_str_tuple(names)?;
            let nums = sig
                .parameters()
                .iter()
                .enumerate()
                .filter(|(_, p)| {
                    p.kind() == ParameterKind::PositionalOrKeyword
                        && names.iter().any(|n| n == p.name())
                })
                .map(|(i, _)| i as i64)
                .collect();
            (nums, names)
        }
        (Some(nums), None) => {
            let nums = ensure_index_tuple(nums)?;
            let names = sig
                .parameters()
                .iter()
                .enumerate()
                .filter(|(i, p)| {
                    p.kind() == ParameterKind::PositionalOrKeyword && nums.contains(&(*i as i64))
                })
                .map(|(_, p)| p.name().to_string())
                .collect();
            (nums, names)
        }
    };
    Ok((sorted_unique(argnums), sorted_unique(argnames)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(s: &str) -> Signature {
        s.parse().unwrap()
    }

    #[test]
    fn test_ensure_index_tuple() {
        assert_eq!(ensure_index_tuple(&Value::Int(3)).unwrap(), vec![3]);
        assert_eq!(ensure_index_tuple(&Value::Bool(true)).unwrap(), vec![1]);
        assert_eq!(ensure_index_tuple(&Value::tuple([2, 0])).unwrap(), vec![2, 0]);
        assert_eq!(ensure_index_tuple(&Value::list([1])).unwrap(), vec![1]);
        assert!(matches!(ensure_index_tuple(&Value::Float(1.0)), Err(Error::Type(_))));
        assert!(matches!(ensure_index_tuple(&Value::from("a")), Err(Error::Type(_))));
        assert!(matches!(
            ensure_index_tuple(&Value::tuple([Value::Int(0), Value::Float(1.5)])),
            Err(Error::Type(_))
        ));
    }

    #[test]
    fn test_ensure_index() {
        assert_eq!(ensure_index(&Value::Int(-1)).unwrap(), IndexSpec::One(-1));
        assert_eq!(ensure_index(&Value::tuple([0, 1])).unwrap(), IndexSpec::Many(vec![0, 1]));
        assert_eq!(IndexSpec::One(4).to_vec(), vec![4]);
    }

    #[test]
    fn test_ensure_str_tuple() {
        assert_eq!(ensure_str_tuple(&Value::from("a")).unwrap(), vec!["a"]);
        assert_eq!(ensure_str_tuple(&Value::tuple(["a", "b"])).unwrap(), vec!["a", "b"]);
        assert!(matches!(ensure_str_tuple(&Value::Int(1)), Err(Error::Type(_))));
        assert!(matches!(
            ensure_str_tuple(&Value::tuple([Value::from("a"), Value::Int(1)])),
            Err(Error::Type(_))
        ));
    }

    #[test]
    fn test_both_unset() {
        let (nums, names) = infer_argnums_and_argnames(&sig("a, b"), None, None).unwrap();
        assert!(nums.is_empty());
        assert!(names.is_empty());
    }

    #[test]
    fn test_infer_argnums_from_argnames() {
        let names = Value::tuple(["b"]);
        let (nums, names) = infer_argnums_and_argnames(&sig("a, b, c"), None, Some(&names)).unwrap();
        assert_eq!(nums, vec![1]);
        assert_eq!(names, vec!["b"]);
    }

    #[test]
    fn test_infer_argnames_from_argnums() {
        let nums = Value::tuple([2, 0, 2]);
        let (nums, names) = infer_argnums_and_argnames(&sig("a, b, c"), Some(&nums), None).unwrap();
        assert_eq!(nums, vec![0, 2]);
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn test_only_positional_or_keyword_inferred() {
        let s = sig("a, /, b, *, c");
        let names = Value::tuple(["a", "b", "c"]);
        let (nums, _) = infer_argnums_and_argnames(&s, None, Some(&names)).unwrap();
        assert_eq!(nums, vec![1]);

        let nums = Value::tuple([0, 1, 2]);
        let (_, names) = infer_argnums_and_argnames(&s, Some(&nums), None).unwrap();
        assert_eq!(names, vec!["b"]);
    }

    #[test]
    fn test_both_set_are_independent() {
        let nums = Value::Int(0);
        let names = Value::from("c");
        let (nums, names) =
            infer_argnums_and_argnames(&sig("a, b, c"), Some(&nums), Some(&names)).unwrap();
        assert_eq!(nums, vec![0]);
        assert_eq!(names, vec!["c"]);
    }
}
