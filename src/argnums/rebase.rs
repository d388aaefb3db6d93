//! Rebasing donated argnums past static arguments.

use std::collections::BTreeSet;

use super::normalize::sorted_unique;
use crate::error::{Error, Result};

/// Shift `donate_argnums` to index into the argument list with the static
/// arguments removed.
///
/// Both inputs are sorted and deduplicated first; the result is sorted.
///
/// # Examples
///
/// ```
/// use jax_argspec::argnums::rebase_donate_argnums;
///
/// assert_eq!(rebase_donate_argnums(&[3, 4], &[0, 1]).unwrap(), vec![1, 2]);
/// assert!(rebase_donate_argnums(&[1], &[1]).is_err());
/// ```
pub fn rebase_donate_argnums(donate_argnums: &[i64], static_argnums: &[i64]) -> Result<Vec<i64>> {
    let donate = sorted_unique(donate_argnums.to_vec());
    if donate.is_empty() {
        return Ok(donate);
    }
    let statics = sorted_unique(static_argnums.to_vec());
    // Both lists are sorted, so a negative index would come first.
    if donate[0] < 0 || statics.first().is_some_and(|&s| s < 0) {
        return Err(Error::NegativeArgnums {
            static_argnums: statics,
            donate_argnums: donate,
        });
    }
    if statics.is_empty() {
        return Ok(donate);
    }

    let (mut i, mut offset) = (0, 0);
    let mut out = Vec::with_capacity(donate.len());
    for &d in &donate {
        while i < statics.len() && statics[i] < d {
            offset += 1;
            i += 1;
        }
        if i < statics.len() && statics[i] == d {
            return Err(Error::ArgnumsIntersect {
                static_argnums: statics,
                donate_argnums: donate,
            });
        }
        out.push(d - offset);
    }
    Ok(out)
}

/// Fail if any name is both static and donated.
pub fn assert_no_intersection(static_argnames: &[String], donate_argnames: &[String]) -> Result<()> {
    let statics: BTreeSet<&String> = static_argnames.iter().collect();
    let both: Vec<String> = donate_argnames
        .iter()
        .filter(|n| statics.contains(n))
        .cloned()
        .collect();
    if both.is_empty() {
        Ok(())
    } else {
        Err(Error::ArgnamesIntersect { names: sorted_unique(both) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rebase() {
        assert_eq!(rebase_donate_argnums(&[3, 4], &[0, 1]).unwrap(), vec![1, 2]);
        assert_eq!(rebase_donate_argnums(&[1], &[0]).unwrap(), vec![0]);
        assert_eq!(rebase_donate_argnums(&[0, 2, 5], &[1, 3]).unwrap(), vec![0, 1, 3]);
        assert_eq!(rebase_donate_argnums(&[0], &[4]).unwrap(), vec![0]);
    }

    #[test]
    fn test_rebase_empty() {
        assert_eq!(rebase_donate_argnums(&[], &[0, 1]).unwrap(), Vec::<i64>::new());
        assert_eq!(rebase_donate_argnums(&[2, 1, 2], &[]).unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_rebase_rejects_negative_indices() {
        let err = rebase_donate_argnums(&[-1], &[]).unwrap_err();
        assert_eq!(
            err,
            Error::NegativeArgnums { static_argnums: vec![], donate_argnums: vec![-1] }
        );
        assert!(rebase_donate_argnums(&[1], &[-1]).is_err());
        // Negative static indices are fine when nothing is donated.
        assert_eq!(rebase_donate_argnums(&[], &[-1]).unwrap(), Vec::<i64>::new());
    }

    #[test]
    fn test_rebase_intersection() {
        let err = rebase_donate_argnums(&[0, 2], &[2]).unwrap_err();
        assert_eq!(
            err,
            Error::ArgnumsIntersect { static_argnums: vec![2], donate_argnums: vec![0, 2] }
        );
    }

    #[test]
    fn test_names_intersection() {
        let a = vec!["x".to_string(), "y".to_string()];
        let b = vec!["y".to_string()];
        let c = vec!["z".to_string()];
        assert!(assert_no_intersection(&a, &c).is_ok());
        assert_eq!(
            assert_no_intersection(&a, &b).unwrap_err(),
            Error::ArgnamesIntersect { names: vec!["y".to_string()] }
        );
    }
}
