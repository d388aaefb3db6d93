//! Property-based tests for jax-argspec using proptest.
//!
//! These tests generate random argument roles and values and check the
//! invariants of resolution, rebasing and static-argument boxing.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use jax_argspec::argnums::{
    infer_argnums_and_argnames, rebase_donate_argnums, validate_argnames, validate_argnums,
};
use jax_argspec::{
    resolve_argnums, ArgRoles, Error, Function, HashBox, Kwargs, Parameter, Signature, Value,
};
use proptest::prelude::*;

// =============================================================================
// GENERATORS
// =============================================================================

/// Disjoint `(static_argnums, donate_argnums)` over the first 24 positions.
fn arb_disjoint_roles() -> impl Strategy<Value = (Vec<i64>, Vec<i64>)> {
    prop::collection::vec(0u8..3, 0..24).prop_map(|roles| {
        let mut statics = Vec::new();
        let mut donated = Vec::new();
        for (i, role) in roles.into_iter().enumerate() {
            match role {
                1 => statics.push(i as i64),
                2 => donated.push(i as i64),
                _ => {}
            }
        }
        (statics, donated)
    })
}

/// Roles with at least one index both static and donated.
fn arb_overlapping_roles() -> impl Strategy<Value = (Vec<i64>, Vec<i64>, i64)> {
    (
        prop::collection::vec(0i64..24, 0..8),
        prop::collection::vec(0i64..24, 0..8),
        0i64..24,
    )
        .prop_map(|(mut statics, mut donated, shared)| {
            statics.push(shared);
            donated.push(shared);
            (statics, donated, shared)
        })
}

/// Roles over `n` positional parameters, each index written either as
/// `i` or as `i - n`.
///
/// Yields `(n, static_given, donate_given, static_positions, donate_positions)`.
#[allow(clippy::type_complexity)]
fn arb_signed_roles() -> impl Strategy<Value = (usize, Vec<i64>, Vec<i64>, Vec<i64>, Vec<i64>)> {
    prop::collection::vec((0u8..3, any::<bool>()), 1..12).prop_map(|roles| {
        let n = roles.len();
        let (mut static_given, mut donate_given) = (Vec::new(), Vec::new());
        let (mut statics, mut donated) = (Vec::new(), Vec::new());
        for (i, (role, negative)) in roles.into_iter().enumerate() {
            let i = i as i64;
            let given = if negative { i - n as i64 } else { i };
            match role {
                1 => {
                    static_given.push(given);
                    statics.push(i);
                }
                2 => {
                    donate_given.push(given);
                    donated.push(i);
                }
                _ => {}
            }
        }
        (n, static_given, donate_given, statics, donated)
    })
}

/// A hashable scalar value.
fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::None),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        (-1e6f64..1e6).prop_map(Value::Float),
        "[a-z]{0,8}".prop_map(Value::Str),
    ]
}

/// A hashable value: scalars and tuples of them.
fn arb_hashable() -> impl Strategy<Value = Value> {
    arb_scalar().prop_recursive(3, 16, 4, |inner| {
        prop::collection::vec(inner, 0..4).prop_map(Value::Tuple)
    })
}

fn hash_of(b: &HashBox) -> u64 {
    let mut h = DefaultHasher::new();
    b.hash(&mut h);
    h.finish()
}

fn names(prefix: &str, n: usize) -> Vec<String> {
    (0..n).map(|i| format!("{prefix}{i}")).collect()
}

// =============================================================================
// REBASING
// =============================================================================

proptest! {
    #[test]
    fn test_rebase_recovers_original_positions((statics, donated) in arb_disjoint_roles()) {
        let rebased = rebase_donate_argnums(&donated, &statics).unwrap();
        prop_assert_eq!(rebased.len(), donated.len());

        // Positions of the dynamic arguments in the full argument list.
        let dynamic: Vec<i64> = (0..24).filter(|i| !statics.contains(i)).collect();
        let recovered: Vec<i64> = rebased.iter().map(|&r| dynamic[r as usize]).collect();
        prop_assert_eq!(recovered, donated);
    }

    #[test]
    fn test_rebase_is_sorted((statics, donated) in arb_disjoint_roles()) {
        let mut reversed = donated.clone();
        reversed.reverse();
        let rebased = rebase_donate_argnums(&reversed, &statics).unwrap();
        prop_assert!(rebased.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_resolve_wraps_negative_argnums(
        (n, static_given, donate_given, statics, donated) in arb_signed_roles()
    ) {
        let f = Function::new("f", |_: &[Value], _: &Kwargs| Ok(Value::None));
        let sig = Signature::from_names(names("a", n)).unwrap();
        let roles = ArgRoles::new()
            .static_argnums(Value::tuple(static_given))
            .donate_argnums(Value::tuple(donate_given));
        let resolved = resolve_argnums(&f, Some(&sig), &roles).unwrap();
        prop_assert_eq!(&resolved.static_argnums, &statics);

        let dynamic: Vec<i64> = (0..n as i64).filter(|i| !statics.contains(i)).collect();
        let recovered: Vec<i64> =
            resolved.donate_argnums.iter().map(|&r| dynamic[r as usize]).collect();
        prop_assert_eq!(recovered, donated);
    }

    #[test]
    fn test_resolve_rejects_negative_alias_of_static(n in 1usize..10, pick in any::<prop::sample::Index>()) {
        let f = Function::new("f", |_: &[Value], _: &Kwargs| Ok(Value::None));
        let sig = Signature::from_names(names("a", n)).unwrap();
        let i = pick.index(n) as i64;
        let roles = ArgRoles::new().static_argnums(i - n as i64).donate_argnums(i);
        prop_assert!(resolve_argnums(&f, Some(&sig), &roles).is_err());
    }

    #[test]
    fn test_rebase_fails_on_intersection((statics, donated, _) in arb_overlapping_roles()) {
        let err = rebase_donate_argnums(&donated, &statics).unwrap_err();
        let is_intersect = matches!(err, Error::ArgnumsIntersect { .. });
        prop_assert!(is_intersect);
    }
}

// =============================================================================
// VALIDATION AND INFERENCE
// =============================================================================

proptest! {
    #[test]
    fn test_var_positional_accepts_any_argnum(n_params in 0usize..5, argnum in 0i64..1000) {
        let mut params: Vec<Parameter> =
            names("p", n_params).into_iter().map(Parameter::positional_or_keyword).collect();
        params.push(Parameter::var_positional("rest"));
        let sig = Signature::new(params).unwrap();
        prop_assert!(validate_argnums(&sig, &[argnum], "static_argnums").is_ok());
    }

    #[test]
    fn test_argnums_past_positional_params_fail(n_params in 0usize..5, extra in 0i64..100) {
        let sig = Signature::from_names(names("p", n_params)).unwrap();
        let argnum = n_params as i64 + extra;
        let err = validate_argnums(&sig, &[argnum], "donate_argnums").unwrap_err();
        let is_invalid = matches!(err, Error::InvalidArgnums { .. });
        prop_assert!(is_invalid);
    }

    #[test]
    fn test_positional_only_argname_fails(
        n_params in 1usize..5,
        pick in any::<prop::sample::Index>(),
        var_kwargs in any::<bool>(),
    ) {
        let pos_only = names("p", n_params);
        let mut params: Vec<Parameter> =
            pos_only.iter().cloned().map(Parameter::positional_only).collect();
        if var_kwargs {
            params.push(Parameter::var_keyword("kwargs"));
        }
        let sig = Signature::new(params).unwrap();
        let name = pos_only[pick.index(n_params)].clone();
        let err = validate_argnames(&sig, &[name], "static_argnames").unwrap_err();
        let is_invalid = matches!(err, Error::InvalidArgnames { .. });
        prop_assert!(is_invalid);
    }

    #[test]
    fn test_inferred_argnums_match_names(mask in prop::collection::vec(any::<bool>(), 1..8)) {
        let params = names("a", mask.len());
        let sig = Signature::from_names(params.clone()).unwrap();
        let chosen: Vec<String> = params
            .iter()
            .zip(&mask)
            .filter(|(_, m)| **m)
            .map(|(p, _)| p.clone())
            .collect();
        let expected: Vec<i64> = (0..mask.len() as i64).filter(|&i| mask[i as usize]).collect();

        let (nums, _) = infer_argnums_and_argnames(&sig, None, Some(&Value::tuple(chosen.clone())))
            .unwrap();
        prop_assert_eq!(&nums, &expected);

        let (_, inferred) =
            infer_argnums_and_argnames(&sig, Some(&Value::tuple(expected)), None).unwrap();
        let mut sorted = chosen;
        sorted.sort();
        prop_assert_eq!(inferred, sorted);
    }
}

// =============================================================================
// HASHBOX
// =============================================================================

proptest! {
    #[test]
    fn test_hashbox_equal_values_hash_equal(v in arb_hashable()) {
        let a = HashBox::new(v.clone()).unwrap();
        let b = HashBox::new(v).unwrap();
        prop_assert_eq!(hash_of(&a), hash_of(&b));
        prop_assert_eq!(a, b);
    }

    #[test]
    fn test_hashbox_int_vs_float(i in -(1i64 << 40)..(1i64 << 40)) {
        let int = Value::Int(i);
        let float = Value::Float(i as f64);
        prop_assert_eq!(&int, &float);
        prop_assert_ne!(HashBox::new(int).unwrap(), HashBox::new(float).unwrap());
    }

    #[test]
    fn test_hashbox_type_strict_inside_tuples(b in any::<bool>()) {
        let as_bool = Value::tuple([Value::Bool(b)]);
        let as_int = Value::tuple([Value::Int(b as i64)]);
        prop_assert_eq!(&as_bool, &as_int);
        prop_assert_ne!(HashBox::new(as_bool).unwrap(), HashBox::new(as_int).unwrap());
    }

    #[test]
    fn test_lists_are_never_hashable(items in prop::collection::vec(any::<i64>(), 0..5)) {
        prop_assert!(HashBox::new(Value::list(items)).is_err());
    }
}
