//! Wrapped functions and partial application of static arguments.
//!
//! A [`WrappedFun`] is a user function plus a stack of argument
//! transformations. Each transformation rewrites the arguments it receives
//! into the arguments of the function beneath it, so the outermost
//! transformation sees only the dynamic arguments while the user function
//! still receives its full argument list.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::error::{CallError, Error, Result};
use crate::function::{CallResult, Callable, SourceLocation};
use crate::hashable::{box_static_arg, HashBox, StaticArgId};
use crate::signature::Signature;
use crate::value::{Kwargs, Value};

#[derive(Clone)]
enum StaticArg {
    Hashed(HashBox),
    Unhashable(Value),
}

impl StaticArg {
    fn value(&self) -> &Value {
        match self {
            StaticArg::Hashed(b) => b.get(),
            StaticArg::Unhashable(v) => v,
        }
    }
}

#[derive(Clone)]
enum Transform {
    /// Static positional values merged around the dynamic ones.
    ArgnumsPartial { dyn_argnums: Vec<usize>, fixed: Vec<StaticArg> },
    /// Static keyword values merged into the keyword arguments.
    ArgnamesPartial { fixed: Vec<(String, HashBox)> },
    /// Values placed before the positional arguments.
    PrependStatic { args: Vec<Value> },
}

impl Transform {
    fn apply(&self, args: Vec<Value>, kwargs: Kwargs) -> std::result::Result<(Vec<Value>, Kwargs), CallError> {
        match self {
            Transform::ArgnumsPartial { dyn_argnums, fixed } => {
                if args.len() != dyn_argnums.len() {
                    return Err(CallError::Other(format!(
                        "expected {} dynamic positional arguments, got {}",
                        dyn_argnums.len(),
                        args.len()
                    )));
                }
                let mut slots: Vec<Option<Value>> = vec![None; dyn_argnums.len() + fixed.len()];
                for (&i, arg) in dyn_argnums.iter().zip(args) {
                    slots[i] = Some(arg);
                }
                let mut fixed = fixed.iter();
                let full = slots
                    .into_iter()
                    .map(|slot| match slot {
                        Some(v) => Some(v),
                        None => fixed.next().map(|s| s.value().clone()),
                    })
                    .collect::<Option<Vec<Value>>>()
                    .ok_or_else(|| CallError::Other("static arguments exhausted".into()))?;
                Ok((full, kwargs))
            }
            Transform::ArgnamesPartial { fixed } => {
                let mut kwargs = kwargs;
                for (k, v) in fixed {
                    kwargs.entry(k.clone()).or_insert_with(|| v.get().clone());
                }
                Ok((args, kwargs))
            }
            Transform::PrependStatic { args: statics } => {
                let mut full = statics.clone();
                full.extend(args);
                Ok((full, kwargs))
            }
        }
    }

    fn key(&self) -> Option<TransformKey> {
        match self {
            Transform::ArgnumsPartial { dyn_argnums, fixed } => {
                let boxes = fixed
                    .iter()
                    .map(|s| match s {
                        StaticArg::Hashed(b) => Some(b.clone()),
                        StaticArg::Unhashable(_) => None,
                    })
                    .collect::<Option<Vec<_>>>()?;
                Some(TransformKey::ArgnumsPartial(dyn_argnums.clone(), boxes))
            }
            Transform::ArgnamesPartial { fixed } => Some(TransformKey::ArgnamesPartial(fixed.clone())),
            Transform::PrependStatic { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum TransformKey {
    ArgnumsPartial(Vec<usize>, Vec<HashBox>),
    ArgnamesPartial(Vec<(String, HashBox)>),
}

/// Identity of a [`WrappedFun`] for compiled-function caches.
///
/// Two keys are equal when they wrap the same function object with equal
/// transformations, static values compared with [`HashBox`] equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WrappedFunKey {
    fun_id: usize,
    transforms: Vec<TransformKey>,
}

/// A function together with its argument transformations.
#[derive(Clone)]
pub struct WrappedFun {
    f: Arc<dyn Callable>,
    transforms: Vec<Transform>,
}

impl WrappedFun {
    /// Wrap `f` with no transformations.
    pub fn new<C: Callable + 'static>(f: C) -> Self {
        Self::from_arc(Arc::new(f))
    }

    /// Wrap a shared function with no transformations.
    pub fn from_arc(f: Arc<dyn Callable>) -> Self {
        Self { f, transforms: Vec::new() }
    }

    /// The untransformed user function.
    pub fn inner(&self) -> &Arc<dyn Callable> {
        &self.f
    }

    /// Number of transformations applied.
    pub fn num_transforms(&self) -> usize {
        self.transforms.len()
    }

    /// Cache key, or `None` if a transformation holds unhashable values.
    pub fn cache_key(&self) -> Option<WrappedFunKey> {
        let transforms = self.transforms.iter().map(Transform::key).collect::<Option<Vec<_>>>()?;
        Some(WrappedFunKey {
            fun_id: Arc::as_ptr(&self.f) as *const () as usize,
            transforms,
        })
    }

    fn with_transform(&self, transform: Transform) -> Self {
        let mut transforms = self.transforms.clone();
        transforms.push(transform);
        Self { f: Arc::clone(&self.f), transforms }
    }
}

impl Callable for WrappedFun {
    fn name(&self) -> &str {
        self.f.name()
    }

    fn signature(&self) -> Option<&Signature> {
        if self.transforms.is_empty() {
            self.f.signature()
        } else {
            None
        }
    }

    fn source_location(&self) -> Option<&SourceLocation> {
        self.f.source_location()
    }

    fn call(&self, args: &[Value], kwargs: &Kwargs) -> CallResult {
        let mut args = args.to_vec();
        let mut kwargs = kwargs.clone();
        for transform in self.transforms.iter().rev() {
            (args, kwargs) = transform.apply(args, kwargs)?;
        }
        self.f.call(&args, &kwargs)
    }
}

impl fmt::Debug for WrappedFun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrappedFun")
            .field("name", &self.f.name())
            .field("transforms", &self.transforms.len())
            .finish()
    }
}

/// Resolve negative indices against `num_args` and check bounds.
///
/// With `allow_invalid`, indices at or past `num_args` are dropped instead
/// of rejected.
pub fn ensure_inbounds(allow_invalid: bool, num_args: usize, argnums: &[i64]) -> Result<Vec<usize>> {
    let n = num_args as i64;
    let mut out = Vec::with_capacity(argnums.len());
    for &i in argnums {
        if i >= n && allow_invalid {
            continue;
        }
        if !(-n <= i && i < n) {
            return Err(Error::IndexOutOfBounds { index: i, num_args });
        }
        out.push(i.rem_euclid(n) as usize);
    }
    Ok(out)
}

/// Keep only `dyn_argnums` dynamic; every other argument becomes static.
///
/// Returns the reduced function and the dynamic arguments, in the order
/// `dyn_argnums` lists them (repeated indices count once). When
/// `require_static_args_hashable` is false the static values are kept
/// unboxed and the result has no [`cache_key`](WrappedFun::cache_key).
pub fn argnums_partial(
    f: &WrappedFun,
    dyn_argnums: &[i64],
    args: &[Value],
    require_static_args_hashable: bool,
) -> Result<(WrappedFun, Vec<Value>)> {
    let mut dyn_set = BTreeSet::new();
    let dyn_argnums: Vec<usize> = ensure_inbounds(false, args.len(), dyn_argnums)?
        .into_iter()
        .filter(|&i| dyn_set.insert(i))
        .collect();
    let mut fixed = Vec::with_capacity(args.len() - dyn_set.len());
    for (i, arg) in args.iter().enumerate() {
        if dyn_set.contains(&i) {
            continue;
        }
        fixed.push(if require_static_args_hashable {
            StaticArg::Hashed(box_static_arg(arg, StaticArgId::Index(i), f.name())?)
        } else {
            StaticArg::Unhashable(arg.clone())
        });
    }
    let dyn_args = dyn_argnums.iter().map(|&i| args[i].clone()).collect();
    Ok((f.with_transform(Transform::ArgnumsPartial { dyn_argnums, fixed }), dyn_args))
}

/// Split `static_argnums` off `args`, boxing them for hashing.
///
/// With `allow_invalid`, static indices past the end of `args` are ignored
/// (the parameter may be filled by a default).
pub fn argnums_partial_except(
    f: &WrappedFun,
    static_argnums: &[i64],
    args: &[Value],
    allow_invalid: bool,
) -> Result<(WrappedFun, Vec<Value>)> {
    if static_argnums.is_empty() {
        return Ok((f.clone(), args.to_vec()));
    }
    let statics: BTreeSet<usize> = ensure_inbounds(allow_invalid, args.len(), static_argnums)?.into_iter().collect();
    let dyn_argnums: Vec<usize> = (0..args.len()).filter(|i| !statics.contains(i)).collect();
    let dyn_args = dyn_argnums.iter().map(|&i| args[i].clone()).collect();

    let fixed = statics
        .iter()
        .map(|&i| box_static_arg(&args[i], StaticArgId::Index(i), f.name()).map(StaticArg::Hashed))
        .collect::<Result<Vec<_>>>()?;

    Ok((f.with_transform(Transform::ArgnumsPartial { dyn_argnums, fixed }), dyn_args))
}

/// Split `static_argnames` off `kwargs`, boxing them for hashing.
pub fn argnames_partial_except(
    f: &WrappedFun,
    static_argnames: &[String],
    kwargs: &Kwargs,
) -> Result<(WrappedFun, Kwargs)> {
    if static_argnames.is_empty() {
        return Ok((f.clone(), kwargs.clone()));
    }
    let mut dyn_kwargs = Kwargs::new();
    let mut fixed = Vec::new();
    for (k, v) in kwargs {
        if static_argnames.contains(k) {
            fixed.push((k.clone(), box_static_arg(v, StaticArgId::Name(k), f.name())?));
        } else {
            dyn_kwargs.insert(k.clone(), v.clone());
        }
    }
    Ok((f.with_transform(Transform::ArgnamesPartial { fixed }), dyn_kwargs))
}

/// Prepend `static_args` to every call. The values are not hashed.
pub fn prepend_static_args(f: &WrappedFun, static_args: Vec<Value>) -> WrappedFun {
    f.with_transform(Transform::PrependStatic { args: static_args })
}
