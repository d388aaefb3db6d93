//! JIT front end.
//!
//! Provides the `jit` function, which resolves static and donated arguments
//! once and then caches a compiled entry per static-argument values and
//! dynamic-argument shapes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, trace};

use crate::aliasing::check_no_aliased_ref_args;
use crate::argnums::{resolve_argnums, ArgRoles, ResolveCache, ResolvedArgnums};
use crate::config::Config;
use crate::debug_info::{debug_info, DebugInfo};
use crate::donation::donation_vector;
use crate::error::Result;
use crate::function::Callable;
use crate::nan_check::{check_output, maybe_recursive_nan_check};
use crate::signature::Signature;
use crate::value::{AbstractValue, Kwargs, Value};
use crate::wrapped::{argnames_partial_except, argnums_partial_except, WrappedFun, WrappedFunKey};

/// Key of a compiled entry: the reduced function (including its boxed
/// static arguments) and the abstract dynamic arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    fun: WrappedFunKey,
    args: Vec<AbstractValue>,
    kwargs: Vec<(String, AbstractValue)>,
}

/// A function specialized to one set of static arguments and dynamic
/// argument shapes.
#[derive(Debug)]
pub struct CompiledFunction {
    fun: WrappedFun,
    debug_info: DebugInfo,
    donated_invars: Vec<bool>,
}

impl CompiledFunction {
    /// The reduced function, taking only dynamic arguments.
    pub fn fun(&self) -> &WrappedFun {
        &self.fun
    }

    /// Provenance of the entry, naming its dynamic argument leaves.
    pub fn debug_info(&self) -> &DebugInfo {
        &self.debug_info
    }

    /// One flag per flattened dynamic argument leaf.
    pub fn donated_invars(&self) -> &[bool] {
        &self.donated_invars
    }
}

/// A jitted function.
///
/// Returned by [`jit`]. Static arguments are split off each call and
/// boxed; the remaining dynamic arguments are passed to the cached entry
/// for their abstract signature.
///
/// Compiled entries are never evicted: the cache grows by one entry per
/// distinct combination of static values and argument shapes. Call
/// [`clear_cache`](Self::clear_cache) to release them.
pub struct JitFunction {
    fun: Arc<dyn Callable>,
    wrapped: WrappedFun,
    signature: Option<Signature>,
    resolved: ResolvedArgnums,
    config: Config,
    cache: Mutex<HashMap<CacheKey, Arc<CompiledFunction>>>,
}

impl JitFunction {
    /// Resolve `roles` against `fun`'s signature and build the jitted
    /// function. A `resolve_cache` memoizes the resolution.
    pub fn new(
        fun: Arc<dyn Callable>,
        roles: &ArgRoles,
        config: Config,
        resolve_cache: Option<&ResolveCache>,
    ) -> Result<Self> {
        let signature = fun.signature().cloned();
        let resolved = match resolve_cache {
            Some(cache) => cache.resolve(fun.as_ref(), signature.as_ref(), roles)?,
            None => resolve_argnums(fun.as_ref(), signature.as_ref(), roles)?,
        };
        Ok(Self {
            wrapped: WrappedFun::from_arc(Arc::clone(&fun)),
            fun,
            signature,
            resolved,
            config,
            cache: Mutex::new(HashMap::new()),
        })
    }

    /// Name of the wrapped function.
    pub fn name(&self) -> &str {
        self.fun.name()
    }

    /// Argument roles resolved at construction.
    pub fn resolved(&self) -> &ResolvedArgnums {
        &self.resolved
    }

    /// Debug settings used for calls.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of compiled entries.
    pub fn cache_size(&self) -> usize {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Drop all compiled entries.
    pub fn clear_cache(&self) {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Split static arguments off and find (or build) the compiled entry.
    ///
    /// Returns the entry with the dynamic positional and keyword arguments.
    pub fn lower(
        &self,
        args: &[Value],
        kwargs: &Kwargs,
    ) -> Result<(Arc<CompiledFunction>, Vec<Value>, Kwargs)> {
        let (f, dyn_args) =
            argnums_partial_except(&self.wrapped, &self.resolved.static_argnums, args, true)?;
        let (f, dyn_kwargs) = argnames_partial_except(&f, &self.resolved.static_argnames, kwargs)?;

        if self.config.mutable_array_checks {
            let mut flat: Vec<Value> = dyn_args.clone();
            flat.extend(dyn_kwargs.values().cloned());
            if check_no_aliased_ref_args(None, &flat).is_err() {
                let dbg = self.debug_info(args, kwargs)?;
                check_no_aliased_ref_args(Some(&dbg), &flat)?;
            }
        }

        let key = f.cache_key().map(|fun| CacheKey {
            fun,
            args: dyn_args.iter().map(Value::abstractify).collect(),
            kwargs: dyn_kwargs
                .iter()
                .map(|(k, v)| (k.clone(), v.abstractify()))
                .collect(),
        });

        if let Some(key) = &key {
            let cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(compiled) = cache.get(key) {
                trace!(fun = self.name(), "jit cache hit");
                return Ok((Arc::clone(compiled), dyn_args, dyn_kwargs));
            }
        }

        let donated_invars = donation_vector(
            &self.resolved.donate_argnums,
            &self.resolved.donate_argnames,
            &dyn_args,
            &dyn_kwargs,
        );
        let compiled = Arc::new(CompiledFunction {
            fun: f,
            debug_info: self.debug_info(args, kwargs)?,
            donated_invars,
        });
        debug!(
            fun = self.name(),
            arg_names = ?compiled.debug_info.arg_names,
            donated = compiled.donated_invars.iter().filter(|d| **d).count(),
            "jit cache miss, compiling"
        );

        if let Some(key) = key {
            let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
            let entry = cache.entry(key).or_insert_with(|| Arc::clone(&compiled));
            return Ok((Arc::clone(entry), dyn_args, dyn_kwargs));
        }
        Ok((compiled, dyn_args, dyn_kwargs))
    }

    /// Execute the function, using a cached entry if available.
    ///
    /// With `debug_nans`/`debug_infs` enabled, an invalid output triggers a
    /// call of the de-optimized function to locate the problem.
    pub fn call(&self, args: &[Value], kwargs: &Kwargs) -> Result<Value> {
        let (compiled, dyn_args, dyn_kwargs) = self.lower(args, kwargs)?;
        let output = compiled.fun.call(&dyn_args, &dyn_kwargs)?;

        if self.config.checks_invalid_values() {
            let (nans, infs) = (self.config.debug_nans, self.config.debug_infs);
            if let Some(invalid) = check_output(self.name(), &output, nans, infs) {
                return Err(maybe_recursive_nan_check(
                    &invalid,
                    self.fun.as_ref(),
                    args,
                    kwargs,
                    nans,
                    infs,
                ));
            }
        }
        Ok(output)
    }

    fn debug_info(&self, args: &[Value], kwargs: &Kwargs) -> Result<DebugInfo> {
        debug_info(
            "jit",
            self.fun.as_ref(),
            args,
            kwargs,
            &self.resolved.static_argnums,
            &self.resolved.static_argnames,
            None,
            self.signature.as_ref(),
        )
    }
}

/// JIT-compile a function.
///
/// Resolves `roles` against the function's signature; fails if they are
/// invalid for it.
///
/// # Examples
///
/// ```
/// use jax_argspec::{jit, ArgRoles, Function, Kwargs, Value};
///
/// let scale = Function::new("scale", |args: &[Value], _: &Kwargs| match (&args[0], &args[1]) {
///     (Value::Float(x), Value::Int(n)) => Ok(Value::Float(x * *n as f64)),
///     _ => Ok(Value::None),
/// })
/// .with_signature("x, n".parse().unwrap());
///
/// let f = jit(scale, ArgRoles::new().static_argnames("n")).unwrap();
/// assert_eq!(f.resolved().static_argnums, vec![1]);
/// let out = f.call(&[Value::Float(1.5), Value::Int(2)], &Kwargs::new()).unwrap();
/// assert_eq!(out, Value::Float(3.0));
/// ```
pub fn jit<C: Callable + 'static>(fun: C, roles: ArgRoles) -> Result<JitFunction> {
    JitFunction::new(Arc::new(fun), &roles, Config::default(), None)
}
