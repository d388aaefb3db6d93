//! # jax-argspec: argument handling for JAX transformations
//!
//! The plumbing a `jit` front end needs between a user function and a
//! compiled kernel: which arguments are static, which are donated, how
//! they are named in error messages, and how a call is reduced to its
//! dynamic arguments.
//!
//! ## Key Features
//!
//! - **Argument roles**: `static_argnums`/`static_argnames` and
//!   `donate_argnums`/`donate_argnames`, completed from each other through
//!   the function signature and validated against it
//! - **Partial application**: static arguments are boxed with strict,
//!   type-aware equality and folded into a cache key
//! - **Donation vectors**: one flag per flattened argument leaf
//! - **Debug info**: `x['w']`-style names for every argument leaf
//! - **Debug checks**: aliased mutable array references, NaN/Inf recovery
//!
//! ## Quick Start
//!
//! ```rust
//! use jax_argspec::{resolve_argnums, ArgRoles, Callable, Function, Kwargs, Value};
//!
//! let f = Function::new("f", |_: &[Value], _: &Kwargs| Ok(Value::None))
//!     .with_signature("x, n, *, mode".parse().unwrap());
//!
//! let roles = ArgRoles::new().static_argnums(1).donate_argnums(0);
//! let resolved = resolve_argnums(&f, f.signature(), &roles).unwrap();
//! assert_eq!(resolved.static_argnames, vec!["n"]);
//! assert_eq!(resolved.donate_argnums, vec![0]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod aliasing;
pub mod argnums;
pub mod config;
pub mod debug_info;
pub mod donation;
mod dtype;
pub mod error;
pub mod function;
pub mod hashable;
pub mod nan_check;
pub mod signature;
pub mod trace;
pub mod value;
pub mod wrapped;

// Public exports
pub use aliasing::{check_no_aliased_closed_over_refs, check_no_aliased_ref_args};
pub use argnums::{resolve_argnums, ArgRoles, CacheStats, ResolveCache, ResolvedArgnums};
pub use config::Config;
pub use debug_info::{debug_info, result_paths, DebugInfo};
pub use donation::{donation_vector, resolve_kwargs};
pub use dtype::DType;
pub use error::{CallError, Error, Result};
pub use function::{fun_signature, fun_sourceinfo, CallResult, Callable, Function, SourceLocation};
pub use hashable::{is_hashable, HashBox};
pub use nan_check::{check_output, maybe_recursive_nan_check, InvalidValue};
pub use signature::{BindError, BoundArguments, BoundValue, Parameter, ParameterKind, Signature};
pub use trace::{jit, CompiledFunction, JitFunction};
pub use value::{AbstractValue, ArrayValue, InvalidKind, Kwargs, MutableRef, TypeTag, Value};
pub use wrapped::{
    argnames_partial_except, argnums_partial, argnums_partial_except, ensure_inbounds,
    prepend_static_args, WrappedFun, WrappedFunKey,
};
