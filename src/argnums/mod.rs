//! Static and donated argument resolution.
//!
//! A jitted function marks some arguments *static* (they become part of
//! the compilation cache key) and some *donated* (their buffers may be
//! overwritten by the compiled kernel). Either role can be given by
//! position (`argnums`) or by name (`argnames`). This module completes one
//! form from the other using the function's signature, validates both,
//! and rebases donated positions onto the dynamic arguments.

pub mod cache;
pub mod normalize;
pub mod rebase;
pub mod resolve;
pub mod validate;

pub use cache::{CacheStats, ResolveCache};
pub use normalize::{
    ensure_index, ensure_index_tuple, ensure_str, ensure_str_tuple, infer_argnums_and_argnames,
    IndexSpec,
};
pub use rebase::{assert_no_intersection, rebase_donate_argnums};
pub use resolve::{resolve_argnums, ArgRoles, ResolvedArgnums};
pub use validate::{validate_argnames, validate_argnums};
