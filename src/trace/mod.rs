//! Tracing front ends built on argument resolution.
//!
//! Only `jit` lives here: it splits static arguments off each call, keys a
//! cache of specialized functions on the rest, and routes invalid outputs
//! through the de-optimized function.

pub mod jit;

pub use jit::{jit, CompiledFunction, JitFunction};
