//! Quickstart: resolve argument roles and run a jitted function.
//!
//! Run with `RUST_LOG=jax_argspec=debug cargo run --example quickstart`
//! to see resolution and cache events.

use jax_argspec::{jit, ArgRoles, ArrayValue, CallError, Config, Error, Function, JitFunction, Kwargs, Value};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn scale() -> Function {
    Function::new("scale", |args: &[Value], kwargs: &Kwargs| {
        let Value::Array(x) = &args[0] else {
            return Err(CallError::Other("x must be an array".into()));
        };
        let factor = match &args[1] {
            Value::Int(n) => *n as f64,
            Value::Float(f) => *f,
            _ => return Err(CallError::Other("n must be a number".into())),
        };
        let sign = match kwargs.get("mode").and_then(Value::as_str) {
            Some("neg") => -1.0,
            _ => 1.0,
        };
        let data = x.data().iter().map(|v| sign * factor * v).collect();
        Ok(ArrayValue::new(data, x.shape().to_vec(), x.dtype()).into())
    })
    .with_signature("x, n, *, mode='id'".parse().expect("valid signature"))
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let f = jit(scale(), ArgRoles::new().static_argnums(1).static_argnames("mode"))?;
    println!("resolved: {:?}", f.resolved());

    let x = Value::from(ArrayValue::from_vec(vec![1.0, 2.0, 3.0], vec![3]));
    let mut kwargs = Kwargs::new();
    kwargs.insert("mode".into(), Value::from("neg"));

    for n in [2, 2, 3] {
        if let Value::Array(y) = f.call(&[x.clone(), Value::Int(n)], &kwargs)? {
            println!("scale(x, {n}, mode='neg') = {:?}", y.data());
        }
    }
    println!("compiled entries: {}", f.cache_size());

    let (compiled, _, _) = f.lower(&[x.clone(), Value::Int(2)], &kwargs)?;
    println!("arg names: {:?}", compiled.debug_info().arg_names);

    // Unhashable static arguments are rejected.
    if let Err(e) = f.call(&[x.clone(), Value::list([2])], &kwargs) {
        println!("error: {e}");
    }

    // With debug_nans, a NaN output re-runs the function without jit.
    let checked = JitFunction::new(
        Arc::new(scale()),
        &ArgRoles::new().static_argnums(1),
        Config::from_env().with_debug_nans(true),
        None,
    )?;
    let nan = Value::from(ArrayValue::from_vec(vec![f64::NAN], vec![1]));
    if let Err(e) = checked.call(&[nan, Value::Int(1)], &Kwargs::new()) {
        println!("error: {e}");
    }
    Ok(())
}
