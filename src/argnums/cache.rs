//! Memoized argnum resolution.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use tracing::trace;

use super::resolve::{resolve_argnums, ArgRoles, ResolvedArgnums};
use crate::error::Result;
use crate::function::Callable;
use crate::hashable::HashBox;
use crate::signature::{ParameterKind, Signature};
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ResolveKey {
    signature: Option<Vec<(String, ParameterKind)>>,
    roles: [Option<HashBox>; 4],
}

impl ResolveKey {
    fn new(signature: Option<&Signature>, roles: &ArgRoles) -> Option<Self> {
        let boxed = |v: &Option<Value>| -> Option<Option<HashBox>> {
            match v {
                None => Some(None),
                Some(v) => HashBox::new(v.clone()).ok().map(Some),
            }
        };
        Some(Self {
            signature: signature.map(Signature::kinds),
            roles: [
                boxed(&roles.donate_argnums)?,
                boxed(&roles.donate_argnames)?,
                boxed(&roles.static_argnums)?,
                boxed(&roles.static_argnames)?,
            ],
        })
    }
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<ResolveKey, (ResolvedArgnums, u64)>,
    clock: u64,
    hits: u64,
    misses: u64,
}

/// Size-bounded memo of [`resolve_argnums`] results.
///
/// Keyed by the signature's parameter names and kinds plus the raw role
/// options. Least recently used entries are evicted first. Failed
/// resolutions are not cached, and options that cannot be hashed bypass
/// the cache.
#[derive(Debug)]
pub struct ResolveCache {
    capacity: usize,
    state: Mutex<CacheState>,
}

/// Hit and miss counts of a [`ResolveCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that ran the resolution.
    pub misses: u64,
    /// Entries currently held.
    pub size: usize,
}

impl ResolveCache {
    /// Create a cache holding at most `capacity` resolutions. A capacity of
    /// zero disables caching.
    pub fn new(capacity: usize) -> Self {
        Self { capacity, state: Mutex::new(CacheState::default()) }
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Resolve through the cache.
    pub fn resolve(
        &self,
        fun: &dyn Callable,
        signature: Option<&Signature>,
        roles: &ArgRoles,
    ) -> Result<ResolvedArgnums> {
        let key = match ResolveKey::new(signature, roles) {
            Some(key) if self.capacity > 0 => key,
            _ => return resolve_argnums(fun, signature, roles),
        };

        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.clock += 1;
            let now = state.clock;
            if let Some((resolved, last_used)) = state.entries.get_mut(&key) {
                *last_used = now;
                let resolved = resolved.clone();
                state.hits += 1;
                trace!(fun = fun.name(), "argnum resolution cache hit");
                return Ok(resolved);
            }
            state.misses += 1;
        }

        let resolved = resolve_argnums(fun, signature, roles)?;

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.entries.len() >= self.capacity && !state.entries.contains_key(&key) {
            let oldest = state
                .entries
                .iter()
                .min_by_key(|(_, (_, last_used))| *last_used)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                state.entries.remove(&oldest);
            }
        }
        state.clock += 1;
        let now = state.clock;
        state.entries.insert(key, (resolved.clone(), now));
        Ok(resolved)
    }

    /// Current hit, miss and size counts.
    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        CacheStats { hits: state.hits, misses: state.misses, size: state.entries.len() }
    }

    /// Drop all entries and reset the counts.
    pub fn clear(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        *state = CacheState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::function::Function;
    use crate::value::Kwargs;

    fn noop() -> Function {
        Function::new("f", |_: &[Value], _: &Kwargs| Ok(Value::None))
    }

    #[test]
    fn test_hits_and_misses() {
        let cache = ResolveCache::new(8);
        let sig: Signature = "a, b".parse().unwrap();
        let roles = ArgRoles::new().static_argnums(0);
        let first = cache.resolve(&noop(), Some(&sig), &roles).unwrap();
        let second = cache.resolve(&noop(), Some(&sig), &roles).unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1, size: 1 });
    }

    #[test]
    fn test_keys_are_type_strict() {
        let cache = ResolveCache::new(8);
        let sig: Signature = "a, b".parse().unwrap();
        cache.resolve(&noop(), Some(&sig), &ArgRoles::new().static_argnums(1)).unwrap();
        cache.resolve(&noop(), Some(&sig), &ArgRoles::new().static_argnums(true)).unwrap();
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn test_eviction() {
        let cache = ResolveCache::new(2);
        let sig: Signature = "a, b, c".parse().unwrap();
        let r0 = ArgRoles::new().static_argnums(0);
        let r1 = ArgRoles::new().static_argnums(1);
        let r2 = ArgRoles::new().static_argnums(2);
        cache.resolve(&noop(), Some(&sig), &r0).unwrap();
        cache.resolve(&noop(), Some(&sig), &r1).unwrap();
        cache.resolve(&noop(), Some(&sig), &r0).unwrap();
        cache.resolve(&noop(), Some(&sig), &r2).unwrap();
        assert_eq!(cache.stats().size, 2);
        // r1 was least recently used.
        cache.resolve(&noop(), Some(&sig), &r0).unwrap();
        assert_eq!(cache.stats().hits, 2);
        cache.resolve(&noop(), Some(&sig), &r1).unwrap();
        assert_eq!(cache.stats().misses, 4);
    }

    #[test]
    fn test_errors_not_cached() {
        let cache = ResolveCache::new(8);
        let sig: Signature = "a".parse().unwrap();
        let roles = ArgRoles::new().static_argnums(3);
        assert!(matches!(
            cache.resolve(&noop(), Some(&sig), &roles),
            Err(Error::InvalidArgnums { .. })
        ));
        assert_eq!(cache.stats().size, 0);
    }

    #[test]
    fn test_unhashable_roles_bypass() {
        let cache = ResolveCache::new(8);
        let sig: Signature = "a, b".parse().unwrap();
        let roles = ArgRoles::new().static_argnums(Value::list([0]));
        let r = cache.resolve(&noop(), Some(&sig), &roles).unwrap();
        assert_eq!(r.static_argnums, vec![0]);
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[test]
    fn test_zero_capacity() {
        let cache = ResolveCache::new(0);
        let sig: Signature = "a".parse().unwrap();
        cache.resolve(&noop(), Some(&sig), &ArgRoles::new()).unwrap();
        assert_eq!(cache.stats().size, 0);
        cache.clear();
    }
}
