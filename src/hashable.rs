//! Boxing static arguments for use in cache keys.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{Error, Result};
use crate::value::{TypeTag, Unhashable, Value};

/// A hashable value compared with strict type equality.
///
/// Two boxes are equal only when their values have the same [`TypeTag`]
/// and compare equal, so `1` and `true` (or `0` and `0.0`) give distinct
/// cache keys even though the plain values are equal.
///
/// # Examples
///
/// ```
/// use jax_argspec::{HashBox, Value};
///
/// assert_eq!(Value::Int(1), Value::Bool(true));
/// let one = HashBox::new(Value::Int(1)).unwrap();
/// let yes = HashBox::new(Value::Bool(true)).unwrap();
/// assert_ne!(one, yes);
/// ```
#[derive(Clone)]
pub struct HashBox {
    tag: TypeTag,
    hash: u64,
    val: Value,
}

impl HashBox {
    /// Box `val`, failing if it has no hash.
    pub fn new(val: Value) -> std::result::Result<Self, Unhashable> {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        val.try_hash(&mut hasher)?;
        Ok(Self { tag: val.type_tag(), hash: hasher.finish(), val })
    }

    /// The boxed value.
    pub fn get(&self) -> &Value {
        &self.val
    }

    /// Unwrap the boxed value.
    pub fn into_inner(self) -> Value {
        self.val
    }

    /// Type of the boxed value, part of its equality.
    pub fn type_tag(&self) -> TypeTag {
        self.tag
    }
}

impl PartialEq for HashBox {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag && strict_eq(&self.val, &other.val)
    }
}

// NaN floats break reflexivity here just as they do for the plain values.
impl Eq for HashBox {}

impl Hash for HashBox {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl fmt::Debug for HashBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HashBox({}: {})", self.val, self.tag)
    }
}

/// Value equality where nested elements must also match in type.
fn strict_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Tuple(xs), Value::Tuple(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .zip(ys)
                    .all(|(x, y)| x.type_tag() == y.type_tag() && strict_eq(x, y))
        }
        _ => a.type_tag() == b.type_tag() && a == b,
    }
}

/// What a static argument is identified by in error messages.
#[derive(Debug, Clone, Copy)]
pub enum StaticArgId<'a> {
    /// Position in the argument list.
    Index(usize),
    /// Keyword argument name.
    Name(&'a str),
}

impl fmt::Display for StaticArgId<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaticArgId::Index(i) => write!(f, "index {i}"),
            StaticArgId::Name(name) => write!(f, "name {name}"),
        }
    }
}

/// Box a static argument, reporting which argument of `fun` was unhashable.
pub fn box_static_arg(val: &Value, id: StaticArgId<'_>, fun: &str) -> Result<HashBox> {
    HashBox::new(val.clone()).map_err(|_| Error::NonHashableStatic {
        arg: id.to_string(),
        type_name: val.type_name(),
        fun: fun.to_string(),
    })
}

/// Returns true if `val` can be used as a static argument.
pub fn is_hashable(val: &Value) -> bool {
    val.is_hashable()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn boxed(v: impl Into<Value>) -> HashBox {
        HashBox::new(v.into()).unwrap()
    }

    #[test]
    fn test_strict_type_equality() {
        assert_ne!(boxed(1), boxed(true));
        assert_ne!(boxed(0), boxed(0.0));
        assert_eq!(boxed(2), boxed(2));
        assert_eq!(boxed("a"), boxed("a"));
    }

    #[test]
    fn test_nested_tuples_compare_strictly() {
        assert_eq!(Value::tuple([1, 2]), Value::tuple([Value::Bool(true), Value::Int(2)]));
        assert_ne!(
            boxed(Value::tuple([1, 2])),
            boxed(Value::tuple([Value::Bool(true), Value::Int(2)]))
        );
        assert_eq!(boxed(Value::tuple([1, 2])), boxed(Value::tuple([1, 2])));
    }

    #[test]
    fn test_set_membership() {
        let mut set = HashSet::new();
        set.insert(boxed(1));
        set.insert(boxed(true));
        set.insert(boxed(1.0));
        set.insert(boxed(1));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_unhashable_rejected() {
        assert!(HashBox::new(Value::list([1])).is_err());
        let err = box_static_arg(&Value::list([1]), StaticArgId::Index(2), "f").unwrap_err();
        assert_eq!(
            err,
            Error::NonHashableStatic { arg: "index 2".into(), type_name: "list", fun: "f".into() }
        );
        assert!(err.to_string().contains("Static argument (index 2) of type list for function f"));
    }

    #[test]
    fn test_unbox() {
        let b = boxed("x");
        assert_eq!(b.type_tag(), TypeTag::Str);
        assert_eq!(b.get(), &Value::from("x"));
        assert_eq!(b.into_inner(), Value::from("x"));
    }
}
