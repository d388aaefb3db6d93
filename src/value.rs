//! Dynamic argument values.
//!
//! A [`Value`] is what a caller passes to a jitted function: scalars,
//! strings, containers (tuples, lists, dicts), arrays and mutable array
//! references. Containers form a tree whose leaves are the data values.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, RwLock, RwLockReadGuard};

use crate::DType;

/// Keyword arguments, ordered by key.
pub type Kwargs = BTreeMap<String, Value>;

/// Run-time type of a [`Value`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// `None`.
    None,
    /// `bool`.
    Bool,
    /// `int`.
    Int,
    /// `float`.
    Float,
    /// `str`.
    Str,
    /// `tuple`.
    Tuple,
    /// `list`.
    List,
    /// `dict`.
    Dict,
    /// An array.
    Array,
    /// A mutable array reference.
    Ref,
}

impl TypeTag {
    /// Name of the type as shown in error messages.
    pub const fn name(self) -> &'static str {
        match self {
            TypeTag::None => "NoneType",
            TypeTag::Bool => "bool",
            TypeTag::Int => "int",
            TypeTag::Float => "float",
            TypeTag::Str => "str",
            TypeTag::Tuple => "tuple",
            TypeTag::List => "list",
            TypeTag::Dict => "dict",
            TypeTag::Array => "Array",
            TypeTag::Ref => "Ref",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when hashing a value that has no stable hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unhashable(pub TypeTag);

impl fmt::Display for Unhashable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unhashable type: '{}'", self.0)
    }
}

impl std::error::Error for Unhashable {}

/// Dense array argument.
///
/// Element data is shared, so cloning an array is cheap.
#[derive(Debug, Clone)]
pub struct ArrayValue {
    dtype: DType,
    shape: Vec<usize>,
    data: Arc<[f64]>,
}

impl ArrayValue {
    /// Create an array from row-major data.
    ///
    /// # Panics
    ///
    /// Panics if `data.len()` does not match the product of `shape`.
    pub fn new(data: Vec<f64>, shape: Vec<usize>, dtype: DType) -> Self {
        let size: usize = shape.iter().product();
        assert_eq!(
            data.len(),
            size,
            "data length {} does not match shape {:?}",
            data.len(),
            shape
        );
        Self { dtype, shape, data: data.into() }
    }

    /// Create a float32 array.
    pub fn from_vec(data: Vec<f64>, shape: Vec<usize>) -> Self {
        Self::new(data, shape, DType::Float32)
    }

    /// Create a rank-0 float32 array.
    pub fn scalar(value: f64) -> Self {
        Self::new(vec![value], vec![], DType::Float32)
    }

    /// Element type.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Dimensions.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Elements in row-major order.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Returns true if both arrays share the same buffer.
    pub fn same_buffer(&self, other: &ArrayValue) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Short abstract description, e.g. `f32[2,3]`.
    pub fn str_short(&self) -> String {
        shape_str(self.dtype, &self.shape)
    }
}

impl PartialEq for ArrayValue {
    fn eq(&self, other: &Self) -> bool {
        self.dtype == other.dtype
            && self.shape == other.shape
            && self.data == other.data
    }
}

fn shape_str(dtype: DType, shape: &[usize]) -> String {
    let dims: Vec<String> = shape.iter().map(|d| d.to_string()).collect();
    format!("{}[{}]", dtype.short_name(), dims.join(","))
}

/// Mutable array reference.
///
/// Two references are the same reference when they point to the same cell;
/// cloning a `MutableRef` aliases it.
#[derive(Debug, Clone)]
pub struct MutableRef {
    cell: Arc<RwLock<ArrayValue>>,
}

impl MutableRef {
    /// A new reference holding `value`.
    pub fn new(value: ArrayValue) -> Self {
        Self { cell: Arc::new(RwLock::new(value)) }
    }

    /// Identity of the referenced cell.
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.cell) as *const () as usize
    }

    /// Read the current value.
    pub fn get(&self) -> RwLockReadGuard<'_, ArrayValue> {
        // A poisoned lock still holds a complete ArrayValue.
        self.cell.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Replace the current value.
    pub fn set(&self, value: ArrayValue) {
        let mut guard = self.cell.write().unwrap_or_else(|e| e.into_inner());
        *guard = value;
    }

    /// Short description, e.g. `Ref{f32[3]}`.
    pub fn str_short(&self) -> String {
        let value = self.get();
        format!("Ref{{{}}}", shape_str(value.dtype(), value.shape()))
    }
}

impl PartialEq for MutableRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }
}

/// Kind of invalid floating-point value found in an output.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InvalidKind {
    /// Not a number.
    Nan,
    /// Positive or negative infinity.
    Inf,
}

impl fmt::Display for InvalidKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidKind::Nan => f.write_str("nan"),
            InvalidKind::Inf => f.write_str("inf"),
        }
    }
}

/// A dynamic argument or result value.
#[derive(Debug, Clone)]
pub enum Value {
    /// The absent value; flattens to no leaves.
    None,
    /// A boolean.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// A float.
    Float(f64),
    /// A string.
    Str(String),
    /// An immutable sequence; hashable if its items are.
    Tuple(Vec<Value>),
    /// A mutable sequence; never hashable.
    List(Vec<Value>),
    /// String-keyed mapping, flattened in key order.
    Dict(BTreeMap<String, Value>),
    /// An array leaf.
    Array(ArrayValue),
    /// A mutable array reference leaf.
    Ref(MutableRef),
}

impl Value {
    /// Build a tuple from anything convertible to values.
    pub fn tuple<I, T>(items: I) -> Value
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::Tuple(items.into_iter().map(Into::into).collect())
    }

    /// Build a list from anything convertible to values.
    pub fn list<I, T>(items: I) -> Value
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    /// Build a dict from `(key, value)` pairs.
    pub fn dict<I, K, T>(items: I) -> Value
    where
        I: IntoIterator<Item = (K, T)>,
        K: Into<String>,
        T: Into<Value>,
    {
        Value::Dict(items.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Run-time type.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::None => TypeTag::None,
            Value::Bool(_) => TypeTag::Bool,
            Value::Int(_) => TypeTag::Int,
            Value::Float(_) => TypeTag::Float,
            Value::Str(_) => TypeTag::Str,
            Value::Tuple(_) => TypeTag::Tuple,
            Value::List(_) => TypeTag::List,
            Value::Dict(_) => TypeTag::Dict,
            Value::Array(_) => TypeTag::Array,
            Value::Ref(_) => TypeTag::Ref,
        }
    }

    /// Type name as shown in error messages.
    pub fn type_name(&self) -> &'static str {
        self.type_tag().name()
    }

    /// Integer conversion accepted for indices: ints and bools.
    pub fn as_index(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Bool(b) => Some(*b as i64),
            _ => None,
        }
    }

    /// The string, if this is a `Str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Feed this value into `state`.
    ///
    /// Numbers that compare equal hash equally (`1`, `true` and `1.0`), so
    /// the hash agrees with `==`. Lists, dicts, arrays and references have
    /// no hash.
    pub fn try_hash<H: Hasher>(&self, state: &mut H) -> Result<(), Unhashable> {
        match self {
            Value::None => state.write_u8(0),
            Value::Bool(b) => hash_int(*b as i64, state),
            Value::Int(i) => hash_int(*i, state),
            Value::Float(f) => match float_as_int(*f) {
                Some(i) => hash_int(i, state),
                None => {
                    state.write_u8(2);
                    f.to_bits().hash(state);
                }
            },
            Value::Str(s) => {
                state.write_u8(3);
                s.hash(state);
            }
            Value::Tuple(items) => {
                state.write_u8(4);
                state.write_usize(items.len());
                for item in items {
                    item.try_hash(state)?;
                }
            }
            Value::List(_) | Value::Dict(_) | Value::Array(_) | Value::Ref(_) => {
                return Err(Unhashable(self.type_tag()));
            }
        }
        Ok(())
    }

    /// Returns true if [`try_hash`](Self::try_hash) succeeds.
    pub fn is_hashable(&self) -> bool {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.try_hash(&mut hasher).is_ok()
    }

    /// Number of leaves when this value is flattened as a tree.
    ///
    /// `None` and empty containers have no leaves.
    pub fn num_leaves(&self) -> usize {
        match self {
            Value::None => 0,
            Value::Tuple(items) | Value::List(items) => {
                items.iter().map(Value::num_leaves).sum()
            }
            Value::Dict(map) => map.values().map(Value::num_leaves).sum(),
            _ => 1,
        }
    }

    /// Leaves in flattening order, paired with their key paths.
    ///
    /// A leaf at the root has the empty path; nested leaves get `[i]` for
    /// sequence elements and `['k']` for dict entries.
    pub fn key_paths(&self) -> Vec<(String, &Value)> {
        let mut out = Vec::new();
        self.collect_key_paths(String::new(), &mut out);
        out
    }

    fn collect_key_paths<'a>(&'a self, prefix: String, out: &mut Vec<(String, &'a Value)>) {
        match self {
            Value::None => {}
            Value::Tuple(items) | Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    item.collect_key_paths(format!("{prefix}[{i}]"), out);
                }
            }
            Value::Dict(map) => {
                for (k, v) in map {
                    v.collect_key_paths(format!("{prefix}['{k}']"), out);
                }
            }
            leaf => out.push((prefix, leaf)),
        }
    }

    /// Leaves in flattening order.
    pub fn leaves(&self) -> Vec<&Value> {
        self.key_paths().into_iter().map(|(_, v)| v).collect()
    }

    /// First invalid floating-point value among the leaves, if any.
    pub fn find_invalid(&self, nans: bool, infs: bool) -> Option<InvalidKind> {
        let check = |x: f64| {
            if nans && x.is_nan() {
                Some(InvalidKind::Nan)
            } else if infs && x.is_infinite() {
                Some(InvalidKind::Inf)
            } else {
                None
            }
        };
        self.leaves().into_iter().find_map(|leaf| match leaf {
            Value::Float(x) => check(*x),
            Value::Array(a) if a.dtype().is_float() => {
                a.data().iter().find_map(|x| check(*x))
            }
            Value::Ref(r) => {
                let a = r.get();
                let found = if a.dtype().is_float() {
                    a.data().iter().find_map(|x| check(*x))
                } else {
                    None
                };
                found
            }
            _ => None,
        })
    }

    /// Abstract description of this value, used to key compiled entries.
    pub fn abstractify(&self) -> AbstractValue {
        match self {
            Value::Tuple(items) => {
                AbstractValue::Tuple(items.iter().map(Value::abstractify).collect())
            }
            Value::List(items) => {
                AbstractValue::List(items.iter().map(Value::abstractify).collect())
            }
            Value::Dict(map) => AbstractValue::Dict(
                map.iter().map(|(k, v)| (k.clone(), v.abstractify())).collect(),
            ),
            Value::Array(a) => AbstractValue::Array {
                dtype: a.dtype(),
                shape: a.shape().to_vec(),
            },
            Value::Ref(r) => {
                let a = r.get();
                AbstractValue::Ref { dtype: a.dtype(), shape: a.shape().to_vec() }
            }
            other => AbstractValue::Scalar(other.type_tag()),
        }
    }
}

fn hash_int<H: Hasher>(i: i64, state: &mut H) {
    state.write_u8(1);
    state.write_i64(i);
}

fn float_as_int(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn int_eq_float(i: i64, f: f64) -> bool {
    float_as_int(f) == Some(i)
}

impl PartialEq for Value {
    /// Value equality. Numbers compare across types, so `Int(1)`,
    /// `Bool(true)` and `Float(1.0)` are all equal.
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (None, None) => true,
            (Bool(a), Bool(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (Bool(a), Int(b)) | (Int(b), Bool(a)) => *a as i64 == *b,
            (Bool(a), Float(b)) | (Float(b), Bool(a)) => int_eq_float(*a as i64, *b),
            (Int(a), Float(b)) | (Float(b), Int(a)) => int_eq_float(*a, *b),
            (Str(a), Str(b)) => a == b,
            (Tuple(a), Tuple(b)) | (List(a), List(b)) => a == b,
            (Dict(a), Dict(b)) => a == b,
            (Array(a), Array(b)) => a == b,
            (Ref(a), Ref(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("None"),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) if float_as_int(*x).is_some() => write!(f, "{x:.1}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "'{s}'"),
            Value::Tuple(items) => {
                f.write_str("(")?;
                write_items(f, items)?;
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            Value::List(items) => {
                f.write_str("[")?;
                write_items(f, items)?;
                f.write_str("]")
            }
            Value::Dict(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "'{k}': {v}")?;
                }
                f.write_str("}")
            }
            Value::Array(a) => write!(f, "Array({})", a.str_short()),
            Value::Ref(r) => f.write_str(&r.str_short()),
        }
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<usize> for Value {
    fn from(i: usize) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<ArrayValue> for Value {
    fn from(a: ArrayValue) -> Self {
        Value::Array(a)
    }
}

impl From<MutableRef> for Value {
    fn from(r: MutableRef) -> Self {
        Value::Ref(r)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    /// Vectors become tuples.
    fn from(items: Vec<T>) -> Self {
        Value::tuple(items)
    }
}

/// Shape-level description of a value: containers keep their structure,
/// arrays keep dtype and shape, scalars keep only their type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AbstractValue {
    /// A non-array leaf; only its type matters.
    Scalar(TypeTag),
    /// An array of this element type and shape.
    Array {
        /// Element type.
        dtype: DType,
        /// Dimensions.
        shape: Vec<usize>,
    },
    /// A mutable reference to such an array.
    Ref {
        /// Element type.
        dtype: DType,
        /// Dimensions.
        shape: Vec<usize>,
    },
    /// A tuple of abstract values.
    Tuple(Vec<AbstractValue>),
    /// A list of abstract values.
    List(Vec<AbstractValue>),
    /// Entries in key order.
    Dict(Vec<(String, AbstractValue)>),
}

impl AbstractValue {
    /// Short description, e.g. `f32[3]` or `Ref{f32[3]}`.
    pub fn str_short(&self) -> String {
        match self {
            AbstractValue::Scalar(tag) => tag.name().to_string(),
            AbstractValue::Array { dtype, shape } => shape_str(*dtype, shape),
            AbstractValue::Ref { dtype, shape } => {
                format!("Ref{{{}}}", shape_str(*dtype, shape))
            }
            AbstractValue::Tuple(items) | AbstractValue::List(items) => {
                let parts: Vec<String> = items.iter().map(|a| a.str_short()).collect();
                format!("({})", parts.join(", "))
            }
            AbstractValue::Dict(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .map(|(k, a)| format!("{k}: {}", a.str_short()))
                    .collect();
                format!("{{{}}}", parts.join(", "))
            }
        }
    }
}
