//! Element types for array arguments.

use std::fmt;

/// Element type of an [`ArrayValue`](crate::ArrayValue).
///
/// Only used to describe arguments in abstract signatures and error
/// messages; element data is always held as `f64`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DType {
    /// 16-bit floating point
    Float16,
    /// 32-bit floating point
    Float32,
    /// 64-bit floating point
    Float64,
    /// 32-bit signed integer
    Int32,
    /// 64-bit signed integer
    Int64,
    /// 32-bit unsigned integer
    Uint32,
    /// Boolean
    Bool,
}

impl DType {
    /// Returns true if this is a floating-point dtype.
    ///
    /// Only floating-point arrays can hold NaN or infinite values.
    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, DType::Float16 | DType::Float32 | DType::Float64)
    }

    /// Short name used in abstract value strings, e.g. `f32[3,4]`.
    pub const fn short_name(self) -> &'static str {
        match self {
            DType::Float16 => "f16",
            DType::Float32 => "f32",
            DType::Float64 => "f64",
            DType::Int32 => "i32",
            DType::Int64 => "i64",
            DType::Uint32 => "u32",
            DType::Bool => "bool",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DType::Float16 => write!(f, "float16"),
            DType::Float32 => write!(f, "float32"),
            DType::Float64 => write!(f, "float64"),
            DType::Int32 => write!(f, "int32"),
            DType::Int64 => write!(f, "int64"),
            DType::Uint32 => write!(f, "uint32"),
            DType::Bool => write!(f, "bool"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_float() {
        assert!(DType::Float16.is_float());
        assert!(DType::Float32.is_float());
        assert!(DType::Float64.is_float());
        assert!(!DType::Int32.is_float());
        assert!(!DType::Bool.is_float());
    }

    #[test]
    fn test_names() {
        assert_eq!(DType::Float32.to_string(), "float32");
        assert_eq!(DType::Float32.short_name(), "f32");
        assert_eq!(DType::Uint32.to_string(), "uint32");
        assert_eq!(DType::Bool.short_name(), "bool");
    }
}
