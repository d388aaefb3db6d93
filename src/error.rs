//! Error types.

use thiserror::Error;

use crate::signature::BindError;

/// Crate result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while resolving argument roles or calling a jitted function.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A value could not be converted to an index or a name, or a keyword
    /// argument could not be resolved to a position.
    #[error("{0}")]
    Type(String),

    /// Argnums out of range for the positional parameters.
    #[error(
        "Jitted function has {field}={argnums:?}, but only accepts \
         {n_pos_args} positional arguments."
    )]
    InvalidArgnums {
        /// Option the argnums came from, e.g. `static_argnums`.
        field: &'static str,
        /// The offending argnums.
        argnums: Vec<i64>,
        /// Number of positional parameters.
        n_pos_args: usize,
    },

    /// Argnames naming no keyword-passable parameter.
    #[error("Jitted function has invalid argnames {names:?} in {field}. {reason}")]
    InvalidArgnames {
        /// Option the argnames came from, e.g. `static_argnames`.
        field: &'static str,
        /// The offending names.
        names: Vec<String>,
        /// Why they were rejected.
        reason: &'static str,
    },

    /// A static index outside the passed arguments.
    #[error(
        "Positional argument indices, e.g. for `static_argnums`, must have \
         value greater than or equal to -len(args) and less than len(args), \
         but got value {index} for len(args) == {num_args}."
    )]
    IndexOutOfBounds {
        /// The index as given.
        index: i64,
        /// Number of positional arguments passed.
        num_args: usize,
    },

    /// `donate_argnames` were given for a function without a signature.
    #[error(
        "Getting the signature of function {fun} failed. Pass donate_argnums \
         instead of donate_argnames."
    )]
    SignatureUnavailable {
        /// Function name.
        fun: String,
    },

    /// An argument position is both static and donated.
    #[error("`static_argnums` {static_argnums:?} and `donate_argnums` {donate_argnums:?} cannot intersect.")]
    ArgnumsIntersect {
        /// Static positions.
        static_argnums: Vec<i64>,
        /// Donated positions.
        donate_argnums: Vec<i64>,
    },

    /// Donated positions cannot be rebased because some index is negative.
    #[error(
        "Cannot rebase donated arguments past static ones with negative indices: \
         `static_argnums` {static_argnums:?}, `donate_argnums` {donate_argnums:?}. \
         Negative argnums are only resolved against a signature without *args."
    )]
    NegativeArgnums {
        /// Static positions.
        static_argnums: Vec<i64>,
        /// Donated positions.
        donate_argnums: Vec<i64>,
    },

    /// An argument name is both static and donated.
    #[error(
        "static_argnames and donate_argnames cannot intersect. Argument names \
         {names:?} appear in both static_argnames and donate_argnames"
    )]
    ArgnamesIntersect {
        /// Names in both roles.
        names: Vec<String>,
    },

    /// A static argument value cannot be hashed.
    #[error(
        "Non-hashable static arguments are not supported, as this can lead to \
         unexpected cache-misses. Static argument ({arg}) of type {type_name} \
         for function {fun} is non-hashable."
    )]
    NonHashableStatic {
        /// `index i` or `name n`.
        arg: String,
        /// Type of the value.
        type_name: &'static str,
        /// Function name.
        fun: String,
    },

    /// Arguments do not match the signature.
    #[error(transparent)]
    Binding(#[from] BindError),

    /// A malformed parameter list.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// A mutable array reference reached a function twice.
    #[error("{0}")]
    AliasedRef(String),

    /// A jitted output held NaN or Inf.
    #[error("{0}")]
    FloatingPoint(String),

    /// The user function failed.
    #[error(transparent)]
    Call(#[from] CallError),
}

/// Error returned by a user function.
///
/// Propagated through wrapped functions unmodified.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CallError {
    /// An invalid floating-point operation.
    #[error("FloatingPointError: {0}")]
    FloatingPoint(String),

    /// Division by zero.
    #[error("ZeroDivisionError: {0}")]
    ZeroDivision(String),

    /// Any other failure.
    #[error("{0}")]
    Other(String),
}

impl CallError {
    /// Returns true for the errors the debug recovery path re-raises.
    pub fn is_floating_point(&self) -> bool {
        matches!(self, CallError::FloatingPoint(_) | CallError::ZeroDivision(_))
    }
}
