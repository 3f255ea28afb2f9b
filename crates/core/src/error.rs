//! Error types for the Tessera evaluation engine.
//!
//! Binding conflicts during joins are not errors; they are reported as
//! unsatisfiable branches. The variants here cover plan validation at the
//! planner boundary and id resolution against an `Interner`.

use crate::interner::Id;
use alloc::string::String;
use thiserror::Error;

/// Result type alias for Tessera operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error types for Tessera operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// An id was resolved that the interner does not currently own.
    #[error("unknown id {id}: not allocated by this interner")]
    UnknownId { id: Id },
    /// A plan references a register that no scan binds.
    #[error("register {register} is used but never bound by a scan")]
    UnboundRegister { register: usize },
    /// A plan is structurally invalid.
    #[error("invalid plan: {message}")]
    InvalidPlan { message: String },
    /// An aggregate argument resolved to a non-numeric value.
    #[error("id {id} does not refer to a number")]
    NotANumber { id: Id },
    /// A configuration value is out of range.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl Error {
    /// Creates an unknown id error.
    pub fn unknown_id(id: Id) -> Self {
        Error::UnknownId { id }
    }

    /// Creates an unbound register error.
    pub fn unbound_register(register: usize) -> Self {
        Error::UnboundRegister { register }
    }

    /// Creates an invalid plan error.
    pub fn invalid_plan(message: impl Into<String>) -> Self {
        Error::InvalidPlan {
            message: message.into(),
        }
    }

    /// Creates a not-a-number error.
    pub fn not_a_number(id: Id) -> Self {
        Error::NotANumber { id }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Error::InvalidConfig {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_error_display() {
        let err = Error::unknown_id(7);
        assert!(err.to_string().contains("unknown id 7"));

        let err = Error::unbound_register(3);
        assert!(err.to_string().contains("register 3"));

        let err = Error::invalid_plan("empty block");
        assert!(err.to_string().contains("empty block"));
    }

    #[test]
    fn test_error_constructors() {
        let err = Error::invalid_plan("no scans");
        match err {
            Error::InvalidPlan { message } => assert_eq!(message, "no scans"),
            _ => panic!("Wrong error type"),
        }
        assert_eq!(Error::not_a_number(2), Error::NotANumber { id: 2 });
        assert!(matches!(Error::invalid_config("x"), Error::InvalidConfig { .. }));
    }
}
