//! Error types for the `usergroup-models` crate.
//!
//! All fallible constructors and parsers in this crate return variants of
//! [`ModelError`].

/// Errors produced when constructing or parsing model types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// A stored group-id list contained an element that is not an integer.
    #[error("invalid group id list \"{value}\": {reason}")]
    InvalidGroupIds {
        /// The value that failed validation.
        value: String,
        /// Human-readable explanation.
        reason: String,
    },

    /// An expiry claim does not map to a representable calendar time.
    #[error("invalid expiry timestamp {value}")]
    InvalidExpiry {
        /// The epoch-seconds value that failed conversion.
        value: String,
    },

    /// A stored field could not be converted to its typed form.
    #[error("invalid value \"{value}\" for field {field}")]
    InvalidField {
        /// The field name.
        field: String,
        /// The value that failed conversion.
        value: String,
    },

    /// A required field was missing when rebuilding a value.
    #[error("missing required field: {field}")]
    MissingField {
        /// The name of the missing field.
        field: String,
    },
}
