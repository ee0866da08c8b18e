use std::fmt;

use thiserror::Error;

/// A scalar field that must be present and non-empty in every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    Name,
    Date,
    Initiator,
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MissingField::Name => "name",
            MissingField::Date => "date",
            MissingField::Initiator => "initiator",
        };
        f.write_str(label)
    }
}

/// Errors raised when a message body cannot be decoded into a [`crate::Rally`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A required scalar field is absent or empty.
    #[error("missing field in record: {0}")]
    MissingField(MissingField),

    /// The limit line is present but does not hold a non-negative integer.
    #[error("invalid limit: {0:?}")]
    InvalidLimit(String),
}
