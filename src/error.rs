//! Input faults.
//!
//! An `InputFault` means the engine could not produce a decision at all.
//! It is never used for a denied attempt; denials are ordinary decisions.

use thiserror::Error;

/// A missing or malformed input that aborts evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputFault {
    /// No record is registered under the given user id.
    #[error("unknown user id: {0}")]
    UnknownUser(String),

    /// No reference configuration was supplied to the evaluation.
    #[error("reference configuration is not available")]
    MissingReferenceConfiguration,

    /// A record failed validation.
    #[error("malformed record {id:?}: {reason}")]
    MalformedRecord {
        /// Id of the offending record (may be empty).
        id: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A record with this id is already registered.
    #[error("user id already registered: {0}")]
    DuplicateUser(String),

    /// An update attempted to change a record's id.
    #[error("record id is immutable: {original} cannot become {attempted}")]
    IdentityChanged {
        /// The id the record was stored under.
        original: String,
        /// The id the update tried to assign.
        attempted: String,
    },

    /// The reference configuration failed validation.
    #[error("malformed reference configuration: {0}")]
    MalformedConfiguration(String),

    /// A configuration or seed file could not be read.
    #[error("io error: {0}")]
    Io(String),

    /// A configuration or seed file could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),
}

impl InputFault {
    pub(crate) fn malformed_record(id: &str, reason: impl Into<String>) -> Self {
        InputFault::MalformedRecord {
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}
