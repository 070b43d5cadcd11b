//! Error taxonomy for coil, printer, store, and engine operations.

use crate::fault::Fault;

/// Errors returned by fleet and simulation operations.
///
/// The messages carried by [Error::InvalidInput] and [Error::Resource] are
/// part of the observable contract: callers match on them verbatim.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The caller passed a value violating an operation precondition.
    #[error("{0}")]
    InvalidInput(String),

    /// The operation would violate a resource invariant of the printer,
    /// its coil, or its queue.
    #[error("{0}")]
    Resource(String),

    /// A fault interrupted an in-progress print mid-tick.
    #[error(transparent)]
    Fault(#[from] Fault),

    /// A record lookup failed.
    #[error("{kind} not found by id: {id}")]
    NotFound {
        /// The kind of record that was looked up.
        kind: &'static str,

        /// The id the lookup was keyed on.
        id: String,
    },
}

impl Error {
    pub(crate) fn invalid_input(message: &str) -> Self {
        Self::InvalidInput(message.to_owned())
    }

    pub(crate) fn resource(message: &str) -> Self {
        Self::Resource(message.to_owned())
    }

    pub(crate) fn not_found(kind: &'static str, id: &str) -> Self {
        Self::NotFound {
            kind,
            id: id.to_owned(),
        }
    }
}
