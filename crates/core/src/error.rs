//! Error taxonomy shared by the store client and the controllers.

use thiserror::Error;

use crate::form::ValidationFailure;

/// Message shown to the user whenever a store round-trip fails.
pub const GENERIC_FAILURE: &str = "The request to the record store failed. Please try again.";

/// Failures reported by a [`RemoteStore`](crate::store::RemoteStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// No row in `collection` matches `id`.
    #[error("no {collection} row with id {id}")]
    NotFound {
        /// Collection that was queried.
        collection: &'static str,
        /// Identifier that had no match.
        id: String,
    },
    /// The request never produced a response.
    #[error("request to {collection} failed: {source}")]
    Transport {
        /// Collection that was queried.
        collection: &'static str,
        /// Underlying HTTP client error.
        #[source]
        source: reqwest::Error,
    },
    /// The backend answered with a non-success status.
    #[error("{collection} rejected the request ({status}): {message}")]
    Rejected {
        /// Collection that was queried.
        collection: &'static str,
        /// HTTP status code returned by the backend.
        status: u16,
        /// Backend supplied explanation.
        message: String,
    },
    /// The backend answered with a body that could not be mapped onto the model.
    #[error("failed to decode {collection} payload: {message}")]
    Decode {
        /// Collection that was queried.
        collection: &'static str,
        /// Decoder explanation.
        message: String,
    },
}

impl StoreError {
    /// True when the error means the requested row does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Failures while submitting a draft.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Required fields were empty; nothing was sent.
    #[error(transparent)]
    Validation(#[from] ValidationFailure),
    /// The store refused or never answered the write.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Submit was requested while no draft was open.
    #[error("no draft is being edited")]
    NotEditing,
}

impl SubmitError {
    /// Text suitable for a status line.
    ///
    /// Validation failures name the missing fields; every store failure
    /// (including a row that vanished mid-edit) collapses to [`GENERIC_FAILURE`].
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(failure) => failure.to_string(),
            Self::Store(_) => GENERIC_FAILURE.to_string(),
            Self::NotEditing => self.to_string(),
        }
    }
}
