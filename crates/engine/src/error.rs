//! Error types for the land registry.

use thiserror::Error;

/// Errors returned by [`LandRepository`](crate::repository::LandRepository).
///
/// `Display` output is phrased for the player who triggered the operation.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A land with this name is already registered.
    #[error("a land named '{0}' already exists")]
    AlreadyExists(String),

    /// No land with this name is registered.
    #[error("there is no land named '{0}'")]
    NotFound(String),

    /// A stored record could not be encoded or decoded.
    #[error("land record '{name}' is unreadable: {source}")]
    Codec {
        /// The record key.
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// The persistence collaborator failed.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}
