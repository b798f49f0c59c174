//! Error types for the User controller.

use thiserror::Error;

/// Errors that can occur during user actions.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum UserError {
    /// The requested user was not found.
    #[error("User not found: {0}")]
    NotFound(String),

    /// A request parameter the action needs was not supplied.
    #[error("Missing request parameter: {0}")]
    MissingParam(&'static str),

    /// The route named an action this controller does not have.
    #[error("Unknown user action: {0}")]
    UnknownAction(String),

    /// The user directory could not be read. [`UserDirectory`](super::UserDirectory)
    /// implementations backed by something fallible return this.
    #[error("User directory error: {0}")]
    DirectoryError(String),
}
