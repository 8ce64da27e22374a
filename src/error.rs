use crate::api::TransportError;
use crate::services::validation::ValidationErrors;

pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred. Please try again.";

/// Failure of one client operation. `Display` is the user-visible text.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Input rejected locally; no request was issued.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Request { status: u16, message: String },

    /// No response arrived at all.
    #[error("{}", UNEXPECTED_ERROR)]
    Transport(#[from] TransportError),

    /// The response parsed but did not have the expected structure.
    #[error("{0}")]
    Shape(String),

    /// Another submission from the same form is still outstanding.
    #[error("A submission is already in progress.")]
    Busy,
}
