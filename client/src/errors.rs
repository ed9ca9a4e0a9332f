use thiserror::Error;

/// Message shown when a request never got a response.
pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please check your connection.";

/// Message shown when the server failed without saying why.
pub const SERVER_ERROR_FALLBACK: &str = "An error occurred";

/// Failure of a single Gateway round trip.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// No response reached the client.
    #[error("{}", NETWORK_ERROR_MESSAGE)]
    Network,

    /// The server answered with a non-success status.
    #[error("{message}")]
    Server { status: u16, message: String },

    /// Anything else, passed through unchanged.
    #[error("{0}")]
    Other(String),
}

/// Failure of a Store step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("No conversation selected")]
    NoConversationSelected,
}

impl ChatError {
    /// The text to surface to the user, or `fallback` when the error has none.
    pub fn user_message(&self, fallback: &str) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            fallback.to_string()
        } else {
            message
        }
    }
}
