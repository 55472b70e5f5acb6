//! Protocol Errors

use thiserror::Error;

/// Transport-class failure of a remote command.
///
/// Everything that prevents a reply body from reaching the interpreter ends
/// up here. None of these are application errors; the server's own
/// rejections travel inside the body and are classified by
/// [`crate::interpret`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The request never completed (offline, CORS, aborted).
    #[error("network error: {0}")]
    Network(String),
    /// The server answered with a non-success HTTP status.
    #[error("server answered with status {0}")]
    Status(u16),
    /// The server raised while handling the call.
    #[error("server fault: {0}")]
    Remote(String),
    /// The reply could not be read or decoded as a JSON-RPC reply.
    #[error("malformed reply: {0}")]
    Malformed(String),
}

impl GatewayError {
    /// Text shown to the user next to the retry affordance.
    pub fn user_message(&self) -> String {
        match self {
            GatewayError::Network(_) => {
                "The server could not be reached. Your change was not saved.".to_string()
            }
            GatewayError::Status(status) => {
                format!("The server answered with status {status}. Your change was not saved.")
            }
            GatewayError::Remote(message) => message.clone(),
            GatewayError::Malformed(_) => {
                "The server sent an unreadable reply. Your change was not saved.".to_string()
            }
        }
    }
}

/// Failure to assemble a remote command from the triggering element.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    #[error("parameter `{key}` needs attribute `{attr}`, which is absent")]
    MissingAttribute { key: &'static str, attr: &'static str },
    #[error("parameter `{key}` has no value")]
    MissingValue { key: &'static str },
    #[error("parameter `{key}` expects an integer, got `{raw}`")]
    NotAnInteger { key: &'static str, raw: String },
}
