//! LSP command and notification handlers.
//!
//! Each handler runs against the immutable shared server state and either
//! produces a response payload (commands) or nothing (notifications).

pub mod commands;
pub mod documents;

use crate::router::Router;
use lsp_server::ErrorCode;
use lsp_types::notification::Notification;

/// Errors a handler can surface.
///
/// On the command path these become protocol error responses; on the
/// notification path they are logged and dropped, since there is no caller
/// to answer.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// The argument list did not match the command's contract.
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
    /// A prerequisite (e.g. the config root) is not configured.
    #[error("{0}")]
    Unavailable(String),
    /// Configuration resolution failed.
    #[error(transparent)]
    Config(#[from] artificial_workflows_config::ConfigError),
    /// The stub-generation collaborator failed.
    #[error(transparent)]
    Stubs(#[from] artificial_workflows_stubs::StubError),
    /// A response payload could not be encoded.
    #[error("failed to encode response")]
    Encode(#[from] serde_json::Error),
}

impl HandlerError {
    /// The JSON-RPC error code this failure maps to.
    pub fn code(&self) -> i32 {
        match self {
            Self::InvalidArgs(_) => ErrorCode::InvalidParams as i32,
            _ => ErrorCode::RequestFailed as i32,
        }
    }
}

/// Build the router with every handler this server exposes.
///
/// This is the complete dispatch surface: two workspace commands and the
/// two document-save notifications.
pub(crate) fn router() -> Router {
    let mut router = Router::new();
    router.register_command(commands::GET_CONFIG, commands::get_config);
    router.register_command(commands::GENERATE_ACTION_STUBS, commands::generate_action_stubs);
    router.register_notification(
        lsp_types::notification::DidSaveTextDocument::METHOD,
        documents::did_save_text,
    );
    router.register_notification(
        lsp_types::notification::DidSaveNotebookDocument::METHOD,
        documents::did_save_notebook,
    );
    router
}
