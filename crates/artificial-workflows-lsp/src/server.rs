//! Server lifecycle and transport loop.
//!
//! The server has two states: *registering*, while handlers are installed
//! and the `initialize` handshake runs, and *serving*, a loop over incoming
//! messages that lasts until the client sends `exit` or the transport
//! closes. Each handler invocation runs as its own task, so a handler
//! suspended on the stub tool never blocks dispatch of later messages.

use crate::config::ServerConfig;
use crate::handlers;
use crate::router::Router;
use artificial_workflows_stubs::{StubGenerator, ToolStubGenerator};
use lsp_server::{Connection, ErrorCode, Message, Notification, Request, Response};
use lsp_types::notification::Notification as _;
use lsp_types::request::Request as _;
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinSet;

/// State every handler invocation sees: the resolved configuration and the
/// stub-generation collaborator. Immutable once serving begins.
pub struct Shared {
    /// Server configuration after `initializationOptions` were applied.
    pub config: ServerConfig,
    /// The stub-generation collaborator.
    pub generator: Arc<dyn StubGenerator>,
}

/// Errors that terminate the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The `initialize` handshake or transport framing failed.
    #[error(transparent)]
    Protocol(#[from] lsp_server::ProtocolError),
    /// A lifecycle message could not be decoded.
    #[error("malformed message")]
    Decode(#[from] serde_json::Error),
    /// The stdio threads failed.
    #[error("transport I/O failed")]
    Io(#[from] std::io::Error),
}

/// The Artificial workflows language server.
pub struct Server {
    config: ServerConfig,
    generator: Arc<dyn StubGenerator>,
    router: Router,
}

impl Server {
    /// A server that shells out to the external workflow tooling CLI for
    /// stub generation.
    pub fn new(config: ServerConfig) -> Self {
        Self::with_generator(config, Arc::new(ToolStubGenerator::default()))
    }

    /// A server with a custom stub-generation collaborator.
    pub fn with_generator(config: ServerConfig, generator: Arc<dyn StubGenerator>) -> Self {
        Self {
            config,
            generator,
            router: handlers::router(),
        }
    }

    /// Serve over stdio until the client disconnects.
    pub async fn run(self) -> Result<(), ServerError> {
        let (connection, io_threads) = Connection::stdio();
        self.serve(connection).await?;
        io_threads.join()?;
        Ok(())
    }

    /// Serve over an established connection (stdio in production, an
    /// in-memory pair in tests).
    pub async fn serve(mut self, connection: Connection) -> Result<(), ServerError> {
        self.initialize(&connection)?;

        let shared = Arc::new(Shared {
            config: self.config.clone(),
            generator: Arc::clone(&self.generator),
        });
        let Connection { sender, receiver } = connection;
        let mut messages = pump(receiver);
        let mut tasks = JoinSet::new();

        while let Some(message) = messages.recv().await {
            match message {
                Message::Request(request) => {
                    if request.method == lsp_types::request::Shutdown::METHOD {
                        let response = Response::new_ok(request.id, Value::Null);
                        let _ = sender.send(Message::Response(response));
                        continue;
                    }
                    self.dispatch_request(request, &shared, &sender, &mut tasks);
                }
                Message::Notification(notification) => {
                    if notification.method == lsp_types::notification::Exit::METHOD {
                        tracing::info!("exit notification received");
                        break;
                    }
                    self.dispatch_notification(notification, &shared, &mut tasks);
                }
                Message::Response(response) => {
                    tracing::debug!(id = ?response.id, "ignoring response; this server sends no requests");
                }
            }
        }

        // Let in-flight handlers finish before tearing down the transport.
        while tasks.join_next().await.is_some() {}
        Ok(())
    }

    /// Run the `initialize` handshake: apply `initializationOptions` and
    /// advertise the capabilities derived from the registered handlers.
    fn initialize(&mut self, connection: &Connection) -> Result<(), ServerError> {
        let (id, params) = connection.initialize_start()?;
        let params: lsp_types::InitializeParams = serde_json::from_value(params)?;
        self.config
            .apply_initialization_options(params.initialization_options.as_ref());

        let result = lsp_types::InitializeResult {
            capabilities: self.capabilities(),
            server_info: Some(lsp_types::ServerInfo {
                name: "artificial-workflows-lsp".to_string(),
                version: Some(crate::VERSION.to_string()),
            }),
        };
        connection.initialize_finish(id, serde_json::to_value(result)?)?;

        tracing::info!(
            commands = ?self.router.command_names(),
            config_root = ?self.config.config_root,
            "server initialized"
        );
        Ok(())
    }

    /// Capabilities follow the registrations: the registered commands, plus
    /// save notifications for text and notebook documents.
    fn capabilities(&self) -> lsp_types::ServerCapabilities {
        lsp_types::ServerCapabilities {
            execute_command_provider: Some(lsp_types::ExecuteCommandOptions {
                commands: self.router.command_names(),
                work_done_progress_options: lsp_types::WorkDoneProgressOptions::default(),
            }),
            text_document_sync: Some(lsp_types::TextDocumentSyncCapability::Options(
                lsp_types::TextDocumentSyncOptions {
                    save: Some(lsp_types::TextDocumentSyncSaveOptions::Supported(true)),
                    ..lsp_types::TextDocumentSyncOptions::default()
                },
            )),
            notebook_document_sync: Some(lsp_types::OneOf::Left(
                lsp_types::NotebookDocumentSyncOptions {
                    notebook_selector: vec![lsp_types::NotebookSelector::ByNotebook {
                        notebook: lsp_types::Notebook::String("*".to_string()),
                        cells: None,
                    }],
                    save: Some(true),
                },
            )),
            ..lsp_types::ServerCapabilities::default()
        }
    }

    /// Route a request. Only `workspace/executeCommand` is served; other
    /// methods get a `MethodNotFound` response, matching the transport's
    /// default policy for unknown requests.
    fn dispatch_request(
        &self,
        request: Request,
        shared: &Arc<Shared>,
        sender: &crossbeam_channel::Sender<Message>,
        tasks: &mut JoinSet<()>,
    ) {
        if request.method != lsp_types::request::ExecuteCommand::METHOD {
            tracing::debug!(method = %request.method, "unknown request method");
            let response = Response::new_err(
                request.id,
                ErrorCode::MethodNotFound as i32,
                format!("method not supported: {}", request.method),
            );
            let _ = sender.send(Message::Response(response));
            return;
        }

        let params: lsp_types::ExecuteCommandParams = match serde_json::from_value(request.params)
        {
            Ok(params) => params,
            Err(err) => {
                let response = Response::new_err(
                    request.id,
                    ErrorCode::InvalidParams as i32,
                    format!("malformed executeCommand params: {err}"),
                );
                let _ = sender.send(Message::Response(response));
                return;
            }
        };
        let lsp_types::ExecuteCommandParams {
            command, arguments, ..
        } = params;

        let Some(handler) = self.router.command(&command) else {
            let response = Response::new_err(
                request.id,
                ErrorCode::MethodNotFound as i32,
                format!("unknown command: {command}"),
            );
            let _ = sender.send(Message::Response(response));
            return;
        };

        let id = request.id;
        let shared = Arc::clone(shared);
        let sender = sender.clone();
        tasks.spawn(async move {
            let response = match handler(shared, arguments).await {
                Ok(value) => Response::new_ok(id, value),
                Err(err) => {
                    tracing::error!(command = %command, error = %err, "command failed");
                    Response::new_err(id, err.code(), err.to_string())
                }
            };
            let _ = sender.send(Message::Response(response));
        });
    }

    /// Route a notification. Unregistered methods are ignored; a handler
    /// failure is logged only, since there is no caller to answer.
    fn dispatch_notification(
        &self,
        notification: Notification,
        shared: &Arc<Shared>,
        tasks: &mut JoinSet<()>,
    ) {
        let Some(handler) = self.router.notification(&notification.method) else {
            tracing::debug!(method = %notification.method, "ignoring unhandled notification");
            return;
        };

        let Notification { method, params } = notification;
        let shared = Arc::clone(shared);
        tasks.spawn(async move {
            if let Err(err) = handler(shared, params).await {
                tracing::error!(method = %method, error = %err, "notification handler failed");
            }
        });
    }
}

/// Forward messages from the transport's blocking channel into the async
/// loop. The pump thread ends when the transport disconnects.
fn pump(
    receiver: crossbeam_channel::Receiver<Message>,
) -> tokio::sync::mpsc::UnboundedReceiver<Message> {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    tokio::task::spawn_blocking(move || {
        for message in receiver {
            if tx.send(message).is_err() {
                break;
            }
        }
    });
    rx
}
