//! Language Server Protocol server for Artificial workflow authoring.
//!
//! The server is a thin command/notification router over the `lsp-server`
//! transport. It exposes two workspace commands,
//! `artificial-workflows-lsp.getConfig` and
//! `artificial-workflows-lsp.generateActionStubs`, and regenerates action
//! stubs whenever a text or notebook document is saved. All stub generation
//! is delegated to an external tool behind the
//! [`artificial_workflows_stubs::StubGenerator`] seam.

pub mod config;
pub mod handlers;
pub mod router;
pub mod server;

pub use config::ServerConfig;
pub use server::{Server, ServerError};

/// Server version, advertised during the `initialize` handshake.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
