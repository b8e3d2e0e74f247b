//! Save-notification handlers.
//!
//! A save (of a text document or a notebook) is only a trigger: the
//! payload identifies which document was saved, but regeneration always
//! targets the configured plugin module and stubs path.

use crate::handlers::HandlerError;
use crate::server::Shared;
use artificial_workflows_stubs::GenerationContext;
use lsp_types::{DidSaveNotebookDocumentParams, DidSaveTextDocumentParams};
use serde_json::Value;
use std::sync::Arc;

/// `textDocument/didSave`.
pub async fn did_save_text(shared: Arc<Shared>, params: Value) -> Result<(), HandlerError> {
    if let Ok(params) = serde_json::from_value::<DidSaveTextDocumentParams>(params) {
        tracing::debug!(uri = params.text_document.uri.as_str(), "text document saved");
    }
    regenerate(&shared).await
}

/// `notebookDocument/didSave`.
pub async fn did_save_notebook(shared: Arc<Shared>, params: Value) -> Result<(), HandlerError> {
    if let Ok(params) = serde_json::from_value::<DidSaveNotebookDocumentParams>(params) {
        tracing::debug!(
            uri = params.notebook_document.uri.as_str(),
            "notebook document saved"
        );
    }
    regenerate(&shared).await
}

/// Regenerate stubs for the configured module and output path.
async fn regenerate(shared: &Shared) -> Result<(), HandlerError> {
    tracing::info!(
        plugin_module = %shared.config.plugin_module,
        stubs_output_path = %shared.config.stubs_output_path.display(),
        "regenerating action stubs after save"
    );

    let mut ctx = GenerationContext::new(
        shared.config.plugin_module.clone(),
        shared.config.stubs_output_path.clone(),
    );
    if let Some(root) = &shared.config.config_root {
        ctx = ctx.with_config_root(root);
    }
    shared.generator.generate(&ctx).await?;
    Ok(())
}
