//! Handlers for the `workspace/executeCommand` surface.

use crate::handlers::HandlerError;
use crate::server::Shared;
use artificial_workflows_stubs::GenerationContext;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

/// Returns the resolved adapter configuration as a key/value mapping.
pub const GET_CONFIG: &str = "artificial-workflows-lsp.getConfig";

/// Generates action stubs for a caller-supplied plugin module and output
/// path.
pub const GENERATE_ACTION_STUBS: &str = "artificial-workflows-lsp.generateActionStubs";

/// `artificial-workflows-lsp.getConfig`.
///
/// Takes no semantic arguments (anything supplied is ignored). The config
/// root comes from the server configuration, threaded in at startup or via
/// `initializationOptions`, never from mutating the process environment.
pub async fn get_config(shared: Arc<Shared>, _args: Vec<Value>) -> Result<Value, HandlerError> {
    let root = shared.config.config_root.as_ref().ok_or_else(|| {
        HandlerError::Unavailable(format!(
            "no config root configured; set {} or pass configRoot in initializationOptions",
            crate::config::CONFIG_ROOT_ENV
        ))
    })?;
    let config = artificial_workflows_config::resolve(root)?;
    Ok(serde_json::to_value(config)?)
}

/// The decoded argument list of [`GENERATE_ACTION_STUBS`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubsArgs {
    /// Dotted identifier of the plugin module to introspect.
    pub plugin_module: String,
    /// Destination file for the generated stubs.
    pub stubs_output_path: PathBuf,
}

impl StubsArgs {
    /// Decode the wire-level `[plugin_module, stubs_output_path]` pair,
    /// failing with a descriptive error on arity or type mismatch.
    pub fn parse(args: &[Value]) -> Result<Self, HandlerError> {
        let [module, path] = args else {
            return Err(HandlerError::InvalidArgs(format!(
                "expected [pluginModule, stubsOutputPath], got {} argument(s)",
                args.len()
            )));
        };
        let plugin_module = module.as_str().ok_or_else(|| {
            HandlerError::InvalidArgs("pluginModule must be a string".to_string())
        })?;
        let stubs_output_path = path.as_str().ok_or_else(|| {
            HandlerError::InvalidArgs("stubsOutputPath must be a string".to_string())
        })?;
        Ok(Self {
            plugin_module: plugin_module.to_string(),
            stubs_output_path: PathBuf::from(stubs_output_path),
        })
    }
}

/// `artificial-workflows-lsp.generateActionStubs`.
///
/// Builds one generation context from the validated arguments, awaits the
/// stub generator, and acknowledges with the literal `{"config": "config"}`
/// (the established wire contract; the payload carries no information).
pub async fn generate_action_stubs(
    shared: Arc<Shared>,
    args: Vec<Value>,
) -> Result<Value, HandlerError> {
    let parsed = StubsArgs::parse(&args)?;
    tracing::info!(
        plugin_module = %parsed.plugin_module,
        stubs_output_path = %parsed.stubs_output_path.display(),
        "generating action stubs on request"
    );

    let mut ctx = GenerationContext::new(parsed.plugin_module, parsed.stubs_output_path);
    if let Some(root) = &shared.config.config_root {
        ctx = ctx.with_config_root(root);
    }
    shared.generator.generate(&ctx).await?;

    Ok(serde_json::json!({ "config": "config" }))
}
