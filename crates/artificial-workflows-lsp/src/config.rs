//! Server configuration: where the config root lives and what the
//! save-triggered stub regeneration targets.
//!
//! The configuration root is read from `ARTIFICIAL_CONFIG_ROOT` once at
//! startup and threaded through explicitly from then on; handlers never
//! touch the process environment. Clients can override any field through
//! `initializationOptions`.

use serde::Deserialize;
use std::path::PathBuf;

/// Default stub destination, relative to the process working directory.
pub const DEFAULT_STUBS_OUTPUT_PATH: &str = "workflow/stubs/stubs_actions.py";

/// Default plugin module introspected on save.
pub const DEFAULT_PLUGIN_MODULE: &str = "adapter.main.plugin";

/// Environment variable naming the configuration root directory.
pub const CONFIG_ROOT_ENV: &str = "ARTIFICIAL_CONFIG_ROOT";

/// Settings fixed at process start (modulo `initializationOptions`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Directory of YAML configuration fragments, if known.
    pub config_root: Option<PathBuf>,
    /// Where save-triggered regeneration writes its stubs.
    pub stubs_output_path: PathBuf,
    /// Which plugin module save-triggered regeneration introspects.
    pub plugin_module: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            config_root: None,
            stubs_output_path: PathBuf::from(DEFAULT_STUBS_OUTPUT_PATH),
            plugin_module: DEFAULT_PLUGIN_MODULE.to_string(),
        }
    }
}

/// The subset of fields a client may override via `initializationOptions`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Overrides {
    config_root: Option<PathBuf>,
    stubs_output_path: Option<PathBuf>,
    plugin_module: Option<String>,
}

impl ServerConfig {
    /// Defaults, with the config root seeded from [`CONFIG_ROOT_ENV`].
    pub fn from_env() -> Self {
        let root = std::env::var_os(CONFIG_ROOT_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        Self {
            config_root: root,
            ..Self::default()
        }
    }

    /// Apply the recognized `initializationOptions` keys (`configRoot`,
    /// `stubsOutputPath`, `pluginModule`). Unknown keys are ignored; a
    /// malformed options value is logged and skipped rather than failing
    /// the handshake.
    pub fn apply_initialization_options(&mut self, options: Option<&serde_json::Value>) {
        let Some(options) = options else {
            return;
        };
        match serde_json::from_value::<Overrides>(options.clone()) {
            Ok(overrides) => {
                if let Some(root) = overrides.config_root {
                    self.config_root = Some(root);
                }
                if let Some(path) = overrides.stubs_output_path {
                    self.stubs_output_path = path;
                }
                if let Some(module) = overrides.plugin_module {
                    self.plugin_module = module;
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "ignoring malformed initializationOptions");
            }
        }
    }
}
