//! Stub-generation seam for Artificial workflow tooling.
//!
//! Stub generation itself (introspecting a plugin module and writing
//! scaffold code) lives in the external workflow tooling CLI. This crate
//! owns the boundary: the [`GenerationContext`] describing one invocation,
//! the [`StubGenerator`] trait the server dispatches through, and
//! [`ToolStubGenerator`], which runs the external tool as a child process.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitStatus;

/// Everything one stub-generation invocation needs.
///
/// The plugin module and output path are required; the config root is an
/// optional collaborator reference, forwarded to the external tool's
/// environment when present. Contexts are built fresh per invocation and
/// never shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationContext {
    /// Dotted identifier of the plugin module to introspect,
    /// e.g. `adapter.main.plugin`.
    pub plugin_module: String,
    /// Destination file for the generated stubs.
    pub stubs_path: PathBuf,
    config_root: Option<PathBuf>,
}

impl GenerationContext {
    /// Build a context from the required fields.
    pub fn new(plugin_module: impl Into<String>, stubs_path: impl Into<PathBuf>) -> Self {
        Self {
            plugin_module: plugin_module.into(),
            stubs_path: stubs_path.into(),
            config_root: None,
        }
    }

    /// Attach a configuration root for the tool to resolve its config from.
    #[must_use]
    pub fn with_config_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config_root = Some(root.into());
        self
    }

    /// The configuration root, if one was attached.
    pub fn config_root(&self) -> Option<&PathBuf> {
        self.config_root.as_ref()
    }
}

/// Errors raised by a stub-generation run.
#[derive(Debug, thiserror::Error)]
pub enum StubError {
    /// The external tool could not be spawned.
    #[error("failed to spawn stub tool `{program}`")]
    Spawn {
        /// The program that failed to start.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The external tool ran but exited unsuccessfully.
    #[error("stub tool exited with {status}: {stderr}")]
    Tool {
        /// Exit status of the tool.
        status: ExitStatus,
        /// Captured standard error, trimmed.
        stderr: String,
    },
}

/// A stub-generation collaborator.
///
/// Implementations run to completion or fail; there is no cancellation and
/// no retry at this seam.
#[async_trait::async_trait]
pub trait StubGenerator: Send + Sync {
    /// Generate stubs for the given context.
    async fn generate(&self, ctx: &GenerationContext) -> Result<(), StubError>;
}

/// Runs the external workflow tooling CLI to generate stubs.
///
/// The default invocation is `wf adapterstubs --plugin-module <module>
/// --stubs <path>`. When the context carries a config root it is passed to
/// the child as `ARTIFICIAL_CONFIG_ROOT`; this process's own environment is
/// never modified.
#[derive(Debug, Clone)]
pub struct ToolStubGenerator {
    program: PathBuf,
    base_args: Vec<String>,
}

impl Default for ToolStubGenerator {
    fn default() -> Self {
        Self {
            program: PathBuf::from("wf"),
            base_args: vec!["adapterstubs".to_string()],
        }
    }
}

impl ToolStubGenerator {
    /// Use a custom tool invocation instead of `wf adapterstubs`.
    pub fn with_command(program: impl Into<PathBuf>, base_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            base_args,
        }
    }

    /// The argument vector for one invocation, in the order the tool
    /// expects: base arguments, then `--plugin-module`, then `--stubs`.
    fn argv(&self, ctx: &GenerationContext) -> Vec<OsString> {
        let mut argv: Vec<OsString> = self.base_args.iter().map(OsString::from).collect();
        argv.push("--plugin-module".into());
        argv.push(ctx.plugin_module.clone().into());
        argv.push("--stubs".into());
        argv.push(ctx.stubs_path.clone().into());
        argv
    }
}

#[async_trait::async_trait]
impl StubGenerator for ToolStubGenerator {
    async fn generate(&self, ctx: &GenerationContext) -> Result<(), StubError> {
        let mut command = tokio::process::Command::new(&self.program);
        command.args(self.argv(ctx));
        if let Some(root) = ctx.config_root() {
            command.env("ARTIFICIAL_CONFIG_ROOT", root);
        }

        tracing::debug!(
            plugin_module = %ctx.plugin_module,
            stubs_path = %ctx.stubs_path.display(),
            "running stub tool"
        );

        let output = command.output().await.map_err(|source| StubError::Spawn {
            program: self.program.display().to_string(),
            source,
        })?;

        if !output.status.success() {
            return Err(StubError::Tool {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_requires_no_optional_collaborators() {
        let ctx = GenerationContext::new("pkg.module", "/tmp/out/stubs.py");
        assert_eq!(ctx.plugin_module, "pkg.module");
        assert_eq!(ctx.stubs_path, PathBuf::from("/tmp/out/stubs.py"));
        assert!(ctx.config_root().is_none());
    }

    #[test]
    fn test_context_with_config_root() {
        let ctx = GenerationContext::new("pkg.module", "stubs.py").with_config_root("/etc/artificial");
        assert_eq!(ctx.config_root(), Some(&PathBuf::from("/etc/artificial")));
    }

    #[test]
    fn test_argv_order() {
        let generator = ToolStubGenerator::default();
        let ctx = GenerationContext::new("adapter.main.plugin", "workflow/stubs/stubs_actions.py");

        let argv = generator.argv(&ctx);
        let argv: Vec<&str> = argv.iter().map(|a| a.to_str().unwrap()).collect();
        assert_eq!(
            argv,
            [
                "adapterstubs",
                "--plugin-module",
                "adapter.main.plugin",
                "--stubs",
                "workflow/stubs/stubs_actions.py",
            ]
        );
    }

    #[test]
    fn test_custom_command_keeps_base_args() {
        let generator =
            ToolStubGenerator::with_command("python3", vec!["-m".into(), "adapter.tools.stubs".into()]);
        let ctx = GenerationContext::new("pkg.module", "stubs.py");

        let argv = generator.argv(&ctx);
        assert_eq!(argv[0], OsString::from("-m"));
        assert_eq!(argv[1], OsString::from("adapter.tools.stubs"));
    }

    #[test]
    fn test_spawn_failure_is_reported() {
        let generator = ToolStubGenerator::with_command("/nonexistent/stub-tool", Vec::new());
        let ctx = GenerationContext::new("pkg.module", "stubs.py");

        let err = tokio_test::block_on(generator.generate(&ctx)).unwrap_err();
        assert!(matches!(err, StubError::Spawn { .. }));
    }
}
