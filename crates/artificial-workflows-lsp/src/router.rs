//! Command and notification dispatch tables.
//!
//! Handlers are registered once while the server is starting up and the
//! tables are immutable afterwards; dispatch is a plain map lookup.
//! Exactly one handler may be bound per command name or notification
//! method; a duplicate registration is a programmer error and panics.

use crate::handlers::HandlerError;
use crate::server::Shared;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future returned by a registered handler.
pub type HandlerFuture<T> = Pin<Box<dyn Future<Output = Result<T, HandlerError>> + Send>>;

/// A `workspace/executeCommand` handler: receives the shared server state
/// and the decoded argument list, produces the response payload.
pub type CommandHandler = Arc<dyn Fn(Arc<Shared>, Vec<Value>) -> HandlerFuture<Value> + Send + Sync>;

/// A notification handler: receives the shared server state and the raw
/// notification params. There is no caller to answer.
pub type NotificationHandler = Arc<dyn Fn(Arc<Shared>, Value) -> HandlerFuture<()> + Send + Sync>;

/// Maps command names and notification methods to their handlers.
#[derive(Default)]
pub struct Router {
    commands: HashMap<String, CommandHandler>,
    notifications: HashMap<String, NotificationHandler>,
}

impl Router {
    /// An empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a command handler to a command name.
    ///
    /// # Panics
    ///
    /// Panics if the name is already bound.
    pub fn register_command<F, Fut>(&mut self, name: &str, handler: F)
    where
        F: Fn(Arc<Shared>, Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, HandlerError>> + Send + 'static,
    {
        let previous = self.commands.insert(
            name.to_string(),
            Arc::new(move |shared, args| -> HandlerFuture<Value> {
                Box::pin(handler(shared, args))
            }),
        );
        assert!(previous.is_none(), "duplicate command handler: {name}");
    }

    /// Bind a notification handler to a method.
    ///
    /// # Panics
    ///
    /// Panics if the method is already bound.
    pub fn register_notification<F, Fut>(&mut self, method: &str, handler: F)
    where
        F: Fn(Arc<Shared>, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        let previous = self.notifications.insert(
            method.to_string(),
            Arc::new(move |shared, params| -> HandlerFuture<()> {
                Box::pin(handler(shared, params))
            }),
        );
        assert!(previous.is_none(), "duplicate notification handler: {method}");
    }

    /// Look up the handler bound to a command name.
    pub fn command(&self, name: &str) -> Option<CommandHandler> {
        self.commands.get(name).cloned()
    }

    /// Look up the handler bound to a notification method.
    pub fn notification(&self, method: &str) -> Option<NotificationHandler> {
        self.notifications.get(method).cloned()
    }

    /// Registered command names, sorted for stable capability
    /// advertisement.
    pub fn command_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.commands.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use artificial_workflows_stubs::{GenerationContext, StubError, StubGenerator};
    use serde_json::json;

    struct NullGenerator;

    #[async_trait::async_trait]
    impl StubGenerator for NullGenerator {
        async fn generate(&self, _ctx: &GenerationContext) -> Result<(), StubError> {
            Ok(())
        }
    }

    fn shared() -> Arc<Shared> {
        Arc::new(Shared {
            config: ServerConfig::default(),
            generator: Arc::new(NullGenerator),
        })
    }

    #[test]
    fn test_command_dispatch_passes_args_through() {
        let mut router = Router::new();
        let seen: Arc<parking_lot::Mutex<Vec<Vec<Value>>>> = Arc::default();
        let sink = Arc::clone(&seen);
        router.register_command("test.echo", move |_shared, args| {
            let sink = Arc::clone(&sink);
            async move {
                sink.lock().push(args);
                Ok(Value::Null)
            }
        });

        let handler = router.command("test.echo").expect("registered");
        let args = vec![json!("pkg.module"), json!({"nested": [1, 2, 3]})];
        let result = tokio_test::block_on(handler(shared(), args.clone()));

        assert!(result.is_ok());
        // Exactly one invocation, arguments unmodified.
        assert_eq!(*seen.lock(), vec![args]);
    }

    #[test]
    fn test_unknown_identifiers_resolve_to_none() {
        let mut router = Router::new();
        router.register_command("test.known", |_shared, _args| async { Ok(Value::Null) });

        assert!(router.command("test.unknown").is_none());
        assert!(router.notification("textDocument/didSave").is_none());
    }

    #[test]
    #[should_panic(expected = "duplicate command handler")]
    fn test_duplicate_command_registration_panics() {
        let mut router = Router::new();
        router.register_command("test.cmd", |_shared, _args| async { Ok(Value::Null) });
        router.register_command("test.cmd", |_shared, _args| async { Ok(Value::Null) });
    }

    #[test]
    #[should_panic(expected = "duplicate notification handler")]
    fn test_duplicate_notification_registration_panics() {
        let mut router = Router::new();
        router.register_notification("textDocument/didSave", |_shared, _params| async { Ok(()) });
        router.register_notification("textDocument/didSave", |_shared, _params| async { Ok(()) });
    }

    #[test]
    fn test_command_names_sorted() {
        let mut router = Router::new();
        router.register_command("b.second", |_shared, _args| async { Ok(Value::Null) });
        router.register_command("a.first", |_shared, _args| async { Ok(Value::Null) });

        assert_eq!(router.command_names(), ["a.first", "b.second"]);
    }
}
