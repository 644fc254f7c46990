use async_trait::async_trait;
use tracing::warn;

use crate::{connection::Connection, error::ServerError};

/// Behaviour attached to the server for incoming commands.
///
/// Every registered handler sees every command; a handler that does not own
/// `verb` returns `Ok(())` without touching the connection.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(
        &self,
        verb: &str,
        argument: &str,
        connection: &mut Connection,
    ) -> Result<(), ServerError>;
}

/// Ordered list of command handlers.
#[derive(Default)]
pub struct Dispatcher {
    handlers: Vec<Box<dyn CommandHandler>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H) -> &mut Self
    where
        H: CommandHandler + 'static,
    {
        self.handlers.push(Box::new(handler));
        self
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Runs every handler in registration order on the current task.
    ///
    /// A failing handler does not stop the ones after it. The first error is
    /// returned once all of them have run; later ones are only logged.
    pub async fn dispatch(
        &self,
        verb: &str,
        argument: &str,
        connection: &mut Connection,
    ) -> Result<(), ServerError> {
        let mut first_error = None;
        for handler in &self.handlers {
            if let Err(err) = handler.handle(verb, argument, connection).await {
                if first_error.is_none() {
                    first_error = Some(err);
                } else {
                    warn!(%verb, error = %err, "handler failed after an earlier failure");
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
