//! Outbound message sink backed by the log.

use async_trait::async_trait;
use tracing::info;

use machina_core::{Responder, SendError};

/// A responder that logs outgoing messages instead of delivering them.
///
/// This is the default sink until a real chat backend is wired in, and it
/// is enough for demos where the log is the output.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingResponder;

impl TracingResponder {
    /// Creates the responder.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Responder for TracingResponder {
    async fn say(&self, channel: &str, text: &str) -> Result<(), SendError> {
        info!(channel = %channel, text = %text, "outgoing message");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn say_always_succeeds() {
        let responder = TracingResponder::new();
        assert_ok!(responder.say("C1", "hello there").await);
    }
}
