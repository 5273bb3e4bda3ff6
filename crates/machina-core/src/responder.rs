//! Outbound seam: how handlers talk back.

use async_trait::async_trait;

use std::sync::Arc;

/// Failure to deliver an outbound message.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// The outbound surface has shut down.
    #[error("outbound channel closed")]
    Closed,
    /// The backing surface rejected the message.
    #[error("send failed: {0}")]
    Failed(String),
}

/// Outbound message surface injected into plugins.
///
/// The engine never constructs one; the runtime decides where messages
/// actually go and hands plugins a [`BoxedResponder`] at load time.
#[async_trait]
pub trait Responder: Send + Sync {
    /// Sends `text` to `channel`.
    async fn say(&self, channel: &str, text: &str) -> Result<(), SendError>;
}

/// Shared trait object handed to plugins.
pub type BoxedResponder = Arc<dyn Responder>;
