//! Outbound notification dispatch.
//!
//! Delivery is strictly best-effort: the engine fires a dispatch on a
//! detached task and never consults the outcome. Implementations must not
//! panic; anything that can fail should swallow the failure internally.

use async_trait::async_trait;
use tracing::debug;

/// External notification channel consumed by the engine.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one formatted message. Fire-and-forget: no return value, no
    /// retry.
    async fn send(&self, message: &str);
}

/// Logs every message instead of delivering it. The default for local runs
/// where no external channel is wired up.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: &str) {
        debug!(message, "External notification (log sink)");
    }
}

/// Discards every message. Useful in tests.
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn send(&self, _message: &str) {}
}
