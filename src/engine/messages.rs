//! Outbound alert delivery.
//!
//! Watchers format alert text and hand it to a sink; delivery transport is
//! behind this trait so the engine never knows whether alerts end up in a
//! chat channel or the process log.

use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn send(&self, text: &str) -> Result<()>;
}

/// Default sink: alerts go to the structured log at info level.
pub struct LogAlertSink;

#[async_trait]
impl AlertSink for LogAlertSink {
    async fn send(&self, text: &str) -> Result<()> {
        log::info!("ALERT\n{text}");
        Ok(())
    }
}
