pub mod log;
pub mod webhook;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Transient user-facing feedback raised by the booking and contact flows.
/// Fire-and-forget: callers log delivery failures and move on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Default,
    Destructive,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notice: &Notice) -> anyhow::Result<()>;
}
