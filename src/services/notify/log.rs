use async_trait::async_trait;

use super::{Notice, Notifier, Severity};

/// Fallback notifier for deployments without a webhook configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notice: &Notice) -> anyhow::Result<()> {
        match notice.severity {
            Severity::Default => {
                tracing::info!(title = %notice.title, "{}", notice.description);
            }
            Severity::Destructive => {
                tracing::warn!(title = %notice.title, "{}", notice.description);
            }
        }
        Ok(())
    }
}
