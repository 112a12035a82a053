use chrono::Utc;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tracing::instrument;

use crate::db::StoreResult;
use crate::db::keys::Table;
use crate::llm::client::TokenUsage;

/// Daily token counters for cost tracking.
#[derive(Debug)]
pub struct UsageRepository {
    manager: ConnectionManager,
}

impl UsageRepository {
    pub fn new(manager: ConnectionManager) -> Self {
        Self { manager }
    }

    /// Best-effort: a failed counter write must never block the operation
    /// that produced the usage, so errors are logged and dropped here.
    #[instrument(skip(self, usage))]
    pub async fn record(&self, usage: &TokenUsage) {
        if let Err(e) = self.try_record(usage).await {
            tracing::warn!(error = ?e, "usage tracking write failed; continuing");
        }
    }

    async fn try_record(&self, usage: &TokenUsage) -> StoreResult<()> {
        let mut conn = self.manager.clone();
        let key = Table::Usage.doc(Utc::now().date_naive());

        let _: () = conn
            .hincr(&key, "prompt_tokens", usage.prompt_tokens)
            .await?;
        let _: () = conn
            .hincr(&key, "completion_tokens", usage.completion_tokens)
            .await?;

        Ok(())
    }
}
