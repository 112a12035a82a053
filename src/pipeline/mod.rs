use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::db::models::user::UserId;
use crate::db::repositories::Repository as _;
use crate::db::repositories::user::UserRepository;
use crate::db::{StoreErr, store};
use crate::llm::LlmErr;

pub mod achievements;
pub mod aggregator;
pub mod analyzer;
pub mod quest_eval;
pub mod quest_gen;
pub mod scheduler;

pub type PipelineResult<T> = core::result::Result<T, PipelineErr>;

#[derive(Debug, Error)]
pub enum PipelineErr {
    #[error(transparent)]
    Store(#[from] StoreErr),

    #[error(transparent)]
    Llm(#[from] LlmErr),

    #[error("no quest set recorded for user '{user_id}' on {date}")]
    QuestSetMissing { user_id: UserId, date: NaiveDate },
}

/// What an all-users batch run reports back to its trigger.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct BatchSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy)]
pub enum UserOutcome {
    Processed,
    Skipped,
}

/// Runs one job closure per known user, sequentially. A failing user is
/// logged and counted without aborting the rest of the batch.
pub(crate) async fn run_all_users<F, Fut>(job: &'static str, f: F) -> PipelineResult<BatchSummary>
where
    F: Fn(UserId) -> Fut,
    Fut: Future<Output = PipelineResult<UserOutcome>>,
{
    let users = UserRepository::new(store().await?.manager.clone());
    let mut summary = BatchSummary::default();

    for id in users.ids().await? {
        match f(id.clone()).await {
            Ok(UserOutcome::Processed) => summary.processed += 1,
            Ok(UserOutcome::Skipped) => summary.skipped += 1,
            Err(e) => {
                tracing::error!(
                    job,
                    user_id = %id,
                    error = ?e,
                    "user failed during batch run; continuing"
                );
                summary.failed += 1;
            }
        }
    }

    tracing::info!(
        job,
        processed = summary.processed,
        skipped = summary.skipped,
        failed = summary.failed,
        "batch run complete"
    );

    Ok(summary)
}
