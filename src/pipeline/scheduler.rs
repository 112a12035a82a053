//! In-process stand-in for the platform's scheduled triggers: every batch
//! job runs on its own tokio interval, sequentially over all users.

use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::constants::{
    ACHIEVEMENTS_INTERVAL_SECS, AGGREGATOR_INTERVAL_SECS, ANALYZER_INTERVAL_SECS,
    QUEST_EVAL_INTERVAL_SECS, QUEST_GEN_INTERVAL_SECS,
};
use crate::pipeline::{
    BatchSummary, PipelineResult, achievements, aggregator, analyzer, quest_eval, quest_gen,
};

pub async fn start_scheduler() -> Vec<JoinHandle<()>> {
    tracing::info!("starting pipeline scheduler");

    vec![
        spawn_interval("analyzer", ANALYZER_INTERVAL_SECS, analyzer::run_all),
        spawn_interval("aggregator", AGGREGATOR_INTERVAL_SECS, aggregator::run_all),
        // generation is idempotent per (user, date), so a short interval just
        // catches users created since the last tick
        spawn_interval("quest-generator", QUEST_GEN_INTERVAL_SECS, || {
            quest_gen::run_all(Utc::now().date_naive())
        }),
        spawn_interval("quest-evaluator", QUEST_EVAL_INTERVAL_SECS, || {
            quest_eval::run_all(Utc::now().date_naive())
        }),
        spawn_interval("achievements", ACHIEVEMENTS_INTERVAL_SECS, achievements::run_all),
    ]
}

fn spawn_interval<F, Fut>(job: &'static str, period_secs: u64, run: F) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = PipelineResult<BatchSummary>> + Send,
{
    tokio::task::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(period_secs));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            if let Err(e) = run().await {
                tracing::error!(job, error = ?e, "scheduled batch run failed");
            }
        }
    })
}
