//! Message batch analyzer.
//!
//! Scans each user's recent unanalyzed messages, ships them to the
//! completion endpoint in fixed-size batches, and persists one analytics
//! record per scored message before flagging the sources as analyzed.

use std::collections::HashSet;

use chrono::{Duration, Utc};
use serde::Deserialize;
use tracing::instrument;

use crate::constants::{ANALYZER_BATCH_SIZE, ANALYZER_LOOKBACK_HOURS};
use crate::db::prelude::*;
use crate::llm::client::Llm;
use crate::llm::extract::extract_json_array;
use crate::llm::{LlmErr, LlmResult, prompt};
use crate::pipeline::{BatchSummary, PipelineResult, UserOutcome, run_all_users};

pub async fn run_all() -> PipelineResult<BatchSummary> {
    run_all_users("analyzer", |id| async move {
        let analyzed = run_for_user(&id).await?;
        Ok(if analyzed == 0 {
            UserOutcome::Skipped
        } else {
            UserOutcome::Processed
        })
    })
    .await
}

/// Returns how many messages were scored. Retryable endpoint failures are
/// already absorbed by the client; anything surfacing here fails the batch
/// for this user only.
#[instrument]
pub async fn run_for_user(user_id: &UserId) -> PipelineResult<usize> {
    let store = store().await?;
    let messages = MessageRepository::new(store.manager.clone());
    let analytics = AnalyticsRepository::new(store.manager.clone());
    let usage = UsageRepository::new(store.manager.clone());

    let since = Utc::now().naive_utc() - Duration::hours(ANALYZER_LOOKBACK_HOURS);
    let pending = messages.unanalyzed_since(user_id, since).await?;
    if pending.is_empty() {
        return Ok(0);
    }

    tracing::debug!(user_id = %user_id, pending = pending.len(), "analyzing pending messages");

    let mut analyzed = 0usize;
    for batch in pending.chunks(ANALYZER_BATCH_SIZE) {
        let request = prompt::batch_scoring(batch);
        let completion = Llm::complete_with_retry(&request).await?;
        usage.record(&completion.usage).await;

        let scored = parse_batch_scores(&completion.text)?;
        if scored.len() != batch.len() {
            tracing::warn!(
                expected = batch.len(),
                got = scored.len(),
                "score count mismatch; unmatched messages stay unanalyzed"
            );
        }

        let mut seen = HashSet::new();
        let mut flagged = Vec::with_capacity(scored.len());
        for entry in scored {
            if !seen.insert(entry.index) {
                tracing::warn!(index = entry.index, "duplicate scored index; ignoring");
                continue;
            }
            let Some(message) = batch.get(entry.index) else {
                tracing::warn!(index = entry.index, "scored index out of range");
                continue;
            };

            let record =
                AnalyticsRecord::for_message(message, entry.scores.clamped(), entry.classification);
            analytics.append(&record).await?;
            flagged.push(message.id.clone());
            analyzed += 1;
        }

        messages.mark_analyzed(user_id, &flagged).await?;
    }

    Ok(analyzed)
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScoredMessage {
    pub index: usize,
    #[serde(flatten)]
    pub scores: SubScores,
    #[serde(default)]
    pub classification: MessageClass,
}

pub(crate) fn parse_batch_scores(raw: &str) -> LlmResult<Vec<ScoredMessage>> {
    let json = extract_json_array(raw).ok_or(LlmErr::MissingJson)?;
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_scores_from_prose() {
        let raw = r#"Here you go:
```json
[
  {"index": 0, "questionQuality": 80, "thinkingDepth": 75, "creativity": 60,
   "communicationClarity": 70, "executionOrientation": 55, "collaboration": 65,
   "classification": "question"},
  {"index": 1, "questionQuality": 40, "thinkingDepth": 130, "creativity": -5,
   "communicationClarity": 50, "executionOrientation": 45, "collaboration": 50,
   "classification": "musing"}
]
```
Hope that helps!"#;

        let scored = parse_batch_scores(raw).unwrap();
        assert_eq!(scored.len(), 2);

        assert_eq!(scored[0].scores.question_quality, 80);
        assert_eq!(scored[0].classification, MessageClass::Question);

        // unknown labels fall back, out-of-range scores clamp on store
        assert_eq!(scored[1].classification, MessageClass::Other);
        let clamped = scored[1].scores.clamped();
        assert_eq!(clamped.thinking_depth, 100);
        assert_eq!(clamped.creativity, 0);
    }

    #[test]
    fn test_parse_scores_requires_array() {
        assert!(matches!(
            parse_batch_scores("the model refused to answer"),
            Err(LlmErr::MissingJson)
        ));
    }

    #[test]
    fn test_parse_scores_tolerates_missing_fields() {
        let raw = r#"[{"index": 0, "questionQuality": 90}]"#;
        let scored = parse_batch_scores(raw).unwrap();

        assert_eq!(scored[0].scores.question_quality, 90);
        assert_eq!(scored[0].scores.collaboration, 0);
        assert_eq!(scored[0].classification, MessageClass::Other);
    }
}
