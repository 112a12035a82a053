//! Competency aggregator.
//!
//! Rolls the last 30 days of analytics sub-scores into one stored score per
//! (user, competency), weighting recent activity heavier than old.

use chrono::{Duration, NaiveDateTime, Utc};
use tracing::instrument;

use crate::constants::{
    AGGREGATION_WINDOW_DAYS, MID_BUCKET_MAX_AGE_DAYS, MID_BUCKET_WEIGHT,
    OLD_BUCKET_WEIGHT, RECENT_BUCKET_MAX_AGE_DAYS, RECENT_BUCKET_WEIGHT,
};
use crate::db::prelude::*;
use crate::pipeline::{BatchSummary, PipelineResult, UserOutcome, run_all_users};

pub async fn run_all() -> PipelineResult<BatchSummary> {
    run_all_users("aggregator", |id| async move {
        Ok(if run_for_user(&id).await? {
            UserOutcome::Processed
        } else {
            UserOutcome::Skipped
        })
    })
    .await
}

/// Recomputes and overwrites every competency score for one user. Returns
/// `false` when the user has no analytics inside the window.
#[instrument]
pub async fn run_for_user(user_id: &UserId) -> PipelineResult<bool> {
    let store = store().await?;
    let analytics = AnalyticsRepository::new(store.manager.clone());
    let competencies = CompetencyRepository::new(store.manager.clone());

    let now = Utc::now().naive_utc();
    let since = now - Duration::days(AGGREGATION_WINDOW_DAYS);

    let records = analytics.since(user_id, since).await?;
    if records.is_empty() {
        return Ok(false);
    }

    let mut states = competencies.get_all(user_id).await?;
    let message_count = records.len() as i64;

    for competency in Competency::ALL {
        let samples: Vec<(NaiveDateTime, i64)> = records
            .iter()
            .map(|r| (r.created_at, r.scores.get(competency)))
            .collect();

        let Some(score) = weighted_average(&samples, now) else {
            continue;
        };

        let mut state = states
            .remove(&competency)
            .unwrap_or_else(|| CompetencyState::new(now));
        state.apply_aggregate(score, message_count, now);

        competencies.put(user_id, competency, &state).await?;
    }

    tracing::debug!(user_id = %user_id, message_count, "recomputed competency scores");

    Ok(true)
}

/// Time-weighted mean over (timestamp, score) samples.
///
/// Samples bucket by age — up to 7 days, 8 to 14, 15 to 30 — with weights
/// 0.5 / 0.3 / 0.2. Empty buckets drop out and the remaining weights
/// renormalize, so a user active only this week still aggregates to this
/// week's plain mean. Output is an integer in [0,100]; `None` when nothing
/// falls inside the window.
pub fn weighted_average(samples: &[(NaiveDateTime, i64)], now: NaiveDateTime) -> Option<i64> {
    let mut buckets = [
        (RECENT_BUCKET_WEIGHT, 0i64, 0i64),
        (MID_BUCKET_WEIGHT, 0, 0),
        (OLD_BUCKET_WEIGHT, 0, 0),
    ];

    for &(recorded_at, score) in samples {
        let age_days = (now - recorded_at).num_days();

        // clock skew can land a sample slightly in the future; count it as recent
        let idx = if age_days <= RECENT_BUCKET_MAX_AGE_DAYS {
            0
        } else if age_days <= MID_BUCKET_MAX_AGE_DAYS {
            1
        } else if age_days <= AGGREGATION_WINDOW_DAYS {
            2
        } else {
            continue;
        };

        buckets[idx].1 += score;
        buckets[idx].2 += 1;
    }

    let (mut numerator, mut denominator) = (0.0, 0.0);
    for (weight, sum, count) in buckets {
        if count == 0 {
            continue;
        }
        numerator += weight * (sum as f64 / count as f64);
        denominator += weight;
    }

    if denominator == 0.0 {
        return None;
    }

    Some(((numerator / denominator).round() as i64).clamp(0, 100))
}

#[cfg(test)]
mod test {
    use super::*;

    fn days_ago(now: NaiveDateTime, days: i64) -> NaiveDateTime {
        now - Duration::days(days)
    }

    #[test]
    fn test_uniform_recent_scores_pass_through() {
        // five messages all scoring 80, no older history: aggregate is 80
        let now = Utc::now().naive_utc();
        let samples: Vec<_> = (0..5).map(|i| (days_ago(now, i % 3), 80)).collect();

        assert_eq!(weighted_average(&samples, now), Some(80));
    }

    #[test]
    fn test_no_samples_yields_none() {
        let now = Utc::now().naive_utc();

        assert_eq!(weighted_average(&[], now), None);
        // everything outside the window drops out too
        assert_eq!(weighted_average(&[(days_ago(now, 45), 90)], now), None);
    }

    #[test]
    fn test_three_bucket_weighting() {
        let now = Utc::now().naive_utc();
        let samples = vec![
            (days_ago(now, 1), 100),
            (days_ago(now, 10), 50),
            (days_ago(now, 20), 0),
        ];

        // 0.5 * 100 + 0.3 * 50 + 0.2 * 0 = 65
        assert_eq!(weighted_average(&samples, now), Some(65));
    }

    #[test]
    fn test_single_old_bucket_renormalizes() {
        let now = Utc::now().naive_utc();
        let samples = vec![(days_ago(now, 20), 40), (days_ago(now, 25), 60)];

        assert_eq!(weighted_average(&samples, now), Some(50));
    }

    #[test]
    fn test_bucket_boundaries() {
        let now = Utc::now().naive_utc();

        // day 7 is still recent, day 8 is mid; with one sample in each the
        // result is 0.5 * 100 + 0.3 * 0 over 0.8
        let samples = vec![(days_ago(now, 7), 100), (days_ago(now, 8), 0)];
        assert_eq!(weighted_average(&samples, now), Some(63));
    }

    #[test]
    fn test_output_always_in_range() {
        let now = Utc::now().naive_utc();

        for spread in [0i64, 1, 13, 29] {
            let samples: Vec<_> = (0..50)
                .map(|i| (days_ago(now, (i * spread) % 30), (i * 37) % 101))
                .collect();

            let score = weighted_average(&samples, now).unwrap();
            assert!((0..=100).contains(&score));
        }
    }
}
