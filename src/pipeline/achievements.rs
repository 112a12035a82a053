//! Achievement evaluator.
//!
//! Derives aggregate stats per user and grants any unearned badge whose
//! threshold is now met. Already-unlocked badges are skipped by id, and the
//! store-level grant is set-if-absent, so repeat runs grant nothing twice.

use chrono::{Days, Utc};
use tracing::instrument;

use crate::constants::{BADGES, QUEST_WINDOW_DAYS, STREAK_SCAN_CAP_DAYS};
use crate::db::prelude::*;
use crate::pipeline::{BatchSummary, PipelineResult, UserOutcome, run_all_users};

pub async fn run_all() -> PipelineResult<BatchSummary> {
    run_all_users("achievements", |id| async move {
        Ok(if run_for_user(&id).await? > 0 {
            UserOutcome::Processed
        } else {
            UserOutcome::Skipped
        })
    })
    .await
}

/// Returns how many badges this run granted.
#[instrument]
pub async fn run_for_user(user_id: &UserId) -> PipelineResult<usize> {
    let store = store().await?;
    let achievements = AchievementRepository::new(store.manager.clone());

    let stats = collect_stats(user_id).await?;
    let unlocked = achievements.unlocked(user_id).await?;

    let now = Utc::now().naive_utc();
    let mut granted = 0usize;

    for badge in BADGES {
        if unlocked.contains_key(badge.id) {
            continue;
        }
        if !badge.criteria.is_met(&stats) {
            continue;
        }

        if achievements.grant(user_id, badge.id, now).await? {
            tracing::info!(user_id = %user_id, badge_id = badge.id, "unlocked achievement");
            granted += 1;
        }
    }

    Ok(granted)
}

#[instrument]
pub async fn collect_stats(user_id: &UserId) -> PipelineResult<UserStats> {
    let store = store().await?;
    let analytics = AnalyticsRepository::new(store.manager.clone());
    let quests = QuestRepository::new(store.manager.clone());
    let competencies = CompetencyRepository::new(store.manager.clone());

    let today = Utc::now().date_naive();

    let messages_analyzed = analytics.count(user_id).await?;
    let quests_completed = quests
        .completed_in_window(user_id, today, QUEST_WINDOW_DAYS)
        .await?;
    let best_competency_score = competencies
        .get_all(user_id)
        .await?
        .values()
        .map(|state| state.score)
        .max()
        .unwrap_or(0);

    let mut active = Vec::new();
    for offset in 0..STREAK_SCAN_CAP_DAYS.max(0) as u64 {
        let Some(date) = today.checked_sub_days(Days::new(offset)) else {
            break;
        };

        let is_active = analytics.active_on(user_id, date).await?;
        active.push(is_active);

        // past the anchor day, the first gap ends the streak; stop scanning
        if offset > 0 && !is_active {
            break;
        }
    }

    Ok(UserStats {
        messages_analyzed,
        quests_completed,
        best_competency_score,
        streak_days: streak_from(&active),
    })
}

/// `active[i]` says whether the user produced analytics on (today - i days).
/// An inactive today doesn't break yesterday's run, it just doesn't extend
/// it.
pub(crate) fn streak_from(active: &[bool]) -> i64 {
    let mut streak = 0i64;

    for (offset, &is_active) in active.iter().enumerate() {
        if is_active {
            streak += 1;
        } else if offset == 0 {
            continue;
        } else {
            break;
        }
    }

    streak
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_streaks() {
        assert_eq!(streak_from(&[]), 0);
        assert_eq!(streak_from(&[true]), 1);
        assert_eq!(streak_from(&[true, true, true]), 3);
        // quiet today keeps yesterday's run alive
        assert_eq!(streak_from(&[false, true, true]), 2);
        // a real gap ends it
        assert_eq!(streak_from(&[true, false, true]), 1);
        assert_eq!(streak_from(&[false, false, true]), 0);
    }

    #[test]
    fn test_badge_catalog_ids_are_unique() {
        let mut ids: Vec<_> = BADGES.iter().map(|b| b.id).collect();
        ids.sort_unstable();
        ids.dedup();

        assert_eq!(ids.len(), BADGES.len());
    }
}
