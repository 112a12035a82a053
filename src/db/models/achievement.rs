use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Aggregate stats the achievement evaluator derives per user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UserStats {
    pub messages_analyzed: i64,
    pub quests_completed: i64,
    pub best_competency_score: i64,
    pub streak_days: i64,
}

/// Static badge definition from the catalog in `constants.rs`.
#[derive(Debug, Clone, Copy)]
pub struct BadgeSpec {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub criteria: BadgeCriteria,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeCriteria {
    MessagesAnalyzed(i64),
    QuestsCompleted(i64),
    AnyCompetencyAtLeast(i64),
    StreakDays(i64),
}

impl BadgeCriteria {
    pub fn is_met(&self, stats: &UserStats) -> bool {
        match *self {
            BadgeCriteria::MessagesAnalyzed(n) => stats.messages_analyzed >= n,
            BadgeCriteria::QuestsCompleted(n) => stats.quests_completed >= n,
            BadgeCriteria::AnyCompetencyAtLeast(n) => stats.best_competency_score >= n,
            BadgeCriteria::StreakDays(n) => stats.streak_days >= n,
        }
    }
}

/// API shape for a granted badge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlockedBadge {
    pub id: String,
    pub title: String,
    pub description: String,
    pub unlocked_at: NaiveDateTime,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_criteria_thresholds() {
        let stats = UserStats {
            messages_analyzed: 50,
            quests_completed: 3,
            best_competency_score: 79,
            streak_days: 7,
        };

        assert!(BadgeCriteria::MessagesAnalyzed(50).is_met(&stats));
        assert!(!BadgeCriteria::MessagesAnalyzed(51).is_met(&stats));
        assert!(BadgeCriteria::QuestsCompleted(1).is_met(&stats));
        assert!(!BadgeCriteria::AnyCompetencyAtLeast(80).is_met(&stats));
        assert!(BadgeCriteria::StreakDays(7).is_met(&stats));
    }
}
