use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::models::competency::Competency;
use crate::db::models::user::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestCategory {
    Conversation,
    Challenge,
    Reflection,
}

impl QuestCategory {
    pub const ALL: [QuestCategory; 3] = [
        QuestCategory::Conversation,
        QuestCategory::Challenge,
        QuestCategory::Reflection,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestStatus {
    Active,
    Completed,
}

/// Static quest definition from the catalog in `constants.rs`.
#[derive(Debug, Clone, Copy)]
pub struct QuestTemplate {
    pub id: &'static str,
    pub category: QuestCategory,
    pub title: &'static str,
    pub description: &'static str,
    pub target: Competency,
    pub required_messages: i64,
    pub min_avg_score: i64,
    pub reward_points: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestProgress {
    pub messages: i64,
    pub avg_score: i64,
}

/// One instantiated quest inside a daily set.
///
/// Completion is monotonic: once `status` is `Completed` the evaluator never
/// touches the quest again, and `reward_claimed` keeps the boost from ever
/// applying twice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quest {
    pub template_id: String,
    pub category: QuestCategory,
    pub title: String,
    pub description: String,
    pub target: Competency,
    pub required_messages: i64,
    pub min_avg_score: i64,
    #[serde(default)]
    pub progress: QuestProgress,
    pub status: QuestStatus,
    pub reward_points: i64,
    #[serde(default)]
    pub reward_claimed: bool,
    pub completed_at: Option<NaiveDateTime>,
}

impl From<&QuestTemplate> for Quest {
    fn from(t: &QuestTemplate) -> Self {
        Self {
            template_id: t.id.to_string(),
            category: t.category,
            title: t.title.to_string(),
            description: t.description.to_string(),
            target: t.target,
            required_messages: t.required_messages,
            min_avg_score: t.min_avg_score,
            progress: QuestProgress::default(),
            status: QuestStatus::Active,
            reward_points: t.reward_points,
            reward_claimed: false,
            completed_at: None,
        }
    }
}

/// The three quests selected for a (user, date) pair. Expires from the store
/// seven days after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyQuestSet {
    pub user_id: UserId,
    pub date: NaiveDate,
    pub quests: Vec<Quest>,
    pub created_at: NaiveDateTime,
}

impl DailyQuestSet {
    pub fn new(user_id: UserId, date: NaiveDate, quests: Vec<Quest>) -> Self {
        Self {
            user_id,
            date,
            quests,
            created_at: Utc::now().naive_utc(),
        }
    }
}
