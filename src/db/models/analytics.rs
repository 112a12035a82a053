use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::models::competency::Competency;
use crate::db::models::message::ChatMessage;
use crate::db::models::user::UserId;

/// The six sub-scores the completion endpoint assigns to a single message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubScores {
    #[serde(default)]
    pub question_quality: i64,
    #[serde(default)]
    pub thinking_depth: i64,
    #[serde(default)]
    pub creativity: i64,
    #[serde(default)]
    pub communication_clarity: i64,
    #[serde(default)]
    pub execution_orientation: i64,
    #[serde(default)]
    pub collaboration: i64,
}

impl SubScores {
    pub const fn get(&self, competency: Competency) -> i64 {
        match competency {
            Competency::QuestionQuality => self.question_quality,
            Competency::ThinkingDepth => self.thinking_depth,
            Competency::Creativity => self.creativity,
            Competency::CommunicationClarity => self.communication_clarity,
            Competency::ExecutionOrientation => self.execution_orientation,
            Competency::Collaboration => self.collaboration,
        }
    }

    /// Model output occasionally wanders out of range; everything stored is
    /// forced back into [0,100].
    pub fn clamped(self) -> Self {
        Self {
            question_quality: self.question_quality.clamp(0, 100),
            thinking_depth: self.thinking_depth.clamp(0, 100),
            creativity: self.creativity.clamp(0, 100),
            communication_clarity: self.communication_clarity.clamp(0, 100),
            execution_orientation: self.execution_orientation.clamp(0, 100),
            collaboration: self.collaboration.clamp(0, 100),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageClass {
    Question,
    Reflection,
    Task,
    Social,
    #[default]
    #[serde(other)]
    Other,
}

/// One analyzed chat message. Written once by the batch analyzer and never
/// mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsRecord {
    pub id: String,
    pub user_id: UserId,
    pub message_id: String,
    pub scores: SubScores,
    pub classification: MessageClass,
    pub created_at: NaiveDateTime,
}

impl AnalyticsRecord {
    /// Analytics inherit the source message's timestamp so the aggregation
    /// buckets reflect when the user actually wrote, not when the batch ran.
    pub fn for_message(
        message: &ChatMessage,
        scores: SubScores,
        classification: MessageClass,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: message.user_id.clone(),
            message_id: message.id.clone(),
            scores,
            classification,
            created_at: message.created_at,
        }
    }

    pub fn timestamp_millis(&self) -> i64 {
        self.created_at.and_utc().timestamp_millis()
    }
}
