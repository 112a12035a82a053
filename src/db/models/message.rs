use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::models::bot::BotId;
use crate::db::models::user::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    User,
    Bot,
}

/// One chat turn. The `analyzed` flag is the only field mutated after the
/// write; the batch analyzer sets it once scoring has been persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub user_id: UserId,
    pub author: Author,
    pub bot_id: Option<BotId>,
    pub text: String,
    #[serde(default)]
    pub analyzed: bool,
    pub created_at: NaiveDateTime,
}

impl ChatMessage {
    pub fn from_user(user_id: UserId, text: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            author: Author::User,
            bot_id: None,
            text,
            analyzed: false,
            created_at: Utc::now().naive_utc(),
        }
    }

    pub fn from_bot(user_id: UserId, bot_id: BotId, text: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            author: Author::Bot,
            bot_id: Some(bot_id),
            text,
            analyzed: false,
            created_at: Utc::now().naive_utc(),
        }
    }

    pub fn timestamp_millis(&self) -> i64 {
        self.created_at.and_utc().timestamp_millis()
    }
}
