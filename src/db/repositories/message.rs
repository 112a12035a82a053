use chrono::NaiveDateTime;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tracing::instrument;

use crate::db::StoreResult;
use crate::db::keys::Table;
use crate::db::models::message::{Author, ChatMessage};
use crate::db::models::user::UserId;

#[derive(Debug)]
pub struct MessageRepository {
    manager: ConnectionManager,
}

impl MessageRepository {
    pub fn new(manager: ConnectionManager) -> Self {
        Self { manager }
    }

    #[instrument(skip(self, message), fields(user_id = %message.user_id, message_id = message.id))]
    pub async fn append(&self, message: &ChatMessage) -> StoreResult<()> {
        let mut conn = self.manager.clone();

        let raw = serde_json::to_string(message)?;
        let _: () = conn
            .set(Table::Message.scoped(&message.user_id, &message.id), raw)
            .await?;
        let _: () = conn
            .zadd(
                Table::Message.index(&message.user_id),
                &message.id,
                message.timestamp_millis(),
            )
            .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get(&self, user_id: &UserId, id: &str) -> StoreResult<Option<ChatMessage>> {
        let mut conn = self.manager.clone();
        let raw: Option<String> = conn.get(Table::Message.scoped(user_id, id)).await?;

        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Range-scan over the timestamp index, oldest first.
    #[instrument(skip(self))]
    pub async fn since(&self, user_id: &UserId, since: NaiveDateTime) -> StoreResult<Vec<ChatMessage>> {
        let mut conn = self.manager.clone();
        let ids: Vec<String> = conn
            .zrangebyscore(
                Table::Message.index(user_id),
                since.and_utc().timestamp_millis(),
                "+inf",
            )
            .await?;

        let mut out = Vec::with_capacity(ids.len());
        for id in &ids {
            match self.get(user_id, id).await? {
                Some(message) => out.push(message),
                None => {
                    tracing::warn!(user_id = %user_id, message_id = id, "indexed message missing");
                }
            }
        }

        Ok(out)
    }

    /// User-authored messages inside the lookback window that the analyzer
    /// has not scored yet.
    #[instrument(skip(self))]
    pub async fn unanalyzed_since(
        &self,
        user_id: &UserId,
        since: NaiveDateTime,
    ) -> StoreResult<Vec<ChatMessage>> {
        Ok(self
            .since(user_id, since)
            .await?
            .into_iter()
            .filter(|m| m.author == Author::User && !m.analyzed)
            .collect())
    }

    /// Flips the analyzed marker. Safe to re-run over already-marked ids.
    #[instrument(skip(self, ids), fields(user_id = %user_id, count = ids.len()))]
    pub async fn mark_analyzed(&self, user_id: &UserId, ids: &[String]) -> StoreResult<()> {
        let mut conn = self.manager.clone();

        for id in ids {
            let Some(mut message) = self.get(user_id, id).await? else {
                tracing::warn!(user_id = %user_id, message_id = id, "cannot mark missing message");
                continue;
            };
            if message.analyzed {
                continue;
            }

            message.analyzed = true;
            let raw = serde_json::to_string(&message)?;
            let _: () = conn
                .set(Table::Message.scoped(user_id, id), raw)
                .await?;
        }

        Ok(())
    }

    /// Most recent messages in chronological order, for chat context.
    #[instrument(skip(self))]
    pub async fn recent(&self, user_id: &UserId, limit: usize) -> StoreResult<Vec<ChatMessage>> {
        let mut conn = self.manager.clone();
        let stop = limit.saturating_sub(1) as isize;
        let ids: Vec<String> = conn
            .zrevrange(Table::Message.index(user_id), 0, stop)
            .await?;

        let mut out = Vec::with_capacity(ids.len());
        for id in ids.iter().rev() {
            if let Some(message) = self.get(user_id, id).await? {
                out.push(message);
            }
        }

        Ok(out)
    }
}
