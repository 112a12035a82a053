use chrono::{Days, NaiveDate};
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tracing::instrument;

use crate::db::StoreResult;
use crate::db::keys::Table;
use crate::db::models::quest::{DailyQuestSet, QuestStatus};
use crate::db::models::user::UserId;

#[derive(Debug)]
pub struct QuestRepository {
    manager: ConnectionManager,
}

impl QuestRepository {
    pub fn new(manager: ConnectionManager) -> Self {
        Self { manager }
    }

    #[instrument(skip(self))]
    pub async fn get_for(
        &self,
        user_id: &UserId,
        date: NaiveDate,
    ) -> StoreResult<Option<DailyQuestSet>> {
        let mut conn = self.manager.clone();
        let raw: Option<String> = conn.get(Table::Quest.scoped(user_id, date)).await?;

        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// First write for a (user, date) pair; the TTL starts the 7-day expiry.
    #[instrument(skip(self, set), fields(user_id = %set.user_id, date = %set.date))]
    pub async fn create(&self, set: &DailyQuestSet, ttl_secs: i64) -> StoreResult<()> {
        let mut conn = self.manager.clone();
        let raw = serde_json::to_string(set)?;
        let _: () = conn
            .set_ex(
                Table::Quest.scoped(&set.user_id, set.date),
                raw,
                ttl_secs.max(0) as u64,
            )
            .await?;

        Ok(())
    }

    /// Evaluator rewrite. KEEPTTL so progress updates never reset the expiry.
    #[instrument(skip(self, set), fields(user_id = %set.user_id, date = %set.date))]
    pub async fn update(&self, set: &DailyQuestSet) -> StoreResult<()> {
        let mut conn = self.manager.clone();
        let raw = serde_json::to_string(set)?;

        let _: () = redis::cmd("SET")
            .arg(Table::Quest.scoped(&set.user_id, set.date))
            .arg(raw)
            .arg("KEEPTTL")
            .query_async(&mut conn)
            .await?;

        Ok(())
    }

    /// Completed quests across the retained window, for achievement stats.
    #[instrument(skip(self))]
    pub async fn completed_in_window(
        &self,
        user_id: &UserId,
        until: NaiveDate,
        window_days: i64,
    ) -> StoreResult<i64> {
        let mut completed = 0;

        for offset in 0..window_days.max(0) as u64 {
            let Some(date) = until.checked_sub_days(Days::new(offset)) else {
                break;
            };

            if let Some(set) = self.get_for(user_id, date).await? {
                completed += set
                    .quests
                    .iter()
                    .filter(|q| q.status == QuestStatus::Completed)
                    .count() as i64;
            }
        }

        Ok(completed)
    }
}
