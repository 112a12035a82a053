use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tracing::instrument;

use crate::db::StoreResult;
use crate::db::keys::Table;
use crate::db::models::analytics::AnalyticsRecord;
use crate::db::models::user::UserId;

#[derive(Debug)]
pub struct AnalyticsRepository {
    manager: ConnectionManager,
}

impl AnalyticsRepository {
    pub fn new(manager: ConnectionManager) -> Self {
        Self { manager }
    }

    #[instrument(skip(self, record), fields(user_id = %record.user_id, record_id = record.id))]
    pub async fn append(&self, record: &AnalyticsRecord) -> StoreResult<()> {
        let mut conn = self.manager.clone();

        let raw = serde_json::to_string(record)?;
        let _: () = conn
            .set(Table::Analytics.scoped(&record.user_id, &record.id), raw)
            .await?;
        let _: () = conn
            .zadd(
                Table::Analytics.index(&record.user_id),
                &record.id,
                record.timestamp_millis(),
            )
            .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get(&self, user_id: &UserId, id: &str) -> StoreResult<Option<AnalyticsRecord>> {
        let mut conn = self.manager.clone();
        let raw: Option<String> = conn.get(Table::Analytics.scoped(user_id, id)).await?;

        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    pub async fn since(
        &self,
        user_id: &UserId,
        since: NaiveDateTime,
    ) -> StoreResult<Vec<AnalyticsRecord>> {
        let mut conn = self.manager.clone();
        let ids: Vec<String> = conn
            .zrangebyscore(
                Table::Analytics.index(user_id),
                since.and_utc().timestamp_millis(),
                "+inf",
            )
            .await?;

        let mut out = Vec::with_capacity(ids.len());
        for id in &ids {
            match self.get(user_id, id).await? {
                Some(record) => out.push(record),
                None => {
                    tracing::warn!(user_id = %user_id, record_id = id, "indexed analytics record missing");
                }
            }
        }

        Ok(out)
    }

    /// All records whose source message falls on the given (UTC) date.
    #[instrument(skip(self))]
    pub async fn on_date(
        &self,
        user_id: &UserId,
        date: NaiveDate,
    ) -> StoreResult<Vec<AnalyticsRecord>> {
        let (start, end) = day_bounds_millis(date);

        let mut conn = self.manager.clone();
        let ids: Vec<String> = conn
            .zrangebyscore(Table::Analytics.index(user_id), start, end)
            .await?;

        let mut out = Vec::with_capacity(ids.len());
        for id in &ids {
            if let Some(record) = self.get(user_id, id).await? {
                out.push(record);
            }
        }

        Ok(out)
    }

    #[instrument(skip(self))]
    pub async fn count(&self, user_id: &UserId) -> StoreResult<i64> {
        let mut conn = self.manager.clone();
        Ok(conn.zcard(Table::Analytics.index(user_id)).await?)
    }

    #[instrument(skip(self))]
    pub async fn active_on(&self, user_id: &UserId, date: NaiveDate) -> StoreResult<bool> {
        let (start, end) = day_bounds_millis(date);

        let mut conn = self.manager.clone();
        let count: i64 = conn
            .zcount(Table::Analytics.index(user_id), start, end)
            .await?;

        Ok(count > 0)
    }
}

fn day_bounds_millis(date: NaiveDate) -> (i64, i64) {
    let start = date.and_time(NaiveTime::MIN);
    let end = start + Duration::days(1);

    (
        start.and_utc().timestamp_millis(),
        end.and_utc().timestamp_millis() - 1,
    )
}
