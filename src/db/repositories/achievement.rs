use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime};
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tracing::instrument;

use crate::db::keys::Table;
use crate::db::models::user::UserId;
use crate::db::{StoreErr, StoreResult};

/// Unlocked badges live in one hash per user: field = badge id, value =
/// RFC 3339 unlock timestamp. Append-only.
#[derive(Debug)]
pub struct AchievementRepository {
    manager: ConnectionManager,
}

impl AchievementRepository {
    pub fn new(manager: ConnectionManager) -> Self {
        Self { manager }
    }

    #[instrument(skip(self))]
    pub async fn unlocked(&self, user_id: &UserId) -> StoreResult<HashMap<String, NaiveDateTime>> {
        let mut conn = self.manager.clone();
        let raw: HashMap<String, String> = conn.hgetall(Table::Achievement.doc(user_id)).await?;

        let mut out = HashMap::with_capacity(raw.len());
        for (badge_id, stamp) in raw {
            let unlocked_at = DateTime::parse_from_rfc3339(&stamp)
                .map_err(|_| StoreErr::BadRecord(Table::Achievement.doc(user_id)))?
                .naive_utc();
            out.insert(badge_id, unlocked_at);
        }

        Ok(out)
    }

    /// Returns `true` only for the run that actually performed the unlock, so
    /// concurrent or repeated evaluations grant each badge exactly once.
    #[instrument(skip(self))]
    pub async fn grant(
        &self,
        user_id: &UserId,
        badge_id: &str,
        at: NaiveDateTime,
    ) -> StoreResult<bool> {
        let mut conn = self.manager.clone();
        let fresh: bool = conn
            .hset_nx(
                Table::Achievement.doc(user_id),
                badge_id,
                at.and_utc().to_rfc3339(),
            )
            .await?;

        Ok(fresh)
    }
}
