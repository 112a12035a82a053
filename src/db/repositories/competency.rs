use std::collections::{BTreeMap, HashMap};

use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tracing::instrument;

use crate::db::StoreResult;
use crate::db::keys::Table;
use crate::db::models::competency::{Competency, CompetencyState};
use crate::db::models::user::UserId;

/// Competency scores live in one hash per user, one field per competency.
#[derive(Debug)]
pub struct CompetencyRepository {
    manager: ConnectionManager,
}

impl CompetencyRepository {
    pub fn new(manager: ConnectionManager) -> Self {
        Self { manager }
    }

    #[instrument(skip(self))]
    pub async fn get_all(
        &self,
        user_id: &UserId,
    ) -> StoreResult<BTreeMap<Competency, CompetencyState>> {
        let mut conn = self.manager.clone();
        let raw: HashMap<String, String> = conn.hgetall(Table::Competency.doc(user_id)).await?;

        let mut out = BTreeMap::new();
        for (field, value) in raw {
            let Ok(competency) = field.parse::<Competency>() else {
                tracing::warn!(user_id = %user_id, field, "unknown competency field in store");
                continue;
            };

            out.insert(competency, serde_json::from_str(&value)?);
        }

        Ok(out)
    }

    #[instrument(skip(self))]
    pub async fn get(
        &self,
        user_id: &UserId,
        competency: Competency,
    ) -> StoreResult<Option<CompetencyState>> {
        let mut conn = self.manager.clone();
        let raw: Option<String> = conn
            .hget(Table::Competency.doc(user_id), competency.as_str())
            .await?;

        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, state))]
    pub async fn put(
        &self,
        user_id: &UserId,
        competency: Competency,
        state: &CompetencyState,
    ) -> StoreResult<()> {
        let mut conn = self.manager.clone();
        let raw = serde_json::to_string(state)?;
        let _: () = conn
            .hset(Table::Competency.doc(user_id), competency.as_str(), raw)
            .await?;

        Ok(())
    }
}
