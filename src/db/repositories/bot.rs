use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tracing::instrument;

use crate::constants::DEFAULT_BOTS;
use crate::db::StoreResult;
use crate::db::keys::{self, Table};
use crate::db::models::bot::{BotId, BotProfile};
use crate::db::repositories::Repository;

#[derive(Debug)]
pub struct BotRepository {
    manager: ConnectionManager,
}

#[async_trait]
impl Repository for BotRepository {
    type Ident = BotId;
    type Output = BotProfile;

    const TABLE: Table = Table::Bot;

    fn new(manager: ConnectionManager) -> Self {
        Self { manager }
    }

    fn manager(&self) -> ConnectionManager {
        self.manager.clone()
    }
}

impl BotRepository {
    /// Writes the default personas on startup without clobbering profiles an
    /// operator has already customized.
    #[instrument(skip(self))]
    pub async fn seed_defaults(&self) -> StoreResult<()> {
        let mut conn = self.manager();

        for seed in DEFAULT_BOTS {
            let profile = BotProfile::from(seed);
            if !self.exists(&profile.id).await? {
                tracing::info!(bot_id = %profile.id, "seeding default bot profile");
                self.put(&profile.id, &profile).await?;
            }
            let _: () = conn.sadd(keys::BOTS_INDEX, profile.id.to_string()).await?;
        }

        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn all(&self) -> StoreResult<Vec<BotProfile>> {
        let mut conn = self.manager();
        let mut ids: Vec<String> = conn.smembers(keys::BOTS_INDEX).await?;
        ids.sort();

        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(profile) = self.get(&BotId(id)).await? {
                out.push(profile);
            }
        }

        Ok(out)
    }
}
