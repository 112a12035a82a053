use core::fmt;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::instrument;

use crate::db::StoreResult;
use crate::db::keys::Table;

pub mod achievement;
pub mod analytics;
pub mod bot;
pub mod competency;
pub mod message;
pub mod quest;
pub mod usage;
pub mod user;

/// Base methods shared by repositories whose records are single JSON
/// documents under a primary key. Range-scanned tables (messages, analytics)
/// and hash-backed tables (competency, achievement) carry their own methods.
#[async_trait]
pub trait Repository {
    type Ident: fmt::Display + Send + Sync + fmt::Debug;
    type Output: Serialize + DeserializeOwned + Send + Sync + fmt::Debug;

    const TABLE: Table;

    fn new(manager: ConnectionManager) -> Self
    where
        Self: Sized;

    fn manager(&self) -> ConnectionManager;

    fn key(id: &Self::Ident) -> String {
        Self::TABLE.doc(id)
    }

    #[instrument(skip(self, id))]
    async fn get(&self, id: &Self::Ident) -> StoreResult<Option<Self::Output>> {
        let mut conn = self.manager();
        let raw: Option<String> = conn.get(Self::key(id)).await?;

        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, id, item))]
    async fn put(&self, id: &Self::Ident, item: &Self::Output) -> StoreResult<()> {
        let mut conn = self.manager();
        let raw = serde_json::to_string(item)?;
        let _: () = conn.set(Self::key(id), raw).await?;

        Ok(())
    }

    #[instrument(skip(self, id))]
    async fn exists(&self, id: &Self::Ident) -> StoreResult<bool> {
        let mut conn = self.manager();
        Ok(conn.exists(Self::key(id)).await?)
    }
}
