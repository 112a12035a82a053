use async_trait::async_trait;
use chrono::Utc;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tracing::instrument;

use crate::db::keys::{self, Table};
use crate::db::models::user::{UpsertUser, User, UserId};
use crate::db::repositories::Repository;
use crate::db::{StoreErr, StoreResult};

#[derive(Debug)]
pub struct UserRepository {
    manager: ConnectionManager,
}

#[async_trait]
impl Repository for UserRepository {
    type Ident = UserId;
    type Output = User;

    const TABLE: Table = Table::User;

    fn new(manager: ConnectionManager) -> Self {
        Self { manager }
    }

    fn manager(&self) -> ConnectionManager {
        self.manager.clone()
    }
}

impl UserRepository {
    /// First-login create / profile update. Existing records keep their
    /// creation timestamp and any field the request leaves unset.
    #[instrument(skip(self, request), fields(user_id = request.id))]
    pub async fn upsert(&self, request: UpsertUser) -> StoreResult<User> {
        let id = UserId(request.id);
        let now = Utc::now().naive_utc();

        let user = match self.get(&id).await? {
            Some(mut existing) => {
                existing.name = request.name;
                if let Some(role) = request.role {
                    existing.role = role;
                }
                if let Some(level) = request.level {
                    existing.level = level;
                }
                if request.organization.is_some() {
                    existing.organization = request.organization;
                }
                existing.updated_at = now;
                existing
            }
            None => {
                tracing::info!(user_id = %id, "creating user on first login");
                let mut user = User::new(id.clone(), request.name);
                if let Some(role) = request.role {
                    user.role = role;
                }
                if let Some(level) = request.level {
                    user.level = level;
                }
                user.organization = request.organization;
                user
            }
        };

        self.put(&id, &user).await?;

        let mut conn = self.manager();
        let _: () = conn.sadd(keys::USERS_INDEX, id.to_string()).await?;

        Ok(user)
    }

    /// Every known user id, sorted for deterministic batch order.
    #[instrument(skip(self))]
    pub async fn ids(&self) -> StoreResult<Vec<UserId>> {
        let mut conn = self.manager();
        let mut raw: Vec<String> = conn.smembers(keys::USERS_INDEX).await?;
        raw.sort();

        Ok(raw.into_iter().map(UserId).collect())
    }

    #[instrument(skip(self))]
    pub async fn page(&self, limit: i64, page: i64) -> StoreResult<(Vec<User>, i64)> {
        let ids = self.ids().await?;
        let total = ids.len() as i64;

        let offset = (page.max(0) * limit.max(0)) as usize;
        let mut users = Vec::new();
        for id in ids.iter().skip(offset).take(limit.max(0) as usize) {
            match self.get(id).await? {
                Some(user) => users.push(user),
                None => {
                    return Err(StoreErr::BadRecord(Self::TABLE.doc(id)));
                }
            }
        }

        Ok((users, total))
    }
}
