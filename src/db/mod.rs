use std::sync::LazyLock;

use redis::aio::ConnectionManager;
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::util::env::{EnvErr, Var};
use crate::var;

pub mod keys;
pub mod models;
pub mod repositories;

pub mod prelude {
    pub use crate::db::keys::Table;
    pub use crate::db::models::achievement::{UnlockedBadge, UserStats};
    pub use crate::db::models::analytics::{AnalyticsRecord, MessageClass, SubScores};
    pub use crate::db::models::bot::{BotId, BotProfile};
    pub use crate::db::models::competency::{Competency, CompetencyState, ScorePoint};
    pub use crate::db::models::message::{Author, ChatMessage};
    pub use crate::db::models::quest::{
        DailyQuestSet, Quest, QuestCategory, QuestProgress, QuestStatus, QuestTemplate,
    };
    pub use crate::db::models::user::{Role, User, UserId};
    pub use crate::db::models::{PaginatedResponse, Pagination};
    pub use crate::db::repositories::Repository;
    pub use crate::db::repositories::achievement::AchievementRepository;
    pub use crate::db::repositories::analytics::AnalyticsRepository;
    pub use crate::db::repositories::bot::BotRepository;
    pub use crate::db::repositories::competency::CompetencyRepository;
    pub use crate::db::repositories::message::MessageRepository;
    pub use crate::db::repositories::quest::QuestRepository;
    pub use crate::db::repositories::usage::UsageRepository;
    pub use crate::db::repositories::user::UserRepository;
    pub use crate::db::{Store, StoreErr, StoreResult, store};
}

static STORE: LazyLock<OnceCell<Store>> = LazyLock::new(OnceCell::new);
pub async fn store() -> StoreResult<&'static Store> {
    STORE.get_or_try_init(|| async { Store::new().await }).await
}

/// Shared handle on the document store.
///
/// `ConnectionManager` multiplexes and reconnects internally, so repositories
/// just clone it.
pub struct Store {
    pub manager: ConnectionManager,
}

impl Store {
    pub async fn new() -> StoreResult<Self> {
        let redis_url = var!(Var::RedisUrl).await?;
        tracing::debug!(redis_url, "connecting to document store");

        let client = redis::Client::open(redis_url)?;
        let manager = ConnectionManager::new(client).await?;

        Ok(Self { manager })
    }
}

pub type StoreResult<T> = core::result::Result<T, StoreErr>;

#[derive(Debug, Error)]
pub enum StoreErr {
    #[error(transparent)]
    EnvError(#[from] EnvErr),

    #[error(transparent)]
    RedisClientError(#[from] redis::RedisError),

    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),

    #[error("malformed record under key '{0}'")]
    BadRecord(String),
}
