use core::fmt;

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[default]
    User,
    SuperUser,
    Admin,
}

/// Base user record, created on first login and never hard-deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub role: Role,
    pub level: i64,
    pub organization: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl User {
    pub fn new(id: UserId, name: String) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id,
            name,
            role: Role::default(),
            level: 1,
            organization: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Upsert request body. Unset fields leave an existing record untouched.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertUser {
    pub id: String,
    pub name: String,
    pub role: Option<Role>,
    pub level: Option<i64>,
    pub organization: Option<String>,
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        UserId(value)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        UserId(value.to_string())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
