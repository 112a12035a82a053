//! Key builders for the logical tables in the document store.
//!
//! Every record is owned by a user id; range-scanned tables additionally keep
//! a per-user sorted-set index keyed by timestamp.

use core::fmt;

use crate::db::models::user::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    User,
    Message,
    Analytics,
    Competency,
    Quest,
    Achievement,
    Bot,
    Usage,
}

impl Table {
    pub const fn prefix(self) -> &'static str {
        match self {
            Table::User => "user",
            Table::Message => "message",
            Table::Analytics => "analytics",
            Table::Competency => "competency",
            Table::Quest => "quest",
            Table::Achievement => "achievement",
            Table::Bot => "bot",
            Table::Usage => "usage",
        }
    }

    /// Primary-key document: `<table>:<id>`.
    pub fn doc(self, id: impl fmt::Display) -> String {
        format!("{}:{}", self.prefix(), id)
    }

    /// Owned document with a sort key: `<table>:<user>:<sort>`.
    pub fn scoped(self, owner: &UserId, sort: impl fmt::Display) -> String {
        format!("{}:{}:{}", self.prefix(), owner, sort)
    }

    /// Per-user timestamp index for range queries.
    pub fn index(self, owner: &UserId) -> String {
        format!("{}:{}:index", self.prefix(), owner)
    }

    pub fn wildcard(self) -> String {
        format!("{}:*", self.prefix())
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prefix())
    }
}

/// Set of every known user id, scanned by the batch jobs.
pub const USERS_INDEX: &str = "users";

/// Set of every seeded bot profile id.
pub const BOTS_INDEX: &str = "bots";

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_key_shapes() {
        let user = UserId::from("u-123");

        assert_eq!(Table::User.doc(&user), "user:u-123");
        assert_eq!(Table::Message.scoped(&user, "m-9"), "message:u-123:m-9");
        assert_eq!(Table::Analytics.index(&user), "analytics:u-123:index");
        assert_eq!(Table::Quest.scoped(&user, "2026-08-07"), "quest:u-123:2026-08-07");
        assert_eq!(Table::Usage.doc("2026-08-07"), "usage:2026-08-07");
        assert_eq!(Table::Competency.wildcard(), "competency:*");
    }
}
