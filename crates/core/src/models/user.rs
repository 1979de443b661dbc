//! User, role and game-mode models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Platform roles in elevation order (lowest to highest)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Role {
    /// Regular player
    User = 1,
    /// Can act on tickets and reports of other users
    Moderator = 2,
    /// Full control
    Admin = 3,
}

impl Role {
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Moderator => "Moderator",
            Role::Admin => "Admin",
        }
    }

    /// Elevated roles may act on resources they do not own
    pub fn is_elevated(&self) -> bool {
        *self >= Role::Moderator
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A registered user
///
/// Account creation and authentication live outside this crate; the core
/// only reads identity and owns the `reputation_score` accumulator.
/// `banned_at` is written by the moderation collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub reputation_score: i64,
    pub banned_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            role,
            reputation_score: 0,
            banned_at: None,
            created_at: Utc::now(),
        }
    }
}

/// A playable mode of a game, bounding ticket capacity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameMode {
    pub id: Uuid,
    pub name: String,
    pub players_max: u32,
    pub is_ranked: bool,
}

impl GameMode {
    pub fn new(name: impl Into<String>, players_max: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            players_max,
            is_ranked: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_elevation() {
        assert!(!Role::User.is_elevated());
        assert!(Role::Moderator.is_elevated());
        assert!(Role::Admin.is_elevated());
        assert!(Role::Admin > Role::Moderator);
    }

    #[test]
    fn test_new_user_defaults() {
        let user = User::new("alice", Role::User);
        assert_eq!(user.reputation_score, 0);
        assert!(user.banned_at.is_none());
    }
}
