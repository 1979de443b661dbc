//! User storage operations

use rusqlite::{params, Connection};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{parse_datetime, parse_datetime_opt, parse_uuid, role_from_u8, OptionalExt};
use crate::error::Result;
use crate::models::User;

pub struct UserStore<'a> {
    conn: &'a Connection,
}

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        username: row.get(1)?,
        role: role_from_u8(row.get::<_, u8>(2)?),
        reputation_score: row.get(3)?,
        banned_at: parse_datetime_opt(row.get::<_, Option<String>>(4)?)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?)?,
    })
}

impl<'a> UserStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert a new user
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub fn create(&self, user: &User) -> Result<()> {
        self.conn.execute(
            "INSERT INTO users (id, username, role, reputation_score, banned_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user.id.to_string(),
                user.username,
                user.role as u8,
                user.reputation_score,
                user.banned_at.map(|t| t.to_rfc3339()),
                user.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Find user by ID
    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, username, role, reputation_score, banned_at, created_at
               FROM users WHERE id = ?1",
        )?;

        let user = stmt
            .query_row(params![id.to_string()], user_from_row)
            .optional()?;

        Ok(user)
    }

    /// Find user by username
    #[instrument(skip(self))]
    pub fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, username, role, reputation_score, banned_at, created_at
               FROM users WHERE username = ?1",
        )?;

        let user = stmt.query_row(params![username], user_from_row).optional()?;

        Ok(user)
    }

    /// Apply a signed delta to a user's reputation score
    #[instrument(skip(self))]
    pub fn adjust_reputation(&self, user_id: Uuid, delta: i64) -> Result<()> {
        self.conn.execute(
            "UPDATE users SET reputation_score = reputation_score + ?1 WHERE id = ?2",
            params![delta, user_id.to_string()],
        )?;
        Ok(())
    }

    /// Read the stored reputation score
    pub fn reputation_of(&self, user_id: Uuid) -> Result<Option<i64>> {
        let score = self
            .conn
            .query_row(
                "SELECT reputation_score FROM users WHERE id = ?1",
                params![user_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::storage::Database;

    #[test]
    fn test_create_and_find_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let user = User::new("alice", Role::Moderator);
        db.users().create(&user).unwrap();

        let found = db.users().find_by_id(user.id).unwrap().unwrap();
        assert_eq!(found.username, "alice");
        assert_eq!(found.role, Role::Moderator);
        assert_eq!(found.reputation_score, 0);

        let by_name = db.users().find_by_username("alice").unwrap().unwrap();
        assert_eq!(by_name.id, user.id);
        assert!(db.users().find_by_username("bob").unwrap().is_none());
    }

    #[test]
    fn test_adjust_reputation_accumulates() {
        let db = Database::open_in_memory().unwrap();
        let user = User::new("alice", Role::User);
        db.users().create(&user).unwrap();

        db.users().adjust_reputation(user.id, 1).unwrap();
        db.users().adjust_reputation(user.id, 1).unwrap();
        db.users().adjust_reputation(user.id, -2).unwrap();
        db.users().adjust_reputation(user.id, -1).unwrap();

        // scores may go negative
        assert_eq!(db.users().reputation_of(user.id).unwrap(), Some(-1));
    }

    #[test]
    fn test_reputation_of_missing_user() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.users().reputation_of(Uuid::new_v4()).unwrap(), None);
    }
}
