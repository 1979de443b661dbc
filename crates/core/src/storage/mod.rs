//! SQLite storage layer for SquadUp

mod migrations;
mod modes;
mod parse;
mod tickets;
mod traits;
mod users;
mod votes;

use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    GameMode, Participant, ParticipantInfo, ReputationVote, Ticket, TicketFilter, User,
    VoteSummary,
};
use rusqlite::{Connection, Transaction};
use std::path::Path;
use tracing::instrument;

pub use modes::GameModeStore;
pub use tickets::TicketStore;
pub use traits::{Storage, TicketRepository, UserRepository, VoteRepository};
pub use users::UserStore;
pub use votes::VoteStore;

/// True when the error is SQLite rejecting a row for violating a UNIQUE
/// or PRIMARY KEY constraint
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

/// Main database handle
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database at the given path
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Open in-memory database (for testing)
    #[instrument]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initialize database schema via migrations
    fn init(&self) -> Result<()> {
        migrations::run_migrations(&self.conn)?;
        Ok(())
    }

    /// Get current schema version
    pub fn schema_version(&self) -> u32 {
        self.conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap_or(0)
    }

    /// Start a transaction; stores built on it share its atomicity.
    /// The handle is not `&mut self` so callers holding the database
    /// behind a shared lock can still group writes.
    pub fn begin(&self) -> Result<Transaction<'_>> {
        Ok(self.conn.unchecked_transaction()?)
    }

    /// Get ticket store
    pub fn tickets(&self) -> TicketStore<'_> {
        TicketStore::new(&self.conn)
    }

    /// Get vote store
    pub fn votes(&self) -> VoteStore<'_> {
        VoteStore::new(&self.conn)
    }

    /// Get user store
    pub fn users(&self) -> UserStore<'_> {
        UserStore::new(&self.conn)
    }

    /// Get game mode store
    pub fn game_modes(&self) -> GameModeStore<'_> {
        GameModeStore::new(&self.conn)
    }
}

// Implement repository traits for Database
// This enables using Database through the trait interface

impl TicketRepository for Database {
    fn create_ticket(&self, ticket: &Ticket) -> Result<()> {
        self.tickets().create(ticket)
    }

    fn find_ticket_by_id(&self, id: Uuid) -> Result<Option<Ticket>> {
        self.tickets().find_by_id(id)
    }

    fn list_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>> {
        self.tickets().list(filter)
    }

    fn update_ticket(&self, ticket: &Ticket) -> Result<()> {
        self.tickets().update(ticket)
    }

    fn delete_ticket(&self, ticket_id: Uuid) -> Result<()> {
        self.tickets().delete(ticket_id)
    }

    fn add_participant(&self, participant: &Participant) -> Result<()> {
        self.tickets().add_participant(participant)
    }

    fn participant_exists(&self, ticket_id: Uuid, user_id: Uuid) -> Result<bool> {
        self.tickets().participant_exists(ticket_id, user_id)
    }

    fn list_participants(&self, ticket_id: Uuid) -> Result<Vec<ParticipantInfo>> {
        self.tickets().list_participants(ticket_id)
    }
}

impl VoteRepository for Database {
    fn find_vote_for(
        &self,
        voter_user_id: Uuid,
        ticket_id: Uuid,
        target_user_id: Uuid,
    ) -> Result<Option<ReputationVote>> {
        self.votes().find_for(voter_user_id, ticket_id, target_user_id)
    }

    fn list_votes_for_voter(
        &self,
        ticket_id: Uuid,
        voter_user_id: Uuid,
    ) -> Result<Vec<VoteSummary>> {
        self.votes().list_for_voter(ticket_id, voter_user_id)
    }
}

impl UserRepository for Database {
    fn create_user(&self, user: &User) -> Result<()> {
        self.users().create(user)
    }

    fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        self.users().find_by_id(id)
    }

    fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.users().find_by_username(username)
    }

    fn create_game_mode(&self, mode: &GameMode) -> Result<()> {
        self.game_modes().create(mode)
    }

    fn find_game_mode_by_id(&self, id: Uuid) -> Result<Option<GameMode>> {
        self.game_modes().find_by_id(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, User};

    #[test]
    fn test_schema_version_after_open() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.schema_version() >= 2);
    }

    #[test]
    fn test_open_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("squadup.db");

        let user = User::new("alice", Role::User);
        {
            let db = Database::open(&path).unwrap();
            db.users().create(&user).unwrap();
        }

        let db = Database::open(&path).unwrap();
        let found = db.users().find_by_id(user.id).unwrap().unwrap();
        assert_eq!(found.username, "alice");
    }

    #[test]
    fn test_rolled_back_transaction_leaves_no_rows() {
        let db = Database::open_in_memory().unwrap();
        let user = User::new("alice", Role::User);
        {
            let tx = db.begin().unwrap();
            UserStore::new(&tx).create(&user).unwrap();
            // dropped without commit
        }
        assert!(db.users().find_by_id(user.id).unwrap().is_none());
    }
}
