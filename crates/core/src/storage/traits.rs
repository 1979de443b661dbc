//! Storage repository traits
//!
//! These traits define the storage interface, allowing for different
//! implementations (SQLite, mock, future network backend).

use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    GameMode, Participant, ParticipantInfo, ReputationVote, Ticket, TicketFilter, User,
    VoteSummary,
};

/// Ticket repository operations
pub trait TicketRepository {
    /// Create a new ticket
    fn create_ticket(&self, ticket: &Ticket) -> Result<()>;

    /// Find ticket by ID
    fn find_ticket_by_id(&self, id: Uuid) -> Result<Option<Ticket>>;

    /// List tickets matching a filter
    fn list_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>>;

    /// Persist the mutable fields of a ticket
    fn update_ticket(&self, ticket: &Ticket) -> Result<()>;

    /// Delete a ticket and its dependent rows
    fn delete_ticket(&self, ticket_id: Uuid) -> Result<()>;

    /// Add a participant
    fn add_participant(&self, participant: &Participant) -> Result<()>;

    /// Check ticket membership
    fn participant_exists(&self, ticket_id: Uuid, user_id: Uuid) -> Result<bool>;

    /// List participants of a ticket with user info
    fn list_participants(&self, ticket_id: Uuid) -> Result<Vec<ParticipantInfo>>;
}

/// Reputation vote repository operations
pub trait VoteRepository {
    /// Find the vote a voter cast against a target on a ticket
    fn find_vote_for(
        &self,
        voter_user_id: Uuid,
        ticket_id: Uuid,
        target_user_id: Uuid,
    ) -> Result<Option<ReputationVote>>;

    /// List a voter's ballot on one ticket
    fn list_votes_for_voter(&self, ticket_id: Uuid, voter_user_id: Uuid)
        -> Result<Vec<VoteSummary>>;
}

/// User repository operations
pub trait UserRepository {
    /// Create a new user
    fn create_user(&self, user: &User) -> Result<()>;

    /// Find user by ID
    fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// Find user by username
    fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Create a game mode
    fn create_game_mode(&self, mode: &GameMode) -> Result<()>;

    /// Find game mode by ID
    fn find_game_mode_by_id(&self, id: Uuid) -> Result<Option<GameMode>>;
}

/// Combined storage interface
///
/// Provides access to all repository operations.
/// Implementations may be backed by SQLite, mocks, or network.
pub trait Storage: TicketRepository + VoteRepository + UserRepository {}

// Blanket implementation: any type implementing all traits implements Storage
impl<T> Storage for T where T: TicketRepository + VoteRepository + UserRepository {}
