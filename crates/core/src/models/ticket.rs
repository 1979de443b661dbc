//! Ticket and participant models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ticket lifecycle status. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Open,
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::Closed => "closed",
        }
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A matchmaking session with a capacity and a set of participants
///
/// `is_active` is derived: the ticket is currently accepting joins,
/// i.e. open and not full.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    pub status: TicketStatus,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub nb_players: u32,
    pub capacity: u32,
    pub game_mode_id: Uuid,
    pub creator_id: Uuid,
}

impl Ticket {
    /// Build a fresh open ticket; the creator counts as the first player.
    pub fn new(creator_id: Uuid, game_mode_id: Uuid, capacity: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: TicketStatus::Open,
            is_active: true,
            created_at: Utc::now(),
            ended_at: None,
            nb_players: 1,
            capacity,
            game_mode_id,
            creator_id,
        }
    }

    pub fn is_full(&self) -> bool {
        self.nb_players >= self.capacity
    }

    /// Closed or ended tickets no longer accept votes
    pub fn is_ended(&self) -> bool {
        self.status == TicketStatus::Closed || self.ended_at.is_some()
    }
}

/// A user's membership in a ticket (the creator included)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub ticket_id: Uuid,
    pub user_id: Uuid,
    pub joined_at: DateTime<Utc>,
}

impl Participant {
    pub fn new(ticket_id: Uuid, user_id: Uuid) -> Self {
        Self {
            ticket_id,
            user_id,
            joined_at: Utc::now(),
        }
    }
}

/// Participant joined with user info for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantInfo {
    pub user_id: Uuid,
    pub username: String,
    pub reputation_score: i64,
    pub joined_at: DateTime<Utc>,
}

/// Ticket plus its participant read model, consumed by the report and
/// profile collaborators
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketDetail {
    pub ticket: Ticket,
    pub participants: Vec<ParticipantInfo>,
}

/// Partial update for a ticket
#[derive(Debug, Clone, Default)]
pub struct TicketPatch {
    pub status: Option<TicketStatus>,
    pub capacity: Option<u32>,
    pub game_mode_id: Option<Uuid>,
}

impl TicketPatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.capacity.is_none() && self.game_mode_id.is_none()
    }
}

/// Listing filter with pagination bounds
#[derive(Debug, Clone)]
pub struct TicketFilter {
    pub status: Option<TicketStatus>,
    pub game_mode_id: Option<Uuid>,
    pub newest_first: bool,
    pub limit: u32,
    pub offset: u32,
}

impl Default for TicketFilter {
    fn default() -> Self {
        Self {
            status: None,
            game_mode_id: None,
            newest_first: true,
            limit: 50,
            offset: 0,
        }
    }
}

impl TicketFilter {
    /// Clamp pagination to sane bounds (limit 1..=200)
    pub fn clamped(mut self) -> Self {
        self.limit = self.limit.clamp(1, 200);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ticket_defaults() {
        let ticket = Ticket::new(Uuid::new_v4(), Uuid::new_v4(), 2);
        assert_eq!(ticket.status, TicketStatus::Open);
        assert!(ticket.is_active);
        assert_eq!(ticket.nb_players, 1);
        assert!(ticket.ended_at.is_none());
        assert!(!ticket.is_full());
        assert!(!ticket.is_ended());
    }

    #[test]
    fn test_full_open_ticket_is_not_ended() {
        let mut ticket = Ticket::new(Uuid::new_v4(), Uuid::new_v4(), 2);
        ticket.nb_players = 2;
        ticket.is_active = false;
        assert!(ticket.is_full());
        assert!(!ticket.is_ended());
    }

    #[test]
    fn test_filter_clamps_limit() {
        let filter = TicketFilter {
            limit: 5000,
            ..Default::default()
        };
        assert_eq!(filter.clamped().limit, 200);

        let filter = TicketFilter {
            limit: 0,
            ..Default::default()
        };
        assert_eq!(filter.clamped().limit, 1);
    }
}
