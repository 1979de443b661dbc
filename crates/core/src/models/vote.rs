//! Reputation vote models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of a reputation vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    Up,
    Down,
}

impl VoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteType::Up => "up",
            VoteType::Down => "down",
        }
    }

    /// Score contribution of one vote of this type
    pub fn delta(&self) -> i64 {
        match self {
            VoteType::Up => 1,
            VoteType::Down => -1,
        }
    }
}

impl std::fmt::Display for VoteType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One up/down opinion about a target user within one ticket
///
/// Many voters may rate the same target; the one-vote-per-voter rule is
/// carried by [`VoteCast`], not by this row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReputationVote {
    pub id: Uuid,
    pub vote_type: VoteType,
    pub target_user_id: Uuid,
    pub ticket_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl ReputationVote {
    pub fn new(vote_type: VoteType, target_user_id: Uuid, ticket_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            vote_type,
            target_user_id,
            ticket_id,
            created_at: Utc::now(),
        }
    }
}

/// Link recording who cast a vote
///
/// `ticket_id` and `target_user_id` are denormalized copies of the linked
/// vote's scope so that "one cast per voter per (ticket, target)" is a
/// real UNIQUE constraint in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteCast {
    pub voter_user_id: Uuid,
    pub vote_id: Uuid,
    pub ticket_id: Uuid,
    pub target_user_id: Uuid,
}

/// One entry of a voter's ballot on a ticket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteSummary {
    pub target_user_id: Uuid,
    pub vote_type: VoteType,
}
