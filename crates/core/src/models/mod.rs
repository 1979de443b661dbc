//! Domain models

mod ticket;
mod user;
mod vote;

pub use ticket::{
    Participant, ParticipantInfo, Ticket, TicketDetail, TicketFilter, TicketPatch, TicketStatus,
};
pub use user::{GameMode, Role, User};
pub use vote::{ReputationVote, VoteCast, VoteSummary, VoteType};
