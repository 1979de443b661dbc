//! Developer guardrails and invariants
//!
//! Debug assertions for detecting impossible ticket states during
//! development. These checks are compiled out in release builds.

use crate::models::{GameMode, Ticket, TicketStatus};

/// Validate that a ticket's state is internally consistent
pub fn assert_ticket_invariants(ticket: &Ticket) {
    debug_assert!(
        ticket.capacity >= 2,
        "Ticket {} has capacity {} below the minimum of 2",
        ticket.id,
        ticket.capacity
    );

    debug_assert!(
        ticket.nb_players <= ticket.capacity,
        "Ticket {} has {} players but capacity {}",
        ticket.id,
        ticket.nb_players,
        ticket.capacity
    );

    // Closed tickets are inactive and stamped
    if ticket.status == TicketStatus::Closed {
        debug_assert!(
            !ticket.is_active,
            "Ticket {} is closed but still active",
            ticket.id
        );
        debug_assert!(
            ticket.ended_at.is_some(),
            "Ticket {} is closed without an ended_at stamp",
            ticket.id
        );
    }

    // A full open ticket must not be accepting joins
    if ticket.status == TicketStatus::Open && ticket.is_full() {
        debug_assert!(
            !ticket.is_active,
            "Ticket {} is full but still marked active",
            ticket.id
        );
    }
}

/// Validate that a ticket's capacity fits its game mode
pub fn assert_capacity_within_mode(ticket: &Ticket, mode: &GameMode) {
    debug_assert!(
        ticket.capacity <= mode.players_max,
        "Ticket {} capacity {} exceeds mode limit {}",
        ticket.id,
        ticket.capacity,
        mode.players_max
    );
}

/// Validate that the membership count matches the player counter
pub fn assert_participant_count(ticket: &Ticket, count: u32) {
    debug_assert!(
        ticket.nb_players == count,
        "Ticket {} counts {} players but has {} participant rows",
        ticket.id,
        ticket.nb_players,
        count
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn make_ticket(capacity: u32) -> Ticket {
        Ticket::new(Uuid::new_v4(), Uuid::new_v4(), capacity)
    }

    #[test]
    fn test_fresh_ticket_is_valid() {
        assert_ticket_invariants(&make_ticket(3));
    }

    #[test]
    fn test_closed_ticket_is_valid() {
        let mut ticket = make_ticket(2);
        ticket.status = TicketStatus::Closed;
        ticket.is_active = false;
        ticket.ended_at = Some(Utc::now());
        assert_ticket_invariants(&ticket);
    }

    #[test]
    #[should_panic(expected = "full but still marked active")]
    fn test_full_active_ticket_is_invalid() {
        let mut ticket = make_ticket(2);
        ticket.nb_players = 2;
        assert_ticket_invariants(&ticket);
    }

    #[test]
    #[should_panic(expected = "participant rows")]
    fn test_membership_count_mismatch() {
        let ticket = make_ticket(2);
        assert_participant_count(&ticket, 2);
    }
}
