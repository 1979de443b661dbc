//! Auto-expiry sweep for stale open tickets
//!
//! A sweep scans open tickets and force-closes the ones a cutoff policy
//! marks as expired. The default policy expires a ticket once its age
//! exceeds the TTL, counted from creation rather than last activity, so
//! a recently-joined ticket can still expire. Scheduling lives with the
//! caller; one sweep is a plain synchronous call.

use chrono::{DateTime, Duration, Utc};
use tracing::{info, instrument};

use crate::error::Result;
use crate::models::Ticket;
use crate::storage::{Database, TicketStore};

/// Decides whether an open ticket should be force-closed at `now`
pub type ExpiryPolicy = dyn Fn(&Ticket, DateTime<Utc>) -> bool + Send + Sync;

/// Expire tickets created more than `ttl` before the sweep time
pub fn created_before_ttl(ttl: Duration) -> impl Fn(&Ticket, DateTime<Utc>) -> bool + Send + Sync {
    move |ticket, now| ticket.created_at < now - ttl
}

/// Run one sweep: close every open ticket the policy marks expired,
/// stamping `ended_at` with the sweep time. Returns how many closed.
#[instrument(skip(db, policy))]
pub fn sweep_once(db: &Database, policy: &ExpiryPolicy, now: DateTime<Utc>) -> Result<usize> {
    let tx = db.begin()?;
    let tickets = TicketStore::new(&tx);

    let expired: Vec<_> = tickets
        .list_open()?
        .into_iter()
        .filter(|t| policy(t, now))
        .map(|t| t.id)
        .collect();

    if expired.is_empty() {
        return Ok(0);
    }

    let closed = tickets.close_ids(&expired, now)?;
    tx.commit()?;

    info!(closed, "Swept expired tickets");
    Ok(closed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GameMode, Participant, Role, TicketStatus, User};

    fn setup() -> (Database, User, GameMode) {
        let db = Database::open_in_memory().unwrap();
        let user = User::new("creator", Role::User);
        let mode = GameMode::new("Squad", 5);
        db.users().create(&user).unwrap();
        db.game_modes().create(&mode).unwrap();
        (db, user, mode)
    }

    fn ticket_aged(db: &Database, user: &User, mode: &GameMode, age: Duration) -> Ticket {
        let mut ticket = Ticket::new(user.id, mode.id, 3);
        ticket.created_at = Utc::now() - age;
        db.tickets().create(&ticket).unwrap();
        db.tickets()
            .add_participant(&Participant::new(ticket.id, user.id))
            .unwrap();
        ticket
    }

    #[test]
    fn test_sweep_closes_stale_open_ticket() {
        let (db, user, mode) = setup();
        let stale = ticket_aged(&db, &user, &mode, Duration::hours(2));

        let now = Utc::now();
        let policy = created_before_ttl(Duration::minutes(60));
        let closed = sweep_once(&db, &policy, now).unwrap();
        assert_eq!(closed, 1);

        let swept = db.tickets().find_by_id(stale.id).unwrap().unwrap();
        assert_eq!(swept.status, TicketStatus::Closed);
        assert!(!swept.is_active);
        assert_eq!(swept.ended_at.unwrap(), now);
    }

    #[test]
    fn test_sweep_leaves_fresh_tickets_alone() {
        let (db, user, mode) = setup();
        let fresh = ticket_aged(&db, &user, &mode, Duration::minutes(5));

        let policy = created_before_ttl(Duration::minutes(60));
        let closed = sweep_once(&db, &policy, Utc::now()).unwrap();
        assert_eq!(closed, 0);

        let untouched = db.tickets().find_by_id(fresh.id).unwrap().unwrap();
        assert_eq!(untouched.status, TicketStatus::Open);
        assert!(untouched.ended_at.is_none());
    }

    #[test]
    fn test_sweep_skips_already_closed_tickets() {
        let (db, user, mode) = setup();
        let mut old_closed = ticket_aged(&db, &user, &mode, Duration::hours(3));
        let original_end = Utc::now() - Duration::hours(1);
        old_closed.status = TicketStatus::Closed;
        old_closed.is_active = false;
        old_closed.ended_at = Some(original_end);
        db.tickets().update(&old_closed).unwrap();

        let policy = created_before_ttl(Duration::minutes(60));
        let closed = sweep_once(&db, &policy, Utc::now()).unwrap();
        assert_eq!(closed, 0);

        let unchanged = db.tickets().find_by_id(old_closed.id).unwrap().unwrap();
        assert_eq!(unchanged.ended_at.unwrap(), original_end);
    }

    #[test]
    fn test_sweep_closes_only_expired_subset() {
        let (db, user, mode) = setup();
        let stale = ticket_aged(&db, &user, &mode, Duration::hours(2));
        let fresh = ticket_aged(&db, &user, &mode, Duration::minutes(1));

        let policy = created_before_ttl(Duration::minutes(60));
        let closed = sweep_once(&db, &policy, Utc::now()).unwrap();
        assert_eq!(closed, 1);

        assert_eq!(
            db.tickets().find_by_id(stale.id).unwrap().unwrap().status,
            TicketStatus::Closed
        );
        assert_eq!(
            db.tickets().find_by_id(fresh.id).unwrap().unwrap().status,
            TicketStatus::Open
        );
    }

    #[test]
    fn test_custom_policy_replaces_age_cutoff() {
        let (db, user, mode) = setup();
        // a week old but under capacity; age alone would have expired it
        let ticket = ticket_aged(&db, &user, &mode, Duration::days(7));

        let keep_underfilled = |t: &Ticket, _now: DateTime<Utc>| t.is_full();
        let closed = sweep_once(&db, &keep_underfilled, Utc::now()).unwrap();
        assert_eq!(closed, 0);

        assert_eq!(
            db.tickets().find_by_id(ticket.id).unwrap().unwrap().status,
            TicketStatus::Open
        );
    }
}
