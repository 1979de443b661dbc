//! Ticket and participant storage operations

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{parse_datetime, parse_datetime_opt, parse_uuid, status_from_str, OptionalExt};
use super::is_unique_violation;
use crate::error::{Conflict, Error, Result};
use crate::models::{Participant, ParticipantInfo, Ticket, TicketFilter, TicketStatus};

pub struct TicketStore<'a> {
    conn: &'a Connection,
}

const TICKET_COLUMNS: &str =
    "id, status, is_active, created_at, ended_at, nb_players, capacity, game_mode_id, creator_id";

fn ticket_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Ticket> {
    Ok(Ticket {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        status: status_from_str(&row.get::<_, String>(1)?)?,
        is_active: row.get::<_, i32>(2)? != 0,
        created_at: parse_datetime(&row.get::<_, String>(3)?)?,
        ended_at: parse_datetime_opt(row.get::<_, Option<String>>(4)?)?,
        nb_players: row.get(5)?,
        capacity: row.get(6)?,
        game_mode_id: parse_uuid(&row.get::<_, String>(7)?)?,
        creator_id: parse_uuid(&row.get::<_, String>(8)?)?,
    })
}

impl<'a> TicketStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert a new ticket
    #[instrument(skip(self, ticket), fields(ticket_id = %ticket.id))]
    pub fn create(&self, ticket: &Ticket) -> Result<()> {
        self.conn.execute(
            "INSERT INTO tickets (id, status, is_active, created_at, ended_at, nb_players, capacity, game_mode_id, creator_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                ticket.id.to_string(),
                ticket.status.as_str(),
                ticket.is_active as i32,
                ticket.created_at.to_rfc3339(),
                ticket.ended_at.map(|t| t.to_rfc3339()),
                ticket.nb_players,
                ticket.capacity,
                ticket.game_mode_id.to_string(),
                ticket.creator_id.to_string(),
            ],
        )?;
        Ok(())
    }

    /// Find ticket by ID
    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Ticket>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE id = ?1"
        ))?;

        let ticket = stmt
            .query_row(params![id.to_string()], ticket_from_row)
            .optional()?;

        Ok(ticket)
    }

    /// List tickets matching a filter, with pagination
    #[instrument(skip(self, filter))]
    pub fn list(&self, filter: &TicketFilter) -> Result<Vec<Ticket>> {
        let filter = filter.clone().clamped();

        let mut clauses: Vec<&str> = Vec::new();
        let mut bindings: Vec<String> = Vec::new();
        if let Some(status) = filter.status {
            clauses.push("status = ?");
            bindings.push(status.as_str().to_string());
        }
        if let Some(mode_id) = filter.game_mode_id {
            clauses.push("game_mode_id = ?");
            bindings.push(mode_id.to_string());
        }

        let mut sql = format!("SELECT {TICKET_COLUMNS} FROM tickets");
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(if filter.newest_first {
            " ORDER BY created_at DESC"
        } else {
            " ORDER BY created_at ASC"
        });
        sql.push_str(&format!(" LIMIT {} OFFSET {}", filter.limit, filter.offset));

        let mut stmt = self.conn.prepare(&sql)?;
        let tickets = stmt
            .query_map(rusqlite::params_from_iter(bindings.iter()), ticket_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(tickets)
    }

    /// Persist the mutable fields of a ticket
    #[instrument(skip(self, ticket), fields(ticket_id = %ticket.id))]
    pub fn update(&self, ticket: &Ticket) -> Result<()> {
        self.conn.execute(
            "UPDATE tickets
                SET status = ?1, is_active = ?2, ended_at = ?3, nb_players = ?4,
                    capacity = ?5, game_mode_id = ?6
              WHERE id = ?7",
            params![
                ticket.status.as_str(),
                ticket.is_active as i32,
                ticket.ended_at.map(|t| t.to_rfc3339()),
                ticket.nb_players,
                ticket.capacity,
                ticket.game_mode_id.to_string(),
                ticket.id.to_string(),
            ],
        )?;
        Ok(())
    }

    /// Delete a ticket; participant and vote rows cascade
    #[instrument(skip(self))]
    pub fn delete(&self, ticket_id: Uuid) -> Result<()> {
        self.conn.execute(
            "DELETE FROM tickets WHERE id = ?1",
            params![ticket_id.to_string()],
        )?;
        Ok(())
    }

    /// Atomically consume one free seat on an open ticket.
    ///
    /// The check and the increment are a single conditional UPDATE, so at
    /// most one concurrent join can observe and consume the last slot.
    /// Returns false if the ticket was closed or full at the moment of the
    /// update.
    #[instrument(skip(self))]
    pub fn try_claim_seat(&self, ticket_id: Uuid) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE tickets
                SET nb_players = nb_players + 1,
                    is_active = CASE WHEN nb_players + 1 >= capacity THEN 0 ELSE is_active END
              WHERE id = ?1 AND status = 'open' AND nb_players < capacity",
            params![ticket_id.to_string()],
        )?;
        Ok(changed == 1)
    }

    /// Force-close the given tickets, stamping `ended_at` with the sweep
    /// time. Already-closed tickets are skipped. Returns how many closed.
    #[instrument(skip(self, ids), fields(candidates = ids.len()))]
    pub fn close_ids(&self, ids: &[Uuid], now: DateTime<Utc>) -> Result<usize> {
        let mut stmt = self.conn.prepare(
            "UPDATE tickets SET status = 'closed', is_active = 0, ended_at = ?1
              WHERE id = ?2 AND status = 'open'",
        )?;

        let mut closed = 0;
        for id in ids {
            closed += stmt.execute(params![now.to_rfc3339(), id.to_string()])?;
        }
        Ok(closed)
    }

    /// List every open ticket (sweeper candidate scan)
    pub fn list_open(&self) -> Result<Vec<Ticket>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE status = 'open' ORDER BY created_at ASC"
        ))?;

        let tickets = stmt
            .query_map([], ticket_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(tickets)
    }

    /// Add a participant. The composite primary key rejects a duplicate
    /// membership at the store level.
    #[instrument(skip(self, participant), fields(ticket_id = %participant.ticket_id, user_id = %participant.user_id))]
    pub fn add_participant(&self, participant: &Participant) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO participants (ticket_id, user_id, joined_at) VALUES (?1, ?2, ?3)",
                params![
                    participant.ticket_id.to_string(),
                    participant.user_id.to_string(),
                    participant.joined_at.to_rfc3339(),
                ],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    Error::Conflict(Conflict::AlreadyJoined)
                } else {
                    Error::Database(e)
                }
            })?;
        Ok(())
    }

    /// Check ticket membership
    #[instrument(skip(self))]
    pub fn participant_exists(&self, ticket_id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut stmt = self
            .conn
            .prepare("SELECT 1 FROM participants WHERE ticket_id = ?1 AND user_id = ?2")?;

        let found = stmt
            .query_row(
                params![ticket_id.to_string(), user_id.to_string()],
                |_| Ok(()),
            )
            .optional()?;

        Ok(found.is_some())
    }

    /// List participants of a ticket with user info
    #[instrument(skip(self))]
    pub fn list_participants(&self, ticket_id: Uuid) -> Result<Vec<ParticipantInfo>> {
        let mut stmt = self.conn.prepare(
            "SELECT u.id, u.username, u.reputation_score, p.joined_at
               FROM participants p
              INNER JOIN users u ON u.id = p.user_id
              WHERE p.ticket_id = ?1
              ORDER BY p.joined_at ASC",
        )?;

        let participants = stmt
            .query_map(params![ticket_id.to_string()], |row| {
                Ok(ParticipantInfo {
                    user_id: parse_uuid(&row.get::<_, String>(0)?)?,
                    username: row.get(1)?,
                    reputation_score: row.get(2)?,
                    joined_at: parse_datetime(&row.get::<_, String>(3)?)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(participants)
    }

    /// Count participant rows for a ticket
    pub fn count_participants(&self, ticket_id: Uuid) -> Result<u32> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM participants WHERE ticket_id = ?1",
            params![ticket_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GameMode, Role, User};
    use crate::storage::{Database, GameModeStore, UserStore};

    fn setup() -> (Database, User, GameMode) {
        let db = Database::open_in_memory().unwrap();
        let user = User::new("creator", Role::User);
        let mode = GameMode::new("Duel", 4);
        {
            let tx = db.begin().unwrap();
            UserStore::new(&tx).create(&user).unwrap();
            GameModeStore::new(&tx).create(&mode).unwrap();
            tx.commit().unwrap();
        }
        (db, user, mode)
    }

    fn stored_ticket(db: &Database, user: &User, mode: &GameMode, capacity: u32) -> Ticket {
        let ticket = Ticket::new(user.id, mode.id, capacity);
        db.tickets().create(&ticket).unwrap();
        db.tickets()
            .add_participant(&Participant::new(ticket.id, user.id))
            .unwrap();
        ticket
    }

    #[test]
    fn test_create_and_find_round_trip() {
        let (db, user, mode) = setup();
        let ticket = stored_ticket(&db, &user, &mode, 3);

        let found = db.tickets().find_by_id(ticket.id).unwrap().unwrap();
        assert_eq!(found.id, ticket.id);
        assert_eq!(found.status, TicketStatus::Open);
        assert_eq!(found.nb_players, 1);
        assert_eq!(found.capacity, 3);
        assert!(found.is_active);
        assert!(found.ended_at.is_none());
    }

    #[test]
    fn test_find_missing_ticket() {
        let (db, _, _) = setup();
        assert!(db.tickets().find_by_id(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_claim_seat_until_full() {
        let (db, user, mode) = setup();
        let ticket = stored_ticket(&db, &user, &mode, 3);

        assert!(db.tickets().try_claim_seat(ticket.id).unwrap());
        let mid = db.tickets().find_by_id(ticket.id).unwrap().unwrap();
        assert_eq!(mid.nb_players, 2);
        assert!(mid.is_active);

        // last seat flips is_active off in the same statement
        assert!(db.tickets().try_claim_seat(ticket.id).unwrap());
        let full = db.tickets().find_by_id(ticket.id).unwrap().unwrap();
        assert_eq!(full.nb_players, 3);
        assert!(!full.is_active);

        // no seat left
        assert!(!db.tickets().try_claim_seat(ticket.id).unwrap());
        let unchanged = db.tickets().find_by_id(ticket.id).unwrap().unwrap();
        assert_eq!(unchanged.nb_players, 3);
    }

    #[test]
    fn test_claim_seat_rejected_on_closed_ticket() {
        let (db, user, mode) = setup();
        let mut ticket = stored_ticket(&db, &user, &mode, 3);
        ticket.status = TicketStatus::Closed;
        ticket.is_active = false;
        ticket.ended_at = Some(Utc::now());
        db.tickets().update(&ticket).unwrap();

        assert!(!db.tickets().try_claim_seat(ticket.id).unwrap());
    }

    #[test]
    fn test_duplicate_participant_is_conflict() {
        let (db, user, mode) = setup();
        let ticket = stored_ticket(&db, &user, &mode, 3);

        let err = db
            .tickets()
            .add_participant(&Participant::new(ticket.id, user.id))
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(Conflict::AlreadyJoined)));
    }

    #[test]
    fn test_list_filters_by_status_and_mode() {
        let (db, user, mode) = setup();
        let other_mode = GameMode::new("Squad", 5);
        db.game_modes().create(&other_mode).unwrap();

        let open = stored_ticket(&db, &user, &mode, 3);
        let mut closed = Ticket::new(user.id, other_mode.id, 2);
        closed.status = TicketStatus::Closed;
        closed.is_active = false;
        closed.ended_at = Some(Utc::now());
        db.tickets().create(&closed).unwrap();

        let open_only = db
            .tickets()
            .list(&TicketFilter {
                status: Some(TicketStatus::Open),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(open_only.len(), 1);
        assert_eq!(open_only[0].id, open.id);

        let by_mode = db
            .tickets()
            .list(&TicketFilter {
                game_mode_id: Some(other_mode.id),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(by_mode.len(), 1);
        assert_eq!(by_mode[0].id, closed.id);

        let all = db.tickets().list(&TicketFilter::default()).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_delete_cascades_participants() {
        let (db, user, mode) = setup();
        let ticket = stored_ticket(&db, &user, &mode, 3);

        db.tickets().delete(ticket.id).unwrap();
        assert!(db.tickets().find_by_id(ticket.id).unwrap().is_none());
        assert_eq!(db.tickets().count_participants(ticket.id).unwrap(), 0);
        assert!(!db.tickets().participant_exists(ticket.id, user.id).unwrap());
    }

    #[test]
    fn test_participant_listing_includes_user_info() {
        let (db, user, mode) = setup();
        let ticket = stored_ticket(&db, &user, &mode, 3);

        let joiner = User::new("joiner", Role::User);
        db.users().create(&joiner).unwrap();
        db.tickets()
            .add_participant(&Participant::new(ticket.id, joiner.id))
            .unwrap();

        let participants = db.tickets().list_participants(ticket.id).unwrap();
        assert_eq!(participants.len(), 2);
        assert_eq!(participants[0].username, "creator");
        assert_eq!(participants[1].username, "joiner");
        assert_eq!(db.tickets().count_participants(ticket.id).unwrap(), 2);
    }
}
