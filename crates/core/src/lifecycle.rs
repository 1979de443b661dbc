//! Ticket lifecycle management
//!
//! Creation, joining, capacity and status edits, owner close, and
//! administrative delete. Every mutation runs inside one transaction so
//! a precondition failure never leaves a partial write behind.

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{Conflict, Error, Result};
use crate::models::{
    GameMode, Participant, Ticket, TicketDetail, TicketFilter, TicketPatch, TicketStatus,
};
use crate::policy::{can_act, Actor, ELEVATED_ROLES};
use crate::storage::{Database, GameModeStore, TicketStore, UserStore};

/// Smallest ticket worth matchmaking over
pub const MIN_CAPACITY: u32 = 2;

pub struct TicketLifecycle<'a> {
    db: &'a Database,
}

impl<'a> TicketLifecycle<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Open a new ticket; the target user becomes its first participant.
    ///
    /// An absent or zero requested capacity defaults to 2; an explicit
    /// value is clamped into `[2, players_max]`.
    #[instrument(skip(self, actor), fields(actor_id = %actor.id))]
    pub fn create(
        &self,
        actor: &Actor,
        target_user_id: Uuid,
        game_mode_id: Uuid,
        requested_capacity: Option<u32>,
    ) -> Result<TicketDetail> {
        if !can_act(actor, target_user_id, ELEVATED_ROLES) {
            return Err(Error::Forbidden(
                "cannot create a ticket for another user".into(),
            ));
        }

        let tx = self.db.begin()?;
        let tickets = TicketStore::new(&tx);

        let mode = GameModeStore::new(&tx)
            .find_by_id(game_mode_id)?
            .ok_or_else(|| Error::NotFound(format!("game mode {game_mode_id}")))?;
        if mode.players_max < MIN_CAPACITY {
            return Err(Error::InvalidArgument(format!(
                "game mode {} allows fewer than {MIN_CAPACITY} players",
                mode.name
            )));
        }

        UserStore::new(&tx)
            .find_by_id(target_user_id)?
            .ok_or_else(|| Error::NotFound(format!("user {target_user_id}")))?;

        let capacity = resolve_capacity(requested_capacity, &mode);
        let ticket = Ticket::new(target_user_id, game_mode_id, capacity);
        tickets.create(&ticket)?;
        tickets.add_participant(&Participant::new(ticket.id, target_user_id))?;

        let participants = tickets.list_participants(ticket.id)?;
        tx.commit()?;

        info!(ticket_id = %ticket.id, capacity, "Ticket created");
        Ok(TicketDetail {
            ticket,
            participants,
        })
    }

    /// Join an open ticket.
    ///
    /// The membership insert and the seat claim run in one transaction;
    /// the claim itself is a conditional update, so of two concurrent
    /// joins racing for the last seat exactly one commits.
    #[instrument(skip(self, actor), fields(actor_id = %actor.id))]
    pub fn join(&self, actor: &Actor, ticket_id: Uuid, target_user_id: Uuid) -> Result<Ticket> {
        if !can_act(actor, target_user_id, ELEVATED_ROLES) {
            return Err(Error::Forbidden(
                "cannot join a ticket on behalf of another user".into(),
            ));
        }

        let tx = self.db.begin()?;
        let tickets = TicketStore::new(&tx);

        let ticket = tickets
            .find_by_id(ticket_id)?
            .ok_or_else(|| Error::NotFound(format!("ticket {ticket_id}")))?;
        if ticket.status == TicketStatus::Closed {
            return Err(Error::Conflict(Conflict::TicketClosed));
        }
        UserStore::new(&tx)
            .find_by_id(target_user_id)?
            .ok_or_else(|| Error::NotFound(format!("user {target_user_id}")))?;

        // duplicate membership trips the composite primary key
        tickets.add_participant(&Participant::new(ticket_id, target_user_id))?;

        if !tickets.try_claim_seat(ticket_id)? {
            // the transaction is dropped uncommitted, taking the
            // participant row with it
            let current = tickets.find_by_id(ticket_id)?;
            return match current {
                Some(t) if t.status == TicketStatus::Closed => {
                    Err(Error::Conflict(Conflict::TicketClosed))
                }
                _ => Err(Error::Conflict(Conflict::TicketFull)),
            };
        }

        let joined = tickets
            .find_by_id(ticket_id)?
            .ok_or_else(|| Error::NotFound(format!("ticket {ticket_id}")))?;
        tx.commit()?;

        info!(%ticket_id, user_id = %target_user_id, nb_players = joined.nb_players, "User joined ticket");
        Ok(joined)
    }

    /// Apply a partial update to a ticket.
    ///
    /// Capacity changes must stay within `[max(nb_players, 2),
    /// players_max]`; out-of-range values are rejected, never clamped.
    /// A closed ticket never reopens.
    #[instrument(skip(self, actor, patch), fields(actor_id = %actor.id))]
    pub fn update(&self, actor: &Actor, ticket_id: Uuid, patch: &TicketPatch) -> Result<Ticket> {
        if patch.is_empty() {
            return Err(Error::InvalidArgument("empty update".into()));
        }

        let tx = self.db.begin()?;
        let tickets = TicketStore::new(&tx);

        let mut ticket = tickets
            .find_by_id(ticket_id)?
            .ok_or_else(|| Error::NotFound(format!("ticket {ticket_id}")))?;
        if !can_act(actor, ticket.creator_id, ELEVATED_ROLES) {
            return Err(Error::Forbidden("not the ticket owner".into()));
        }

        let modes = GameModeStore::new(&tx);
        let mode = match patch.game_mode_id {
            Some(mode_id) => modes
                .find_by_id(mode_id)?
                .ok_or_else(|| Error::NotFound(format!("game mode {mode_id}")))?,
            None => modes
                .find_by_id(ticket.game_mode_id)?
                .ok_or_else(|| Error::NotFound(format!("game mode {}", ticket.game_mode_id)))?,
        };

        let capacity = patch.capacity.unwrap_or(ticket.capacity);
        let floor = ticket.nb_players.max(MIN_CAPACITY);
        if capacity < floor {
            return Err(Error::InvalidArgument(format!(
                "capacity {capacity} below minimum {floor}"
            )));
        }
        if capacity > mode.players_max {
            return Err(Error::InvalidArgument(format!(
                "capacity {capacity} exceeds mode limit {}",
                mode.players_max
            )));
        }

        match patch.status {
            Some(TicketStatus::Open) if ticket.status == TicketStatus::Closed => {
                return Err(Error::Conflict(Conflict::CannotReopen));
            }
            Some(TicketStatus::Closed) => {
                ticket.status = TicketStatus::Closed;
                ticket.ended_at = ticket.ended_at.or_else(|| Some(Utc::now()));
            }
            _ => {}
        }

        ticket.capacity = capacity;
        ticket.game_mode_id = mode.id;
        ticket.is_active =
            ticket.status == TicketStatus::Open && ticket.nb_players < ticket.capacity;

        tickets.update(&ticket)?;
        tx.commit()?;

        info!(%ticket_id, status = %ticket.status, capacity = ticket.capacity, "Ticket updated");
        Ok(ticket)
    }

    /// Close a ticket. Closing twice is a conflict; the first `ended_at`
    /// stamp is never overwritten.
    #[instrument(skip(self, actor), fields(actor_id = %actor.id))]
    pub fn close(&self, actor: &Actor, ticket_id: Uuid) -> Result<Ticket> {
        let tx = self.db.begin()?;
        let tickets = TicketStore::new(&tx);

        let mut ticket = tickets
            .find_by_id(ticket_id)?
            .ok_or_else(|| Error::NotFound(format!("ticket {ticket_id}")))?;
        if !can_act(actor, ticket.creator_id, ELEVATED_ROLES) {
            return Err(Error::Forbidden("not the ticket owner".into()));
        }
        if ticket.status == TicketStatus::Closed {
            return Err(Error::Conflict(Conflict::AlreadyClosed));
        }

        ticket.status = TicketStatus::Closed;
        ticket.is_active = false;
        ticket.ended_at = ticket.ended_at.or_else(|| Some(Utc::now()));

        tickets.update(&ticket)?;
        tx.commit()?;

        info!(%ticket_id, "Ticket closed");
        Ok(ticket)
    }

    /// Administrative delete; participant and vote rows cascade.
    ///
    /// Reputation deltas already applied through votes on this ticket are
    /// deliberately left in place.
    #[instrument(skip(self, actor), fields(actor_id = %actor.id))]
    pub fn delete(&self, actor: &Actor, ticket_id: Uuid) -> Result<()> {
        let tx = self.db.begin()?;
        let tickets = TicketStore::new(&tx);

        let ticket = tickets
            .find_by_id(ticket_id)?
            .ok_or_else(|| Error::NotFound(format!("ticket {ticket_id}")))?;
        if !can_act(actor, ticket.creator_id, ELEVATED_ROLES) {
            return Err(Error::Forbidden("not the ticket owner".into()));
        }

        tickets.delete(ticket_id)?;
        tx.commit()?;

        info!(%ticket_id, "Ticket deleted");
        Ok(())
    }

    /// Fetch a ticket with its participant read model
    #[instrument(skip(self))]
    pub fn get(&self, ticket_id: Uuid) -> Result<TicketDetail> {
        let ticket = self
            .db
            .tickets()
            .find_by_id(ticket_id)?
            .ok_or_else(|| Error::NotFound(format!("ticket {ticket_id}")))?;
        let participants = self.db.tickets().list_participants(ticket_id)?;
        Ok(TicketDetail {
            ticket,
            participants,
        })
    }

    /// List tickets matching a filter
    pub fn list(&self, filter: &TicketFilter) -> Result<Vec<Ticket>> {
        self.db.tickets().list(filter)
    }
}

fn resolve_capacity(requested: Option<u32>, mode: &GameMode) -> u32 {
    match requested {
        None | Some(0) => MIN_CAPACITY,
        Some(c) => c.clamp(MIN_CAPACITY, mode.players_max),
    }
}
