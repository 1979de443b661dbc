//! Reputation vote ledger
//!
//! Cast, switch and revoke up/down votes between participants of a
//! ticket. The score accumulator on the target user is adjusted in the
//! same transaction as the vote rows, so the stored score always equals
//! the sum of votes received.

use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{Conflict, Error, Result};
use crate::models::{ReputationVote, Ticket, VoteSummary, VoteType};
use crate::storage::{Database, TicketStore, UserStore, VoteStore};

pub struct ReputationLedger<'a> {
    db: &'a Database,
}

impl<'a> ReputationLedger<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Cast a vote against a fellow participant.
    ///
    /// A full but still-open ticket accepts votes; only a closed or
    /// ended ticket is off limits.
    #[instrument(skip(self))]
    pub fn cast(
        &self,
        voter_id: Uuid,
        target_id: Uuid,
        ticket_id: Uuid,
        vote_type: VoteType,
    ) -> Result<()> {
        let tx = self.db.begin()?;
        check_context(&tx, voter_id, target_id, ticket_id)?;

        let votes = VoteStore::new(&tx);
        if votes.find_for(voter_id, ticket_id, target_id)?.is_some() {
            return Err(Error::Conflict(Conflict::DuplicateVote));
        }

        let vote = ReputationVote::new(vote_type, target_id, ticket_id);
        votes.insert(&vote, voter_id)?;
        UserStore::new(&tx).adjust_reputation(target_id, vote_type.delta())?;
        tx.commit()?;

        info!(%ticket_id, %target_id, vote_type = vote_type.as_str(), "Vote cast");
        Ok(())
    }

    /// Flip an existing vote to the other direction.
    ///
    /// Returns whether anything changed; switching to the direction the
    /// vote already has is a no-op, not an error. The score moves by two
    /// (the old delta reversed plus the new one applied).
    #[instrument(skip(self))]
    pub fn switch(
        &self,
        voter_id: Uuid,
        target_id: Uuid,
        ticket_id: Uuid,
        new_type: VoteType,
    ) -> Result<bool> {
        let tx = self.db.begin()?;
        check_context(&tx, voter_id, target_id, ticket_id)?;

        let votes = VoteStore::new(&tx);
        let vote = votes
            .find_for(voter_id, ticket_id, target_id)?
            .ok_or_else(|| Error::NotFound("no vote to switch".into()))?;
        if vote.vote_type == new_type {
            return Ok(false);
        }

        votes.update_type(vote.id, new_type)?;
        UserStore::new(&tx).adjust_reputation(target_id, 2 * new_type.delta())?;
        tx.commit()?;

        info!(%ticket_id, %target_id, vote_type = new_type.as_str(), "Vote switched");
        Ok(true)
    }

    /// Take back a vote, undoing its score delta
    #[instrument(skip(self))]
    pub fn revoke(&self, voter_id: Uuid, target_id: Uuid, ticket_id: Uuid) -> Result<()> {
        let tx = self.db.begin()?;
        check_context(&tx, voter_id, target_id, ticket_id)?;

        let votes = VoteStore::new(&tx);
        let vote = votes
            .find_for(voter_id, ticket_id, target_id)?
            .ok_or_else(|| Error::NotFound("no vote to revoke".into()))?;

        votes.delete(voter_id, vote.id)?;
        UserStore::new(&tx).adjust_reputation(target_id, -vote.vote_type.delta())?;
        tx.commit()?;

        info!(%ticket_id, %target_id, "Vote revoked");
        Ok(())
    }

    /// List the votes a voter has cast on one ticket
    #[instrument(skip(self))]
    pub fn list_votes(&self, ticket_id: Uuid, voter_id: Uuid) -> Result<Vec<VoteSummary>> {
        self.db
            .tickets()
            .find_by_id(ticket_id)?
            .ok_or_else(|| Error::NotFound(format!("ticket {ticket_id}")))?;
        self.db.votes().list_for_voter(ticket_id, voter_id)
    }
}

/// Shared preconditions for every ballot mutation: no self-votes, the
/// ticket must exist and not be ended, and both sides must be
/// participants.
fn check_context(
    tx: &rusqlite::Transaction<'_>,
    voter_id: Uuid,
    target_id: Uuid,
    ticket_id: Uuid,
) -> Result<Ticket> {
    if voter_id == target_id {
        return Err(Error::InvalidArgument("cannot vote for yourself".into()));
    }

    let tickets = TicketStore::new(tx);
    let ticket = tickets
        .find_by_id(ticket_id)?
        .ok_or_else(|| Error::NotFound(format!("ticket {ticket_id}")))?;
    if ticket.is_ended() {
        return Err(Error::Gone(format!("ticket {ticket_id} is closed")));
    }

    let users = UserStore::new(tx);
    for user_id in [voter_id, target_id] {
        users
            .find_by_id(user_id)?
            .ok_or_else(|| Error::NotFound(format!("user {user_id}")))?;
        if !tickets.participant_exists(ticket_id, user_id)? {
            return Err(Error::Forbidden(format!(
                "user {user_id} is not a participant of this ticket"
            )));
        }
    }

    Ok(ticket)
}
