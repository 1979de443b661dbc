//! Reputation vote storage operations

use rusqlite::{params, Connection};
use tracing::instrument;
use uuid::Uuid;

use super::is_unique_violation;
use super::parse::{parse_datetime, parse_uuid, vote_type_from_str, OptionalExt};
use crate::error::{Conflict, Error, Result};
use crate::models::{ReputationVote, VoteCast, VoteSummary, VoteType};

pub struct VoteStore<'a> {
    conn: &'a Connection,
}

impl<'a> VoteStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Find the vote a voter has cast against a target on a ticket
    #[instrument(skip(self))]
    pub fn find_for(
        &self,
        voter_user_id: Uuid,
        ticket_id: Uuid,
        target_user_id: Uuid,
    ) -> Result<Option<ReputationVote>> {
        let mut stmt = self.conn.prepare(
            "SELECT v.id, v.vote_type, v.target_user_id, v.ticket_id, v.created_at
               FROM reputation_votes v
              INNER JOIN vote_casts c ON c.vote_id = v.id
              WHERE c.voter_user_id = ?1 AND v.ticket_id = ?2 AND v.target_user_id = ?3",
        )?;

        let vote = stmt
            .query_row(
                params![
                    voter_user_id.to_string(),
                    ticket_id.to_string(),
                    target_user_id.to_string(),
                ],
                |row| {
                    Ok(ReputationVote {
                        id: parse_uuid(&row.get::<_, String>(0)?)?,
                        vote_type: vote_type_from_str(&row.get::<_, String>(1)?)?,
                        target_user_id: parse_uuid(&row.get::<_, String>(2)?)?,
                        ticket_id: parse_uuid(&row.get::<_, String>(3)?)?,
                        created_at: parse_datetime(&row.get::<_, String>(4)?)?,
                    })
                },
            )
            .optional()?;

        Ok(vote)
    }

    /// Insert a vote together with its cast link.
    ///
    /// The UNIQUE constraint on (voter, ticket, target) rejects a double
    /// vote even if two casts race past the application-level check.
    #[instrument(skip(self, vote), fields(vote_id = %vote.id, voter = %voter_user_id))]
    pub fn insert(&self, vote: &ReputationVote, voter_user_id: Uuid) -> Result<()> {
        self.conn.execute(
            "INSERT INTO reputation_votes (id, vote_type, target_user_id, ticket_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                vote.id.to_string(),
                vote.vote_type.as_str(),
                vote.target_user_id.to_string(),
                vote.ticket_id.to_string(),
                vote.created_at.to_rfc3339(),
            ],
        )?;

        let cast = VoteCast {
            voter_user_id,
            vote_id: vote.id,
            ticket_id: vote.ticket_id,
            target_user_id: vote.target_user_id,
        };
        self.conn
            .execute(
                "INSERT INTO vote_casts (voter_user_id, vote_id, ticket_id, target_user_id)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    cast.voter_user_id.to_string(),
                    cast.vote_id.to_string(),
                    cast.ticket_id.to_string(),
                    cast.target_user_id.to_string(),
                ],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    Error::Conflict(Conflict::DuplicateVote)
                } else {
                    Error::Database(e)
                }
            })?;

        Ok(())
    }

    /// Flip the direction of an existing vote
    #[instrument(skip(self))]
    pub fn update_type(&self, vote_id: Uuid, new_type: VoteType) -> Result<()> {
        self.conn.execute(
            "UPDATE reputation_votes SET vote_type = ?1 WHERE id = ?2",
            params![new_type.as_str(), vote_id.to_string()],
        )?;
        Ok(())
    }

    /// Remove a vote and its cast link
    #[instrument(skip(self))]
    pub fn delete(&self, voter_user_id: Uuid, vote_id: Uuid) -> Result<()> {
        self.conn.execute(
            "DELETE FROM vote_casts WHERE voter_user_id = ?1 AND vote_id = ?2",
            params![voter_user_id.to_string(), vote_id.to_string()],
        )?;
        self.conn.execute(
            "DELETE FROM reputation_votes WHERE id = ?1",
            params![vote_id.to_string()],
        )?;
        Ok(())
    }

    /// List a voter's ballot on one ticket
    #[instrument(skip(self))]
    pub fn list_for_voter(&self, ticket_id: Uuid, voter_user_id: Uuid) -> Result<Vec<VoteSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT v.target_user_id, v.vote_type
               FROM reputation_votes v
              INNER JOIN vote_casts c ON c.vote_id = v.id
              WHERE c.voter_user_id = ?1 AND v.ticket_id = ?2
              ORDER BY v.created_at ASC",
        )?;

        let votes = stmt
            .query_map(
                params![voter_user_id.to_string(), ticket_id.to_string()],
                |row| {
                    Ok(VoteSummary {
                        target_user_id: parse_uuid(&row.get::<_, String>(0)?)?,
                        vote_type: vote_type_from_str(&row.get::<_, String>(1)?)?,
                    })
                },
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(votes)
    }

    /// Recompute a user's score from the vote table alone
    /// (up votes received minus down votes received)
    pub fn recomputed_score(&self, user_id: Uuid) -> Result<i64> {
        let score = self.conn.query_row(
            "SELECT COALESCE(SUM(CASE vote_type WHEN 'up' THEN 1 ELSE -1 END), 0)
               FROM reputation_votes WHERE target_user_id = ?1",
            params![user_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GameMode, Participant, Role, Ticket, User};
    use crate::storage::Database;

    fn setup() -> (Database, Uuid, Uuid, Uuid) {
        let db = Database::open_in_memory().unwrap();
        let voter = User::new("voter", Role::User);
        let target = User::new("target", Role::User);
        let mode = GameMode::new("Duel", 4);
        db.users().create(&voter).unwrap();
        db.users().create(&target).unwrap();
        db.game_modes().create(&mode).unwrap();

        let ticket = Ticket::new(voter.id, mode.id, 2);
        db.tickets().create(&ticket).unwrap();
        db.tickets()
            .add_participant(&Participant::new(ticket.id, voter.id))
            .unwrap();
        db.tickets()
            .add_participant(&Participant::new(ticket.id, target.id))
            .unwrap();

        (db, voter.id, target.id, ticket.id)
    }

    #[test]
    fn test_insert_and_find_round_trip() {
        let (db, voter, target, ticket) = setup();
        let vote = ReputationVote::new(VoteType::Up, target, ticket);
        db.votes().insert(&vote, voter).unwrap();

        let found = db.votes().find_for(voter, ticket, target).unwrap().unwrap();
        assert_eq!(found.id, vote.id);
        assert_eq!(found.vote_type, VoteType::Up);

        // no vote in the other direction
        assert!(db.votes().find_for(target, ticket, voter).unwrap().is_none());
    }

    #[test]
    fn test_double_cast_hits_unique_constraint() {
        let (db, voter, target, ticket) = setup();
        let first = ReputationVote::new(VoteType::Up, target, ticket);
        db.votes().insert(&first, voter).unwrap();

        let second = ReputationVote::new(VoteType::Down, target, ticket);
        let err = db.votes().insert(&second, voter).unwrap_err();
        assert!(matches!(err, Error::Conflict(Conflict::DuplicateVote)));
    }

    #[test]
    fn test_delete_removes_both_rows() {
        let (db, voter, target, ticket) = setup();
        let vote = ReputationVote::new(VoteType::Down, target, ticket);
        db.votes().insert(&vote, voter).unwrap();

        db.votes().delete(voter, vote.id).unwrap();
        assert!(db.votes().find_for(voter, ticket, target).unwrap().is_none());

        // the slot is free again
        let again = ReputationVote::new(VoteType::Up, target, ticket);
        db.votes().insert(&again, voter).unwrap();
    }

    #[test]
    fn test_recomputed_score_counts_received_votes() {
        let (db, voter, target, ticket) = setup();
        let vote = ReputationVote::new(VoteType::Up, target, ticket);
        db.votes().insert(&vote, voter).unwrap();

        assert_eq!(db.votes().recomputed_score(target).unwrap(), 1);
        assert_eq!(db.votes().recomputed_score(voter).unwrap(), 0);

        db.votes().update_type(vote.id, VoteType::Down).unwrap();
        assert_eq!(db.votes().recomputed_score(target).unwrap(), -1);
    }

    #[test]
    fn test_list_for_voter_scopes_by_ticket() {
        let (db, voter, target, ticket) = setup();
        let vote = ReputationVote::new(VoteType::Up, target, ticket);
        db.votes().insert(&vote, voter).unwrap();

        let ballot = db.votes().list_for_voter(ticket, voter).unwrap();
        assert_eq!(ballot.len(), 1);
        assert_eq!(ballot[0].target_user_id, target);

        assert!(db
            .votes()
            .list_for_voter(Uuid::new_v4(), voter)
            .unwrap()
            .is_empty());
    }
}
