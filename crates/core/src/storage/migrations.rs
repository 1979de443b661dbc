//! Database migration system
//!
//! Tracks schema versions and applies migrations in order.

use rusqlite::Connection;
use tracing::{info, instrument};

use crate::error::Result;

/// A database migration
pub struct Migration {
    /// Version number (must be sequential starting from 1)
    pub version: u32,
    /// Description of what this migration does
    pub description: &'static str,
    /// SQL to run for this migration
    pub sql: &'static str,
}

/// All migrations in order
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial schema",
        sql: r#"
            -- Users: accounts live elsewhere; this crate reads identity and
            -- owns the reputation_score accumulator. banned_at is written by
            -- the moderation collaborator.
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                role INTEGER NOT NULL DEFAULT 1,
                reputation_score INTEGER NOT NULL DEFAULT 0,
                banned_at TEXT,
                created_at TEXT NOT NULL
            );

            -- Game mode catalog (CRUD handled by the catalog collaborator)
            CREATE TABLE IF NOT EXISTS game_modes (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                players_max INTEGER NOT NULL,
                is_ranked INTEGER NOT NULL DEFAULT 0
            );

            -- Matchmaking tickets
            CREATE TABLE IF NOT EXISTS tickets (
                id TEXT PRIMARY KEY,
                status TEXT NOT NULL DEFAULT 'open'
                    CHECK (status IN ('open', 'closed')),
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                ended_at TEXT,
                nb_players INTEGER NOT NULL DEFAULT 1,
                capacity INTEGER NOT NULL,
                game_mode_id TEXT NOT NULL,
                creator_id TEXT NOT NULL,
                FOREIGN KEY (game_mode_id) REFERENCES game_modes(id),
                FOREIGN KEY (creator_id) REFERENCES users(id),
                CHECK (nb_players <= capacity)
            );

            -- Ticket membership
            CREATE TABLE IF NOT EXISTS participants (
                ticket_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                joined_at TEXT NOT NULL,
                PRIMARY KEY (ticket_id, user_id),
                FOREIGN KEY (ticket_id) REFERENCES tickets(id) ON DELETE CASCADE,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );

            -- One up/down opinion about a target user within one ticket
            CREATE TABLE IF NOT EXISTS reputation_votes (
                id TEXT PRIMARY KEY,
                vote_type TEXT NOT NULL CHECK (vote_type IN ('up', 'down')),
                target_user_id TEXT NOT NULL,
                ticket_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (target_user_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY (ticket_id) REFERENCES tickets(id) ON DELETE CASCADE
            );

            -- Who cast which vote. ticket_id/target_user_id are denormalized
            -- copies of the linked vote's scope so the one-vote-per-voter
            -- rule is enforced by the UNIQUE constraint, not by application
            -- reads.
            CREATE TABLE IF NOT EXISTS vote_casts (
                voter_user_id TEXT NOT NULL,
                vote_id TEXT NOT NULL,
                ticket_id TEXT NOT NULL,
                target_user_id TEXT NOT NULL,
                PRIMARY KEY (voter_user_id, vote_id),
                UNIQUE (voter_user_id, ticket_id, target_user_id),
                FOREIGN KEY (voter_user_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY (vote_id) REFERENCES reputation_votes(id) ON DELETE CASCADE
            );
        "#,
    },
    Migration {
        version: 2,
        description: "Add indexes for query performance",
        sql: r#"
            -- Ticket indexes; (status, created_at) serves the expiry sweep
            CREATE INDEX IF NOT EXISTS idx_tickets_status ON tickets(status);
            CREATE INDEX IF NOT EXISTS idx_tickets_created ON tickets(created_at);
            CREATE INDEX IF NOT EXISTS idx_tickets_sweep ON tickets(status, created_at);
            CREATE INDEX IF NOT EXISTS idx_tickets_mode ON tickets(game_mode_id);
            CREATE INDEX IF NOT EXISTS idx_tickets_creator ON tickets(creator_id);

            -- Membership reverse lookup
            CREATE INDEX IF NOT EXISTS idx_participants_user ON participants(user_id);

            -- Vote indexes
            CREATE INDEX IF NOT EXISTS idx_votes_ticket ON reputation_votes(ticket_id);
            CREATE INDEX IF NOT EXISTS idx_votes_target ON reputation_votes(target_user_id);
            CREATE INDEX IF NOT EXISTS idx_votes_ticket_target
                ON reputation_votes(ticket_id, target_user_id);
            CREATE INDEX IF NOT EXISTS idx_casts_voter_ticket
                ON vote_casts(voter_user_id, ticket_id);
        "#,
    },
];

/// Initialize the migrations table
fn init_migrations_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}

/// Get the current schema version
fn get_current_version(conn: &Connection) -> Result<u32> {
    let version: Option<u32> = conn
        .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get(0)
        })
        .unwrap_or(None);
    Ok(version.unwrap_or(0))
}

/// Record that a migration was applied
fn record_migration(conn: &Connection, migration: &Migration) -> Result<()> {
    conn.execute(
        "INSERT INTO schema_migrations (version, description, applied_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![
            migration.version,
            migration.description,
            chrono::Utc::now().to_rfc3339()
        ],
    )?;
    Ok(())
}

/// Run all pending migrations
#[instrument(skip(conn))]
pub fn run_migrations(conn: &Connection) -> Result<()> {
    init_migrations_table(conn)?;

    let current_version = get_current_version(conn)?;

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                description = migration.description,
                "Applying migration"
            );

            conn.execute_batch(migration.sql)?;
            record_migration(conn, migration)?;
        }
    }

    let new_version = get_current_version(conn)?;
    if new_version > current_version {
        info!(
            from = current_version,
            to = new_version,
            "Database schema updated"
        );
    }

    Ok(())
}
