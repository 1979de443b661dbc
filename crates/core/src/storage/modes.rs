//! Game mode catalog storage

use rusqlite::{params, Connection};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{parse_uuid, OptionalExt};
use crate::error::Result;
use crate::models::GameMode;

pub struct GameModeStore<'a> {
    conn: &'a Connection,
}

fn mode_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<GameMode> {
    Ok(GameMode {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        name: row.get(1)?,
        players_max: row.get(2)?,
        is_ranked: row.get::<_, i32>(3)? != 0,
    })
}

impl<'a> GameModeStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert a new game mode
    #[instrument(skip(self, mode), fields(mode_id = %mode.id))]
    pub fn create(&self, mode: &GameMode) -> Result<()> {
        self.conn.execute(
            "INSERT INTO game_modes (id, name, players_max, is_ranked) VALUES (?1, ?2, ?3, ?4)",
            params![
                mode.id.to_string(),
                mode.name,
                mode.players_max,
                mode.is_ranked as i32,
            ],
        )?;
        Ok(())
    }

    /// Find game mode by ID
    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<GameMode>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, players_max, is_ranked FROM game_modes WHERE id = ?1",
        )?;

        let mode = stmt
            .query_row(params![id.to_string()], mode_from_row)
            .optional()?;

        Ok(mode)
    }

    /// List the whole catalog
    #[instrument(skip(self))]
    pub fn list(&self) -> Result<Vec<GameMode>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, players_max, is_ranked FROM game_modes ORDER BY name ASC")?;

        let modes = stmt
            .query_map([], mode_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(modes)
    }
}
