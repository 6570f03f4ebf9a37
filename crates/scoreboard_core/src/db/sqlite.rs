use std::path::Path;

use rusqlite::{Connection, params};

use super::{SERVICE_COLUMNS, ScoreStore, TEAM_COLUMNS, insert_sql};
use crate::error::{PersistError, PersistStep};
use crate::schema::{ScoreRows, TIMESTAMP_FORMAT};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS teams (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  team_id INTEGER NOT NULL UNIQUE,
  name VARCHAR(255) NOT NULL,
  rank INTEGER NOT NULL,
  total_offense REAL NOT NULL,
  total_defense REAL NOT NULL,
  total_sla REAL NOT NULL,
  total_score REAL NOT NULL,
  image_path VARCHAR(255) NOT NULL,
  thumbnail_path VARCHAR(255) NOT NULL,
  tick INTEGER NOT NULL,
  recorded_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS services (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  team_id INTEGER NOT NULL,
  service_index INTEGER NOT NULL,
  status INTEGER NOT NULL,
  status_description VARCHAR(50) NOT NULL,
  offense REAL NOT NULL,
  defense REAL NOT NULL,
  sla REAL NOT NULL,
  tick INTEGER NOT NULL,
  recorded_at TEXT NOT NULL,
  FOREIGN KEY (team_id) REFERENCES teams(team_id)
);
"#;

/// Local SQLite sink with the same tables as the Postgres one.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let conn = Connection::open(db_path).map_err(PersistError::sqlite(PersistStep::Connect))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(PersistError::sqlite(PersistStep::Connect))?;
        conn.pragma_update(None, "synchronous", "NORMAL")
            .map_err(PersistError::sqlite(PersistStep::Connect))?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, PersistError> {
        let conn =
            Connection::open_in_memory().map_err(PersistError::sqlite(PersistStep::Connect))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, PersistError> {
        // SQLite leaves foreign keys unenforced unless asked.
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(PersistError::sqlite(PersistStep::Connect))?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl ScoreStore for SqliteStore {
    fn ensure_schema(&mut self) -> Result<(), PersistError> {
        self.conn
            .execute_batch(SCHEMA)
            .map_err(PersistError::sqlite(PersistStep::EnsureSchema))
    }

    fn append(&mut self, rows: &ScoreRows) -> Result<(), PersistError> {
        let tx = self
            .conn
            .transaction()
            .map_err(PersistError::sqlite(PersistStep::Begin))?;

        {
            let mut insert_team = tx
                .prepare(&insert_sql("teams", &TEAM_COLUMNS, |n| format!("?{n}")))
                .map_err(PersistError::sqlite(PersistStep::InsertTeams))?;
            for team in &rows.teams {
                let recorded_at = team
                    .recorded_at
                    .format(TIMESTAMP_FORMAT)
                    .map_err(PersistError::timestamp(PersistStep::InsertTeams))?;
                insert_team
                    .execute(params![
                        team.team_id,
                        team.name,
                        team.rank,
                        team.total_offense,
                        team.total_defense,
                        team.total_sla,
                        team.total_score,
                        team.image_path,
                        team.thumbnail_path,
                        team.tick,
                        recorded_at,
                    ])
                    .map_err(PersistError::sqlite(PersistStep::InsertTeams))?;
            }
        }

        {
            let mut insert_service = tx
                .prepare(&insert_sql("services", &SERVICE_COLUMNS, |n| format!("?{n}")))
                .map_err(PersistError::sqlite(PersistStep::InsertServices))?;
            for service in &rows.services {
                let recorded_at = service
                    .recorded_at
                    .format(TIMESTAMP_FORMAT)
                    .map_err(PersistError::timestamp(PersistStep::InsertServices))?;
                insert_service
                    .execute(params![
                        service.team_id,
                        service.service_index,
                        service.status,
                        service.status_description,
                        service.offense,
                        service.defense,
                        service.sla,
                        service.tick,
                        recorded_at,
                    ])
                    .map_err(PersistError::sqlite(PersistStep::InsertServices))?;
            }
        }

        tx.commit()
            .map_err(PersistError::sqlite(PersistStep::Commit))
    }
}
