use postgres::{Client, NoTls};
use tracing::debug;

use super::{SERVICE_COLUMNS, ScoreStore, TEAM_COLUMNS, insert_sql};
use crate::config::DatabaseConfig;
use crate::error::{PersistError, PersistStep};
use crate::schema::ScoreRows;

// `team_id` stays UNIQUE on teams: it is the target of the services foreign key.
pub(crate) const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS teams (
  id SERIAL PRIMARY KEY,
  team_id INTEGER NOT NULL UNIQUE,
  name VARCHAR(255) NOT NULL,
  rank INTEGER NOT NULL,
  total_offense FLOAT NOT NULL,
  total_defense FLOAT NOT NULL,
  total_sla FLOAT NOT NULL,
  total_score FLOAT NOT NULL,
  image_path VARCHAR(255) NOT NULL,
  thumbnail_path VARCHAR(255) NOT NULL,
  tick INTEGER NOT NULL,
  recorded_at TIMESTAMP NOT NULL
);

CREATE TABLE IF NOT EXISTS services (
  id SERIAL PRIMARY KEY,
  team_id INTEGER NOT NULL,
  service_index INTEGER NOT NULL,
  status INTEGER NOT NULL,
  status_description VARCHAR(50) NOT NULL,
  offense FLOAT NOT NULL,
  defense FLOAT NOT NULL,
  sla FLOAT NOT NULL,
  tick INTEGER NOT NULL,
  recorded_at TIMESTAMP NOT NULL,
  FOREIGN KEY (team_id) REFERENCES teams(team_id)
);
"#;

/// PostgreSQL sink. The connection lives as long as the store and is closed
/// on drop.
pub struct PgStore {
    client: Client,
}

impl PgStore {
    pub fn connect(config: &DatabaseConfig) -> Result<Self, PersistError> {
        debug!(host = %config.host, port = config.port, db = %config.name, "connecting to postgres");
        let client = config
            .pg_config()
            .connect(NoTls)
            .map_err(PersistError::postgres(PersistStep::Connect))?;
        Ok(Self { client })
    }
}

impl ScoreStore for PgStore {
    fn ensure_schema(&mut self) -> Result<(), PersistError> {
        self.client
            .batch_execute(SCHEMA)
            .map_err(PersistError::postgres(PersistStep::EnsureSchema))
    }

    fn append(&mut self, rows: &ScoreRows) -> Result<(), PersistError> {
        // Dropping `tx` on any early return rolls the whole append back.
        let mut tx = self
            .client
            .transaction()
            .map_err(PersistError::postgres(PersistStep::Begin))?;

        let insert_team = tx
            .prepare(&insert_sql("teams", &TEAM_COLUMNS, |n| format!("${n}")))
            .map_err(PersistError::postgres(PersistStep::InsertTeams))?;
        for team in &rows.teams {
            tx.execute(
                &insert_team,
                &[
                    &team.team_id,
                    &team.name,
                    &team.rank,
                    &team.total_offense,
                    &team.total_defense,
                    &team.total_sla,
                    &team.total_score,
                    &team.image_path,
                    &team.thumbnail_path,
                    &team.tick,
                    &team.recorded_at,
                ],
            )
            .map_err(PersistError::postgres(PersistStep::InsertTeams))?;
        }

        let insert_service = tx
            .prepare(&insert_sql("services", &SERVICE_COLUMNS, |n| format!("${n}")))
            .map_err(PersistError::postgres(PersistStep::InsertServices))?;
        for service in &rows.services {
            tx.execute(
                &insert_service,
                &[
                    &service.team_id,
                    &service.service_index,
                    &service.status,
                    &service.status_description,
                    &service.offense,
                    &service.defense,
                    &service.sla,
                    &service.tick,
                    &service.recorded_at,
                ],
            )
            .map_err(PersistError::postgres(PersistStep::InsertServices))?;
        }

        tx.commit()
            .map_err(PersistError::postgres(PersistStep::Commit))
    }
}
