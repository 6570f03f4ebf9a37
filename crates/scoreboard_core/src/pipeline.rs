use time::{OffsetDateTime, PrimitiveDateTime};
use tracing::{debug, info};

use crate::config::Config;
use crate::db::{PgStore, ScoreStore};
use crate::error::{EtlError, PersistError};
use crate::fetch::fetch_snapshot;
use crate::schema::{ScoreRows, Snapshot};
use crate::transform::transform;

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub tick: i32,
    pub teams: usize,
    pub services: usize,
    pub recorded_at: PrimitiveDateTime,
}

/// The capture time shared by every row of one run, in UTC.
pub fn capture_timestamp() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

/// Fetch, transform and append one snapshot into PostgreSQL.
pub fn run(config: &Config) -> Result<RunSummary, EtlError> {
    run_with(&config.feed.url, || PgStore::connect(&config.database))
}

/// Same as [`run`] for any store. The store is only opened once the snapshot
/// has been fetched and transformed, so feed or data errors never touch it.
pub fn run_with<S, F>(feed_url: &str, open_store: F) -> Result<RunSummary, EtlError>
where
    S: ScoreStore,
    F: FnOnce() -> Result<S, PersistError>,
{
    let snapshot = fetch_snapshot(feed_url)?;
    let rows = transform_logged(&snapshot, capture_timestamp())?;
    let mut store = open_store()?;
    Ok(persist(&mut store, &rows)?)
}

/// Transform and append an already-fetched snapshot.
pub fn ingest<S: ScoreStore>(
    store: &mut S,
    snapshot: &Snapshot,
    recorded_at: PrimitiveDateTime,
) -> Result<RunSummary, EtlError> {
    let rows = transform_logged(snapshot, recorded_at)?;
    Ok(persist(store, &rows)?)
}

pub fn persist<S: ScoreStore>(store: &mut S, rows: &ScoreRows) -> Result<RunSummary, PersistError> {
    store.ensure_schema()?;
    debug!("schema ensured");

    store.append(rows)?;
    let summary = RunSummary {
        tick: rows.tick,
        teams: rows.teams.len(),
        services: rows.services.len(),
        recorded_at: rows.recorded_at,
    };
    info!(
        tick = summary.tick,
        teams = summary.teams,
        services = summary.services,
        "appended scoreboard rows"
    );
    Ok(summary)
}

fn transform_logged(
    snapshot: &Snapshot,
    recorded_at: PrimitiveDateTime,
) -> Result<ScoreRows, EtlError> {
    let rows = transform(snapshot, recorded_at)?;
    info!(
        tick = rows.tick,
        teams = rows.teams.len(),
        services = rows.services.len(),
        "transformed snapshot"
    );
    Ok(rows)
}
