mod pg;
mod sqlite;

pub use pg::PgStore;
pub use sqlite::SqliteStore;

use crate::error::PersistError;
use crate::schema::ScoreRows;

/// Column order shared by every team insert.
pub const TEAM_COLUMNS: [&str; 11] = [
    "team_id",
    "name",
    "rank",
    "total_offense",
    "total_defense",
    "total_sla",
    "total_score",
    "image_path",
    "thumbnail_path",
    "tick",
    "recorded_at",
];

/// Column order shared by every service insert.
pub const SERVICE_COLUMNS: [&str; 9] = [
    "team_id",
    "service_index",
    "status",
    "status_description",
    "offense",
    "defense",
    "sla",
    "tick",
    "recorded_at",
];

/// Append-only destination for scoreboard rows.
///
/// `append` is all-or-nothing: teams are inserted before services inside one
/// transaction, and a failure at any point leaves the store as it was.
pub trait ScoreStore {
    /// Creates `teams` and `services` when absent. Safe to call every run.
    fn ensure_schema(&mut self) -> Result<(), PersistError>;

    fn append(&mut self, rows: &ScoreRows) -> Result<(), PersistError>;
}

fn insert_sql(table: &str, columns: &[&str], placeholder: impl Fn(usize) -> String) -> String {
    let placeholders: Vec<String> = (1..=columns.len()).map(placeholder).collect();
    format!(
        "INSERT INTO {table} ({}) VALUES ({})",
        columns.join(", "),
        placeholders.join(", ")
    )
}
