use std::collections::HashMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize, Serializer};
use time::PrimitiveDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

pub const DEFAULT_IMAGE_PATH: &str = "/uploads/team-images/default.png";
pub const DEFAULT_THUMBNAIL_PATH: &str = "/uploads/team-images/thumbnails/default.png";

/// Text form of `recorded_at` used for JSON output and the SQLite sink.
pub const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6]");

/// One scoreboard payload as served by the feed.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct Snapshot {
    pub tick: i32,
    pub teams: Vec<TeamEntry>,
    #[serde(rename = "status-descriptions")]
    pub status_descriptions: HashMap<String, String>, // status code (as text) -> label
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TeamEntry {
    pub id: i32,
    pub name: String,
    pub rank: i32,
    pub offense: f64,
    pub defense: f64,
    pub sla: f64,
    pub total: f64,
    pub image: Option<String>,     // absent or null -> DEFAULT_IMAGE_PATH
    pub thumbnail: Option<String>, // absent or null -> DEFAULT_THUMBNAIL_PATH
    pub services: Vec<ServiceEntry>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ServiceEntry {
    pub status: i32,
    pub offense: f64,
    pub defense: f64,
    pub sla: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct TeamRow {
    pub team_id: i32,
    pub name: String,
    pub rank: i32,
    pub total_offense: f64,
    pub total_defense: f64,
    pub total_sla: f64,
    pub total_score: f64,
    pub image_path: String,
    pub thumbnail_path: String,
    pub tick: i32,
    #[serde(serialize_with = "serialize_timestamp")]
    #[schemars(with = "String")]
    pub recorded_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct ServiceRow {
    pub team_id: i32,
    pub service_index: i32, // position in the team's service list, not a durable id
    pub status: i32,
    pub status_description: String,
    pub offense: f64,
    pub defense: f64,
    pub sla: f64,
    pub tick: i32,
    #[serde(serialize_with = "serialize_timestamp")]
    #[schemars(with = "String")]
    pub recorded_at: PrimitiveDateTime,
}

/// Both row-sets produced from one snapshot. Every row shares `tick` and
/// `recorded_at`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRows {
    pub tick: i32,
    #[serde(serialize_with = "serialize_timestamp")]
    pub recorded_at: PrimitiveDateTime,
    pub teams: Vec<TeamRow>,
    pub services: Vec<ServiceRow>,
}

fn serialize_timestamp<S>(value: &PrimitiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let text = value
        .format(TIMESTAMP_FORMAT)
        .map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&text)
}
