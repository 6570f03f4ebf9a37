//! Periodic ETL for an attack/defense CTF scoreboard feed: fetch one JSON
//! snapshot, reshape it into `teams` and `services` rows, append them to a
//! relational store.

pub mod config;
pub mod db;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod schema;
pub mod transform;

pub use error::EtlError;

#[cfg(test)]
mod test_support;
