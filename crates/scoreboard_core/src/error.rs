use std::fmt;

use thiserror::Error;

/// Every way a single ingestion run can fail. Nothing is retried; the caller
/// reports the error and exits non-zero.
#[derive(Debug, Error)]
pub enum EtlError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Transform(#[from] TransformError),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
    #[error("{name} is not a valid port: {value:?}")]
    InvalidPort { name: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("GET {url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("GET {url} failed")]
    Transport {
        url: String,
        #[source]
        source: Box<ureq::Transport>,
    },
    #[error("reading response body from {url}")]
    Body {
        url: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("malformed snapshot")]
    Malformed(#[from] serde_json::Error),
    #[error(
        "team {team_id} service {service_index}: status {status} has no entry in status-descriptions"
    )]
    UnknownStatus {
        team_id: i32,
        service_index: usize,
        status: i32,
    },
    #[error("team {team_id} lists more services than an integer service_index can hold")]
    IndexOverflow { team_id: i32 },
}

/// The persistence stage that was running when the store failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistStep {
    Connect,
    EnsureSchema,
    Begin,
    InsertTeams,
    InsertServices,
    Commit,
}

impl fmt::Display for PersistStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            PersistStep::Connect => "connect",
            PersistStep::EnsureSchema => "ensure schema",
            PersistStep::Begin => "begin transaction",
            PersistStep::InsertTeams => "insert teams",
            PersistStep::InsertServices => "insert services",
            PersistStep::Commit => "commit",
        };
        write!(f, "{value}")
    }
}

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("postgres: {step} failed")]
    Postgres {
        step: PersistStep,
        #[source]
        source: postgres::Error,
    },
    #[error("sqlite: {step} failed")]
    Sqlite {
        step: PersistStep,
        #[source]
        source: rusqlite::Error,
    },
    #[error("{step}: cannot encode recorded_at")]
    Timestamp {
        step: PersistStep,
        #[source]
        source: time::error::Format,
    },
}

impl PersistError {
    pub fn postgres(step: PersistStep) -> impl FnOnce(postgres::Error) -> Self {
        move |source| Self::Postgres { step, source }
    }

    pub fn sqlite(step: PersistStep) -> impl FnOnce(rusqlite::Error) -> Self {
        move |source| Self::Sqlite { step, source }
    }

    pub fn timestamp(step: PersistStep) -> impl FnOnce(time::error::Format) -> Self {
        move |source| Self::Timestamp { step, source }
    }

    pub fn step(&self) -> PersistStep {
        match self {
            Self::Postgres { step, .. } | Self::Sqlite { step, .. } | Self::Timestamp { step, .. } => {
                *step
            }
        }
    }
}
