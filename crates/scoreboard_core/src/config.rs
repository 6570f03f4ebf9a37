use std::env;
use std::fmt;

use crate::error::ConfigError;

pub const DB_HOST: &str = "DB_HOST";
pub const DB_PORT: &str = "DB_PORT";
pub const DB_NAME: &str = "DB_NAME";
pub const DB_USER: &str = "DB_USER";
pub const DB_PASSWORD: &str = "DB_PASSWORD";
pub const JSON_LINK: &str = "JSON_LINK";

/// Everything one run needs, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub feed: FeedConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    pub url: String,
}

#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source. All
    /// missing variables are reported together.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut vars = Required::new(&lookup);
        let url = vars.get(JSON_LINK);
        let host = vars.get(DB_HOST);
        let port = vars.get(DB_PORT);
        let name = vars.get(DB_NAME);
        let user = vars.get(DB_USER);
        let password = vars.get(DB_PASSWORD);
        vars.finish()?;

        Ok(Self {
            feed: FeedConfig { url },
            database: DatabaseConfig {
                host,
                port: parse_port(DB_PORT, &port)?,
                name,
                user,
                password,
            },
        })
    }
}

impl FeedConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut vars = Required::new(&lookup);
        let url = vars.get(JSON_LINK);
        vars.finish()?;
        Ok(Self { url })
    }
}

impl DatabaseConfig {
    /// Connection parameters set field by field, so no URL escaping is
    /// needed for the password.
    pub fn pg_config(&self) -> postgres::Config {
        let mut config = postgres::Config::new();
        config
            .host(&self.host)
            .port(self.port)
            .dbname(&self.name)
            .user(&self.user)
            .password(&self.password);
        config
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

struct Required<'a, F> {
    lookup: &'a F,
    missing: Vec<&'static str>,
}

impl<'a, F> Required<'a, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn new(lookup: &'a F) -> Self {
        Self {
            lookup,
            missing: Vec::new(),
        }
    }

    // Empty counts as unset.
    fn get(&mut self, name: &'static str) -> String {
        match (self.lookup)(name) {
            Some(value) if !value.trim().is_empty() => value,
            _ => {
                self.missing.push(name);
                String::new()
            }
        }
    }

    fn finish(self) -> Result<(), ConfigError> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Missing(self.missing))
        }
    }
}

fn parse_port(name: &'static str, value: &str) -> Result<u16, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidPort {
            name,
            value: value.to_string(),
        })
}
