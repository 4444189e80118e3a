//! Cache actor configuration.

use serde::{Deserialize, Serialize};

use stash_core::{Result, StashError};

const DEFAULT_NAME: &str = "stash";
const DEFAULT_MAILBOX_CAPACITY: usize = 1024;
const DEFAULT_INITIAL_CAPACITY: usize = 64;

/// Cache configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Name reported in logs
    pub name: String,
    /// Commands that may queue before senders wait for room
    pub mailbox_capacity: usize,
    /// Keys to pre-allocate in the table
    pub initial_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.into(),
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
        }
    }
}

impl CacheConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the name used in logs.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the mailbox capacity.
    pub fn mailbox_capacity(mut self, capacity: usize) -> Self {
        self.mailbox_capacity = capacity;
        self
    }

    /// Sets the number of keys to pre-allocate.
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Checks that the configuration can start an actor.
    pub fn validate(&self) -> Result<()> {
        if self.mailbox_capacity == 0 {
            return Err(StashError::ConfigError(
                "mailbox_capacity must be greater than zero".into(),
            ));
        }
        if self.name.trim().is_empty() {
            return Err(StashError::ConfigError("name must not be empty".into()));
        }
        Ok(())
    }

    /// Loads configuration from the environment (and `.env`, if present).
    ///
    /// Reads `STASH_NAME`, `STASH_MAILBOX_CAPACITY` and
    /// `STASH_INITIAL_CAPACITY`; unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(name) = lookup("STASH_NAME") {
            config.name = name;
        }
        if let Some(raw) = lookup("STASH_MAILBOX_CAPACITY") {
            config.mailbox_capacity = parse_usize("STASH_MAILBOX_CAPACITY", &raw)?;
        }
        if let Some(raw) = lookup("STASH_INITIAL_CAPACITY") {
            config.initial_capacity = parse_usize("STASH_INITIAL_CAPACITY", &raw)?;
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_usize(var: &str, raw: &str) -> Result<usize> {
    raw.trim()
        .parse()
        .map_err(|e| StashError::ConfigError(format!("{var}={raw:?}: {e}")))
}
