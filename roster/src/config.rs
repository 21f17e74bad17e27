//! Server configuration.
//!
//! Values come from built-in defaults overridden by `ROSTER_*` environment
//! variables. A `.env` file in the working directory is read first when present.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `ROSTER_DATABASE_URL` | sqlite::memory: | Database connection string |
//! | `ROSTER_BIND_ADDRESS` | 127.0.0.1:3000 | Address the server listens on |
//! | `ROSTER_PER_PAGE` | 15 | Users per listing page |

use config::{Config, Environment};
use serde::Deserialize;

use crate::filtering::DEFAULT_PER_PAGE;

const MAX_PER_PAGE: u64 = 500;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RosterConfig {
    pub database_url: String,
    pub bind_address: String,
    pub per_page: u64,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            bind_address: "127.0.0.1:3000".to_string(),
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl RosterConfig {
    /// Load `.env`, then defaults overridden by the environment, then validate
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_environment(Environment::with_prefix("ROSTER"))
    }

    fn from_environment(environment: Environment) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config: Self = Config::builder()
            .set_default("database_url", defaults.database_url)?
            .set_default("bind_address", defaults.bind_address)?
            .set_default("per_page", defaults.per_page)?
            .add_source(environment.try_parsing(true))
            .build()?
            .try_deserialize()?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// Every problem at once, not just the first
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.database_url.trim().is_empty() {
            errors.push("Database URL cannot be empty".to_string());
        }
        if self.bind_address.trim().is_empty() {
            errors.push("Bind address cannot be empty".to_string());
        }
        if self.per_page == 0 {
            errors.push("Page size cannot be 0".to_string());
        }
        if self.per_page > MAX_PER_PAGE {
            errors.push(format!("Page size cannot exceed {MAX_PER_PAGE}"));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// In-memory database, default page size
    #[must_use]
    pub fn for_testing() -> Self {
        Self::default()
    }
}
