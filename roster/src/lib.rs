//! User roster administration.
//!
//! The core is [`filtering`]: a request's parameters are checked against an
//! ordered [`FilterRuleSet`], then folded into a query by [`FilterEngine`],
//! one predicate per rule that was present. [`users`] declares the roster's
//! rules and the operations built on them; [`routes`] exposes those over HTTP.
//!
//! ```rust,no_run
//! use roster::{FilterEngine, FilterRequest, users::{USER_FILTERS, query}};
//!
//! # async fn listing(db: &sea_orm::DatabaseConnection) -> Result<(), roster::ApiError> {
//! let request = FilterRequest::from_query("search=ana&skills[]=2&order=email-desc");
//! let filters = USER_FILTERS.validate(&request, db).await?;
//! let select = FilterEngine::apply(query::scoped(query::TrashScope::Active), &filters, &USER_FILTERS);
//! # let _ = select;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod entities;
pub mod errors;
pub mod filtering;
pub mod migration;
pub mod routes;
pub mod users;
pub mod validation;

pub use config::{ConfigError, RosterConfig};
pub use errors::ApiError;
pub use filtering::{
    FilterEngine, FilterRequest, FilterRuleSet, FilterValue, ValidatedFilters,
};
pub use migration::Migrator;
pub use routes::{AppState, router};
pub use validation::{ValidationError, ValidationErrors};

/// Console logging, filtered by `RUST_LOG` when set
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("roster={level},tower_http=debug")));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}
