use roster::{AppState, Migrator, RosterConfig, init_logging, router};
use sea_orm::Database;
use sea_orm_migration::MigratorTrait;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = RosterConfig::load()?;
    init_logging("info");

    let db = Database::connect(&config.database_url).await?;
    Migrator::up(&db, None).await?;

    let app = router(AppState::new(db, config.per_page));
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    tracing::info!(address = %config.bind_address, "Roster listening");
    axum::serve(listener, app).await?;
    Ok(())
}
