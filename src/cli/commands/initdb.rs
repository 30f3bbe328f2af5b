use anyhow::Result;
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use tracing::{debug, error, info, trace};

pub async fn init_database(database_url: &str) -> Result<()> {
    trace!("Entering init_database function");
    info!("Initializing database");

    connect_and_migrate(database_url).await?;

    info!("Database initialization completed successfully!");
    Ok(())
}

/// Connect to `database_url` and apply every pending migration.
pub async fn connect_and_migrate(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Database URL: {}", database_url);

    let db = Database::connect(database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to database '{}': {}", database_url, e))?;
    info!("Successfully connected to database");

    info!("Running database migrations");
    Migrator::up(&db, None)
        .await
        .inspect_err(|e| error!("Failed to run database migrations: {}", e))?;
    info!("Database migrations completed successfully");

    Ok(db)
}
