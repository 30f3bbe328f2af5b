use anyhow::{bail, Result};
use chrono::Duration;
use sea_orm::{Database, DatabaseConnection};
use tracing::{debug, info};

use crate::schemas::AppState;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://muckr.db?mode=rwc";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";

/// Connect to the database and build the state shared by all handlers
pub async fn initialize_app_state_with_url(
    database_url: &str,
    token_expires_in_secs: i64,
) -> Result<AppState> {
    info!("Connecting to database: {}", database_url);
    let db = Database::connect(database_url).await?;

    build_app_state(db, token_expires_in_secs)
}

/// Build the handler state around an open connection
pub fn build_app_state(db: DatabaseConnection, token_expires_in_secs: i64) -> Result<AppState> {
    if token_expires_in_secs <= 0 {
        bail!("TOKEN_EXPIRES_IN must be a positive number of seconds, got {token_expires_in_secs}");
    }
    debug!("Issued tokens will expire after {} seconds", token_expires_in_secs);

    Ok(AppState {
        db,
        token_ttl: Duration::seconds(token_expires_in_secs),
    })
}
