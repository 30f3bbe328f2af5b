use anyhow::Result;
use tracing::{info, trace};

use super::initdb::connect_and_migrate;
use super::serve::run_server;
use crate::cli::ServerArgs;
use crate::config::build_app_state;

pub async fn migrate_and_serve(args: &ServerArgs) -> Result<()> {
    trace!("Entering migrate_and_serve function");
    info!("Applying database migrations and starting server");

    // Reuse the migrated connection; a fresh one would lose in-memory databases
    let db = connect_and_migrate(&args.database_url).await?;
    let state = build_app_state(db, args.token_expires_in)?;

    run_server(state, &args.bind_address).await
}
