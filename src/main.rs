//! Leave ledger HTTP server.
//!
//! Environment:
//! - `LEAVE_LEDGER_CONFIG`: configuration directory (default `./config/standard`)
//! - `LEAVE_LEDGER_ADDR`: listen address (default `127.0.0.1:3000`)
//! - `RUST_LOG`: log filter, overriding the configured level

use std::env;
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

use leave_ledger::api::{AppState, create_router};
use leave_ledger::config::ConfigLoader;
use leave_ledger::ledger::{InMemoryEmployeeDirectory, LeaveLedger, LedgerStores, SystemClock};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_DIR: &str = "./config/standard";
const DEFAULT_ADDR: &str = "127.0.0.1:3000";

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config_dir = env::var("LEAVE_LEDGER_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_DIR.to_owned());
    let config = ConfigLoader::load(&config_dir)?;
    init_tracing(&config.settings().log_level);

    let addr: SocketAddr = env::var("LEAVE_LEDGER_ADDR")
        .unwrap_or_else(|_| DEFAULT_ADDR.to_owned())
        .parse()?;

    let employees = InMemoryEmployeeDirectory::with_employees(config.employees().to_vec());
    let ledger = LeaveLedger::new(
        config.registry(),
        LedgerStores::in_memory(employees),
        Arc::new(SystemClock),
        config.settings().clone(),
    );
    info!(
        config_dir = %config_dir,
        leave_types = config.leave_types().len(),
        employees = config.employees().len(),
        "Leave ledger configured"
    );

    let router = create_router(AppState::new(ledger));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "Leave ledger listening");
    axum::serve(listener, router).await?;

    Ok(())
}
