//! Kea `run_script` hook: keeps switch routes for delegated prefixes in sync.
//!
//! Usage: `lease-routes <event>`, lease data in `LEASE6_*` / `LEASES6_*` /
//! `QUERY6_*` environment variables.

mod events;
mod handlers;
mod logging;

use lr_routes::{Config, RouteStore, SshExecutor, config::config_path};
use tracing::error;

use crate::events::{LeaseEnv, LeaseEvent};

/// Exit status for a missing or unknown event name.
const UNHANDLED_EXIT_CODE: i32 = 123;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    std::process::exit(run().await);
}

async fn run() -> i32 {
    let path = config_path();
    let config = match Config::load_from_file(&path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {e:#}");
            return 1;
        }
    };

    if let Err(e) = logging::init(&config.log_file) {
        eprintln!("Logging error: {e:#}");
        return 1;
    }

    let args: Vec<String> = std::env::args().collect();
    let event = match args.get(1) {
        Some(name) => match name.parse::<LeaseEvent>() {
            Ok(event) => event,
            Err(e) => {
                error!("Unhandled function call {:?}: {e}", args);
                return UNHANDLED_EXIT_CODE;
            }
        },
        None => {
            error!("Unhandled function call {:?}", ["No function specified"]);
            return UNHANDLED_EXIT_CODE;
        }
    };

    let env = LeaseEnv::from_process();
    let store = RouteStore::new(&config.routes_file);
    let executor = SshExecutor::from_config(&config);

    match handlers::dispatch(event, &env, &config, &store, &executor).await {
        Ok(code) => code,
        Err(e) => {
            error!("{} - {e:#}", event.tag());
            1
        }
    }
}
