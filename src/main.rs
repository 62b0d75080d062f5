use std::time::Duration;

use crate::{
    configuration::Configuration, configuration_handler::ConfigurationHandler,
    database_interface::DatabaseInterface, http::create_app, local_store::LocalStore,
    slot_service::Scheduler,
};
use tokio::time::sleep;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod backend;
mod block_generator;
mod configuration;
mod configuration_handler;
mod database_interface;
mod error;
mod http;
mod id_allocator;
mod local_store;
mod schema;
mod slot_lifecycle;
mod slot_service;
#[cfg(test)]
mod testutils;
mod types;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("###################");
    println!("# Interview Slots #");
    println!("###################");

    let configuration = ConfigurationHandler::parse_arguments();

    let address = format!("0.0.0.0:{}", configuration.port());
    let listener = match tokio::net::TcpListener::bind(&address).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(?err, "Failed to bind {address}");
            std::process::exit(1);
        }
    };
    info!("Accessible at {address}");

    let policy = configuration.block_policy();
    let app = if let Some(database_url) = configuration.database_url() {
        let backend = loop {
            match DatabaseInterface::new(&database_url, configuration.database_pool_size()) {
                Ok(backend) => {
                    info!("Successfully connected to database");
                    break backend;
                }
                Err(err) => {
                    error!(?err, "Failed to establish database connection. Retry in 1 sec. You may want to restart it with database disabled (impersistent slots).");
                    sleep(Duration::from_secs(1)).await;
                }
            }
        };
        create_app(Scheduler::new(backend, policy))
    } else {
        warn!("No DATABASE_URL configured, slots are kept in memory only");
        create_app(Scheduler::new(LocalStore::default(), policy))
    };

    if let Err(err) = axum::serve(listener, app).await {
        error!(?err, "Server stopped");
        std::process::exit(1);
    }
}
