//! Backend entry-point: loads settings, seeds dev data and serves the API.

use std::io;
use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};
use ortho_config::OrthoConfig;
use tracing::info;

use tour_booking::domain::ports::{DocumentStore, PasswordHasher};
use tour_booking::inbound::http::health::HealthState;
use tour_booking::inbound::http::state::HttpStatePorts;
use tour_booking::outbound::persistence::InMemoryDocumentStore;
use tour_booking::outbound::security::Argon2PasswordHasher;
use tour_booking::seed_data::{DevDataSettings, seed_dev_data_on_startup};
use tour_booking::server::{
    ServerConfig, ServerSettings, create_server, init_tracing, key_fingerprint, load_session_key,
    run_until_shutdown,
};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> io::Result<()> {
    let settings = ServerSettings::load().map_err(|e| io::Error::other(e.to_string()))?;
    let environment = settings.environment().map_err(io::Error::other)?;
    init_tracing(environment);

    let key = load_session_key(&settings.session_key_file(), environment)
        .map_err(io::Error::other)?;
    info!(fingerprint = %key_fingerprint(&key), "session key loaded");

    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let store: Arc<dyn DocumentStore> =
        Arc::new(InMemoryDocumentStore::with_default_schemas(Arc::clone(&clock)));
    let hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2PasswordHasher::new());

    // Only the program name is forwarded; the command line belongs to ServerSettings.
    let dev_data = DevDataSettings::load_from_iter(std::env::args_os().take(1))
        .map_err(|e| io::Error::other(e.to_string()))?;
    seed_dev_data_on_startup(&dev_data, Arc::clone(&store), hasher.as_ref())
        .await
        .map_err(io::Error::other)?;

    let health_state = web::Data::new(HealthState::with_clock(
        environment.as_str(),
        Arc::clone(&clock),
    ));
    let config = ServerConfig::from_settings(&settings, key).map_err(io::Error::other)?;
    let server = create_server(
        health_state.clone(),
        config,
        HttpStatePorts {
            store,
            hasher,
            clock,
        },
    )?;
    run_until_shutdown(server, health_state).await
}
