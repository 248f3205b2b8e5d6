use std::{env, sync::Arc};

use database::{DatabaseConnectionInfo, PgShelterStore};
use log::{error, info};
use nominatim::NominatimClient;
use registry::controller::ShelterRegistry;
use risk_api::RiskApiClient;
use tokio::sync::Mutex;
use web::{start_web_server, WebState};

#[tokio::main]
async fn main() {
    env_logger::init();

    // database
    let database_connection_info = DatabaseConnectionInfo::from_env()
        .expect("expected database connection info in env.");
    let store = PgShelterStore::connect(database_connection_info)
        .await
        .expect("could not connect to database.");

    // registry
    let mut shelter_registry = ShelterRegistry::new(store);
    match shelter_registry.load().await {
        Ok(()) => info!("loaded {} shelters", shelter_registry.shelters().len()),
        // Start anyway; operators can retry via POST /api/v1/shelters/reload.
        Err(why) => error!("initial shelter load failed: {}", why),
    }

    // web server
    let bind_addr =
        env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_owned());
    let state = WebState {
        registry: Arc::new(Mutex::new(shelter_registry)),
        geocoder: Arc::new(NominatimClient::from_env()),
        risk_client: Arc::new(RiskApiClient::from_env()),
    };

    let _ = start_web_server(state, &bind_addr).await;
}
