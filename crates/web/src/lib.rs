pub use crate::common::RouteResult;

use std::sync::Arc;

use axum::Router;
use database::PgShelterStore;
use registry::{controller::ShelterRegistry, geocode::ReverseGeocode};
use risk_api::RiskApiClient;
use tokio::{net::TcpListener, sync::Mutex};

pub mod api;
pub mod common;

#[derive(Clone)]
pub struct WebState {
    /// The single registry instance. Handlers take the lock per operation
    /// and release it while awaiting the geocoder, so a later click can
    /// supersede one whose geocode is still in flight.
    pub registry: Arc<Mutex<ShelterRegistry<PgShelterStore>>>,
    pub geocoder: Arc<dyn ReverseGeocode>,
    pub risk_client: Arc<RiskApiClient>,
}

pub async fn start_web_server(
    state: WebState,
    bind_addr: &str,
) -> std::io::Result<()> {
    let routes = Router::new().nest_service("/api", api::routes(state));

    let listener = TcpListener::bind(bind_addr).await?;
    axum::serve(listener, routes.into_make_service()).await?;

    Ok(())
}
