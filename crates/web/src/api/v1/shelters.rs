use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::Method,
    routing::{delete, get, on, patch, post, put},
    Json, Router,
};
use model::{
    shelter::{Coordinates, Shelter, ShelterDraft, ShelterPatch},
    WithDistance, WithId,
};
use registry::controller::Mode;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::id::Id;

use crate::{
    common::{
        route_not_found, schema, RouteErrorResponse, RouteResult, VecResponse,
        METHOD_FILTER_ALL,
    },
    WebState,
};

const DEFAULT_NEARBY_RADIUS_KM: f64 = 50.0;

pub(crate) fn routes(state: WebState) -> Router {
    Router::new()
        .route("/schema", get(schema::<Shelter>))
        .route("/", get(get_shelters))
        .route("/reload", post(reload))
        .route("/nearby", get(nearby))
        .route(
            "/placement",
            post(begin_placement)
                .patch(update_draft)
                .delete(cancel_placement),
        )
        .route("/placement/location", put(pick_location))
        .route("/placement/confirm", post(confirm_placement))
        .route("/:id/active", patch(toggle_active))
        .route("/:id", delete(remove))
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

/// Draft and mode after a placement-session operation.
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct PlacementStatus {
    mode: Mode,
    draft: ShelterDraft,
    /// Whether a geocode result was applied, or discarded as superseded.
    #[serde(skip_serializing_if = "Option::is_none")]
    geocode_applied: Option<bool>,
}

async fn get_shelters(
    State(WebState { registry, .. }): State<WebState>,
) -> Json<VecResponse<WithId<Shelter>>> {
    let registry = registry.lock().await;
    VecResponse::non_paginated(registry.shelters().to_vec()).json()
}

async fn reload(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { registry, .. }): State<WebState>,
) -> RouteResult<Json<VecResponse<WithId<Shelter>>>> {
    let mut registry = registry.lock().await;
    registry.load().await.map_err(|why| {
        RouteErrorResponse::from(why)
            .with_method(&Method::POST)
            .with_uri(original_uri.path())
    })?;
    Ok(VecResponse::non_paginated(registry.shelters().to_vec()).json())
}

#[derive(Deserialize)]
struct NearbyQuery {
    latitude: f64,
    longitude: f64,
    radius: Option<f64>,
}

async fn nearby(
    State(WebState { registry, .. }): State<WebState>,
    Query(params): Query<NearbyQuery>,
) -> RouteResult<Json<VecResponse<WithDistance<WithId<Shelter>>>>> {
    let coordinates = Coordinates {
        latitude: params.latitude,
        longitude: params.longitude,
    };
    check_range(&coordinates)?;
    let radius = params.radius.unwrap_or(DEFAULT_NEARBY_RADIUS_KM);
    let registry = registry.lock().await;
    let found = registry.nearby(coordinates.latitude, coordinates.longitude, radius);
    Ok(VecResponse::non_paginated(found).json())
}

async fn begin_placement(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { registry, .. }): State<WebState>,
) -> RouteResult<Json<PlacementStatus>> {
    let mut registry = registry.lock().await;
    registry.begin_placement().map_err(|why| {
        RouteErrorResponse::from(why)
            .with_method(&Method::POST)
            .with_uri(original_uri.path())
    })?;
    Ok(Json(placement_status(&registry, None)))
}

/// The map click. The registry lock is released while the reverse geocode
/// is in flight, so another click arriving meanwhile can supersede this
/// one; the stale result is then discarded by the registry.
async fn pick_location(
    OriginalUri(original_uri): OriginalUri,
    State(WebState {
        registry, geocoder, ..
    }): State<WebState>,
    Json(coordinates): Json<Coordinates>,
) -> RouteResult<Json<PlacementStatus>> {
    check_range(&coordinates)?;

    let ticket = {
        let mut registry = registry.lock().await;
        registry.on_map_click(coordinates).map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&Method::PUT)
                .with_uri(original_uri.path())
        })?
    };

    let region = geocoder
        .reverse(coordinates.latitude, coordinates.longitude)
        .await;

    let mut registry = registry.lock().await;
    let applied = registry.apply_geocode(&ticket, region);
    Ok(Json(placement_status(&registry, Some(applied))))
}

async fn update_draft(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { registry, .. }): State<WebState>,
    Json(field): Json<ShelterPatch>,
) -> RouteResult<Json<PlacementStatus>> {
    let mut registry = registry.lock().await;
    registry.update_draft(field).map_err(|why| {
        RouteErrorResponse::from(why)
            .with_method(&Method::PATCH)
            .with_uri(original_uri.path())
    })?;
    Ok(Json(placement_status(&registry, None)))
}

async fn confirm_placement(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { registry, .. }): State<WebState>,
) -> RouteResult<Json<WithId<Shelter>>> {
    let mut registry = registry.lock().await;
    let id = registry.confirm_add().await.map_err(|why| {
        RouteErrorResponse::from(why)
            .with_method(&Method::POST)
            .with_uri(original_uri.path())
    })?;
    let added = registry
        .shelters()
        .iter()
        .find(|shelter| shelter.id == id)
        .cloned()
        .ok_or_else(|| {
            RouteErrorResponse::new(axum::http::StatusCode::INTERNAL_SERVER_ERROR)
                .with_default_message()
        })?;
    Ok(Json(added))
}

async fn cancel_placement(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { registry, .. }): State<WebState>,
) -> RouteResult<Json<PlacementStatus>> {
    let mut registry = registry.lock().await;
    registry.cancel_placement().map_err(|why| {
        RouteErrorResponse::from(why)
            .with_method(&Method::DELETE)
            .with_uri(original_uri.path())
    })?;
    Ok(Json(placement_status(&registry, None)))
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ToggleResponse {
    id: Id<Shelter>,
    is_active: bool,
}

async fn toggle_active(
    OriginalUri(original_uri): OriginalUri,
    Path(id): Path<String>,
    State(WebState { registry, .. }): State<WebState>,
) -> RouteResult<Json<ToggleResponse>> {
    let id: Id<Shelter> = Id::new(id);
    let mut registry = registry.lock().await;
    let is_active = registry.toggle_active(&id).await.map_err(|why| {
        RouteErrorResponse::from(why)
            .with_method(&Method::PATCH)
            .with_uri(original_uri.path())
    })?;
    Ok(Json(ToggleResponse { id, is_active }))
}

/// Deletion is assumed to be confirmed by the operator in the UI before
/// this endpoint is hit.
async fn remove(
    OriginalUri(original_uri): OriginalUri,
    Path(id): Path<String>,
    State(WebState { registry, .. }): State<WebState>,
) -> RouteResult<Json<WithId<Shelter>>> {
    let id: Id<Shelter> = Id::new(id);
    let mut registry = registry.lock().await;
    let removed = registry.remove(&id).await.map_err(|why| {
        RouteErrorResponse::from(why)
            .with_method(&Method::DELETE)
            .with_uri(original_uri.path())
    })?;
    Ok(Json(removed))
}

fn placement_status<S>(
    registry: &registry::controller::ShelterRegistry<S>,
    geocode_applied: Option<bool>,
) -> PlacementStatus
where
    S: registry::store::ShelterStore,
{
    PlacementStatus {
        mode: registry.mode(),
        draft: registry.draft().clone(),
        geocode_applied,
    }
}

fn check_range(coordinates: &Coordinates) -> Result<(), RouteErrorResponse> {
    if coordinates.in_range() {
        Ok(())
    } else {
        Err(RouteErrorResponse::bad_request(format!(
            "({}, {}) is not a valid coordinate pair",
            coordinates.latitude, coordinates.longitude
        )))
    }
}
