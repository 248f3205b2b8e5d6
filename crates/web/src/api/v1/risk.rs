use axum::{
    extract::{OriginalUri, State},
    http::Method,
    routing::{get, on, post},
    Json, Router,
};
use model::risk::{
    ChatPrompt, ChatReply, LocationQuery, LocationReport, PredictionReport,
    PredictionRequest,
};

use crate::{
    common::{
        route_not_found, schema, schema_no_example, RouteErrorResponse,
        RouteResult, METHOD_FILTER_ALL,
    },
    WebState,
};

pub(crate) fn routes(state: WebState) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/predict/schema", get(schema::<PredictionRequest>))
        .route("/chat", post(chat))
        .route("/chat/schema", get(schema_no_example::<ChatPrompt>))
        .route("/location-info", post(location_info))
        .route(
            "/location-info/schema",
            get(schema_no_example::<LocationQuery>),
        )
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

async fn predict(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { risk_client, .. }): State<WebState>,
    Json(request): Json<PredictionRequest>,
) -> RouteResult<Json<PredictionReport>> {
    risk_client
        .predict(&request)
        .await
        .map(Json)
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&Method::POST)
                .with_uri(original_uri.path())
        })
}

async fn chat(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { risk_client, .. }): State<WebState>,
    Json(prompt): Json<ChatPrompt>,
) -> RouteResult<Json<ChatReply>> {
    risk_client
        .chat(&prompt.prompt)
        .await
        .map(Json)
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&Method::POST)
                .with_uri(original_uri.path())
        })
}

async fn location_info(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { risk_client, .. }): State<WebState>,
    Json(query): Json<LocationQuery>,
) -> RouteResult<Json<LocationReport>> {
    risk_client
        .location_info(&query.location)
        .await
        .map(Json)
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&Method::POST)
                .with_uri(original_uri.path())
        })
}
