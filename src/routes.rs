use crate::auth::basic_auth;
use crate::config::AdminCredentials;
use crate::error::ServiceError;
use crate::links::LinkService;
use crate::model::{LinkRow, LinkStats, ShortenRequest, ShortenResponse};
use crate::utils::{get_header, request_scheme, with_timeout};
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::from_fn_with_state;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

const DEFAULT_TIMEOUT: u64 = 1_000;
const SHORTEN_TIMEOUT: u64 = 5_000;
const LISTING_TIMEOUT: u64 = 10_000;

#[derive(Clone)]
pub struct AppState {
    pub links: LinkService,
    pub credentials: Arc<AdminCredentials>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/shorten", post(shorten))
        .route("/stats/:id", get(link_statistics))
        .route(
            "/admin/links",
            get(list_links).route_layer(from_fn_with_state(state.clone(), basic_auth)),
        )
        .route("/:id", get(redirect))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn shorten(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ShortenRequest>,
) -> Result<Json<ShortenResponse>, ServiceError> {
    let host = get_header("Host", &headers).unwrap_or_default();
    let link = with_timeout(
        SHORTEN_TIMEOUT,
        state
            .links
            .shorten(&request.url, request.alias.as_deref(), &host),
    )
    .await??;
    Ok(Json(ShortenResponse {
        short_url: format!("{}://{}/{}", request_scheme(&headers), host, link.id),
        id: link.id,
        original_url: link.original_url,
    }))
}

pub async fn redirect(
    State(state): State<AppState>,
    Path(link_id): Path<String>,
) -> Result<Response, ServiceError> {
    let original_url = with_timeout(DEFAULT_TIMEOUT, state.links.resolve(&link_id)).await??;
    // detached from this request, see HitCounter::record
    let _ = state.links.record_hit(&link_id);
    Ok((
        StatusCode::FOUND,
        [
            (header::LOCATION, original_url),
            (header::CACHE_CONTROL, "no-store".to_string()),
        ],
    )
        .into_response())
}

pub async fn link_statistics(
    State(state): State<AppState>,
    Path(link_id): Path<String>,
) -> Result<Json<LinkStats>, ServiceError> {
    let stats = with_timeout(DEFAULT_TIMEOUT, state.links.link_stats(&link_id)).await??;
    Ok(Json(stats))
}

pub async fn list_links(State(state): State<AppState>) -> Result<Json<Vec<LinkRow>>, ServiceError> {
    let rows = with_timeout(LISTING_TIMEOUT, state.links.list_all()).await??;
    tracing::debug!("Listing {} links", rows.len());
    Ok(Json(rows))
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
