//! HTTP routes for the brands API.
//!
//! ## Routes
//!
//! - `GET /health`: liveness probe (`{ "ok": true }`, no store access).
//! - `POST /brands`: create (`201` + `Location: /brands/{id}`).
//! - `GET /brands?limit=&offset=&q=`: paginated list (`{ total, items }`).
//! - `GET /brands/:id`: one brand.
//! - `PUT /brands/:id`: partial update.
//! - `DELETE /brands/:id`: hard delete (`204`).
//!
//! Handlers hold no domain logic. They decode, hand the call to the gateway on
//! the blocking pool, and map the outcome to a status code. Bodies are decoded
//! as JSON objects first so wrongly typed fields surface as field violations.

use std::time::Instant;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, Request, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use brands_core::{
    BrandListQuery, BrandPage, BrandService, CreateBrandInput, ServiceResult, UpdateBrandInput,
};
use log::{info, warn};
use serde_json::{json, Map, Value};
use tower_http::cors::{AllowHeaders, AllowOrigin, Any, CorsLayer};

use crate::config::AppConfig;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Path prefix of the brand resource.
pub const BRANDS_PATH: &str = "/brands";

/// Build the axum `Router` for the brands API.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(health))
        .route(BRANDS_PATH, get(list_brands).post(create_brand))
        .route(
            "/brands/:id",
            get(get_brand).put(update_brand).delete(delete_brand),
        )
        .layer(middleware::from_fn(log_request))
        .layer(cors)
        .with_state(state)
}

/// `GET /health`
async fn health() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

/// `POST /brands`
async fn create_brand(
    State(state): State<AppState>,
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(body) = payload?;
    let input = CreateBrandInput::from_json(&body)?;
    let created = run_gateway(&state, move |brands| brands.create_brand(&input)).await?;
    let location = format!("{BRANDS_PATH}/{}", created.id);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(created),
    )
        .into_response())
}

/// `GET /brands/:id`
async fn get_brand(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Response> {
    let brand = run_gateway(&state, move |brands| brands.get_brand(&id)).await?;
    Ok(Json(brand).into_response())
}

/// `GET /brands`
async fn list_brands(
    State(state): State<AppState>,
    query: Result<Query<BrandListQuery>, QueryRejection>,
) -> ApiResult<Json<BrandPage>> {
    let Query(query) = query?;
    let page = run_gateway(&state, move |brands| brands.list_brands(&query)).await?;
    Ok(Json(page))
}

/// `PUT /brands/:id`
async fn update_brand(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(body) = payload?;
    let input = UpdateBrandInput::from_json(&body)?;
    let updated = run_gateway(&state, move |brands| brands.update_brand(&id, &input)).await?;
    Ok(Json(updated).into_response())
}

/// `DELETE /brands/:id`
async fn delete_brand(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let removed = run_gateway(&state, move |brands| brands.delete_brand(&id)).await?;
    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

/// Runs one gateway call on the blocking pool.
///
/// The spawned task is detached from the request future, so a client that
/// disconnects mid-call cannot interrupt a write halfway.
async fn run_gateway<T, F>(state: &AppState, op: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&BrandService) -> ServiceResult<T> + Send + 'static,
{
    let brands = state.brands.clone();
    tokio::task::spawn_blocking(move || op(&brands))
        .await
        .map_err(|err| ApiError::Internal(format!("gateway task failed: {err}")))?
        .map_err(ApiError::from)
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let started_at = Instant::now();

    let response = next.run(request).await;

    info!(
        "event=http_request module=api status={} method={} path={} duration_ms={}",
        response.status().as_u16(),
        method,
        path,
        started_at.elapsed().as_millis()
    );
    response
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];

    if config.allows_any_origin() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_allow_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("event=cors_config module=api status=skipped reason=invalid_origin origin={origin}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(methods)
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
