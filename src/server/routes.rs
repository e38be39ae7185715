use super::ApiError;
use crate::gallery::Gallery;
use crate::models::{ApiResponse, CreateImageRequest, DeleteOutcome, ImageResource};
use anyhow::Result;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        DefaultBodyLimit, Path, State,
    },
    http::{Method, StatusCode},
    routing::{delete, get},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

type SharedGallery = Arc<Gallery>;

const COLLECTION_METHODS: &str = "GET, POST";
const ITEM_METHODS: &str = "DELETE";

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn list_images(
    State(gallery): State<SharedGallery>,
) -> Result<Json<ApiResponse<Vec<ImageResource>>>, ApiError> {
    let resources = gallery.list().await?;
    Ok(Json(ApiResponse::success(resources)))
}

async fn create_image(
    State(gallery): State<SharedGallery>,
    payload: Result<Json<CreateImageRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<ImageResource>>), ApiError> {
    let Json(request) = payload?;
    let resource = gallery.create(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(resource))))
}

async fn delete_image(
    State(gallery): State<SharedGallery>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<ApiResponse<DeleteOutcome>>, ApiError> {
    let Path(id) = path?;
    let outcome = gallery.delete(&[id]).await?;
    Ok(Json(ApiResponse::success(outcome)))
}

async fn delete_without_id(
    State(gallery): State<SharedGallery>,
) -> Result<Json<ApiResponse<DeleteOutcome>>, ApiError> {
    let outcome = gallery.delete::<&str>(&[]).await?;
    Ok(Json(ApiResponse::success(outcome)))
}

async fn collection_method_not_allowed(method: Method) -> ApiError {
    ApiError::MethodNotAllowed {
        method,
        allow: COLLECTION_METHODS,
    }
}

async fn item_method_not_allowed(method: Method) -> ApiError {
    ApiError::MethodNotAllowed {
        method,
        allow: ITEM_METHODS,
    }
}

pub fn make_app(gallery: Gallery, max_body_bytes: usize) -> Router {
    let state: SharedGallery = Arc::new(gallery);

    Router::new()
        .route("/health", get(health))
        .route(
            "/api/images",
            get(list_images)
                .post(create_image)
                .fallback(collection_method_not_allowed),
        )
        // `{*id}` never matches an empty remainder.
        .route(
            "/api/images/",
            delete(delete_without_id).fallback(item_method_not_allowed),
        )
        .route(
            "/api/images/{*id}",
            delete(delete_image).fallback(item_method_not_allowed),
        )
        .with_state(state)
        // Oversized bodies surface as a `JsonRejection`.
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
}

pub async fn run_server(gallery: Gallery, bind_addr: &str, max_body_bytes: usize) -> Result<()> {
    let app = make_app(gallery, max_body_bytes);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown signal received");
            }
        })
        .await?;
    Ok(())
}
