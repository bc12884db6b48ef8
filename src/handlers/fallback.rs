// handlers/fallback.rs - 404 for any method/path without a route

use axum::http::{Method, Uri};

use crate::error::ApiError;

pub async fn route_not_found(method: Method, uri: Uri) -> ApiError {
    let path = uri.path();
    tracing::debug!("No route for {} {}", method, path);
    ApiError::not_found(format!("Route {} {} not found", method, path))
}
