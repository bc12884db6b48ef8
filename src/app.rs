use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

use crate::handlers;
use crate::middleware::{handle_errors, panic_response, validate_request, with_security_headers};
use crate::state::AppState;

/// Builds the full HTTP application for `state`.
///
/// Layers, outermost first: security headers, request tracing, CORS, body
/// limit, terminal error handler, panic capture.
pub fn app(state: AppState) -> Router {
    let environment = state.config.environment;
    let max_body_bytes = state.config.api.max_body_bytes;

    let router = Router::new()
        .route("/health", get(handlers::health))
        .merge(user_routes())
        .fallback(handlers::route_not_found)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(max_body_bytes))
                .layer(from_fn_with_state(environment, handle_errors))
                .layer(CatchPanicLayer::custom(panic_response)),
        );

    with_security_headers(router)
}

fn user_routes() -> Router<AppState> {
    use handlers::users;

    Router::new().route(
        "/api/v1/users",
        get(users::get_user_by_email)
            .route_layer(from_fn_with_state(users::get_user_by_email_schemas(), validate_request))
            .fallback(handlers::route_not_found),
    )
}
