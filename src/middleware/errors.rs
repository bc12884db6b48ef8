use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use std::any::Any;

use crate::config::Environment;
use crate::error::INTERNAL_SERVER_ERROR_MESSAGE;

/// Internal failure details attached to a 500 response as an extension.
///
/// Never serialized directly; `handle_errors` decides what the client sees.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub message: String,
    pub detail: Option<String>,
}

/// Terminal error handler: logs internal failures with the request line and
/// rewrites their body for the current environment.
///
/// Production clients get the generic message only. Elsewhere the body
/// carries the real message and a `stack` field with the debug detail.
pub async fn handle_errors(State(environment): State<Environment>, request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let mut response = next.run(request).await;
    let Some(report) = response.extensions_mut().remove::<ErrorReport>() else {
        return response;
    };

    tracing::error!(
        method = %method,
        path = %path,
        detail = report.detail.as_deref().unwrap_or_default(),
        "Unhandled error: {}",
        report.message
    );

    let body = if environment.is_production() {
        json!({
            "success": false,
            "message": INTERNAL_SERVER_ERROR_MESSAGE,
        })
    } else {
        let stack = report.detail.unwrap_or_else(|| report.message.clone());
        json!({
            "success": false,
            "message": report.message,
            "stack": stack,
        })
    };

    (response.status(), Json(body)).into_response()
}

/// Response for a handler panic caught by `CatchPanicLayer`.
///
/// Produces a bare 500 with an `ErrorReport` so `handle_errors` formats it
/// like any other internal error.
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "Unknown panic".to_string()
    };

    let mut response = (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "success": false, "message": INTERNAL_SERVER_ERROR_MESSAGE })),
    )
        .into_response();
    response.extensions_mut().insert(ErrorReport {
        detail: Some(format!("panicked at request handler: {}", message)),
        message,
    });
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_payloads_become_reports() {
        let response = panic_response(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let report = response.extensions().get::<ErrorReport>().unwrap();
        assert_eq!(report.message, "boom");

        let response = panic_response(Box::new(format!("index {} out of range", 3)));
        let report = response.extensions().get::<ErrorReport>().unwrap();
        assert_eq!(report.message, "index 3 out of range");

        let response = panic_response(Box::new(42_u8));
        let report = response.extensions().get::<ErrorReport>().unwrap();
        assert_eq!(report.message, "Unknown panic");
    }
}
