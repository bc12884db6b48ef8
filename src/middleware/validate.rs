use axum::{
    body::{to_bytes, Body},
    extract::{Query, RawPathParams, Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
    RequestExt,
};
use http_body_util::LengthLimitError;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::error::ApiError;

/// The parts of a request a route can attach a schema to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestPart {
    Params,
    Query,
    Headers,
    Body,
}

impl RequestPart {
    /// Order in which parts are checked; the first failing part wins.
    pub const ORDER: [RequestPart; 4] = [
        RequestPart::Params,
        RequestPart::Query,
        RequestPart::Headers,
        RequestPart::Body,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestPart::Params => "params",
            RequestPart::Query => "query",
            RequestPart::Headers => "headers",
            RequestPart::Body => "body",
        }
    }
}

impl fmt::Display for RequestPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One failed rule: which rule, where, and the client-facing message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub code: String,
    pub path: Vec<String>,
    pub message: String,
}

impl Issue {
    pub fn new(code: impl Into<String>, path: Vec<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            path,
            message: message.into(),
        }
    }
}

/// Flattens validator output into issues, ordered by field path.
pub fn issues_from_errors(errors: &ValidationErrors) -> Vec<Issue> {
    let mut issues = Vec::new();
    collect_issues(errors, &[], &mut issues);
    issues
}

fn collect_issues(errors: &ValidationErrors, prefix: &[String], issues: &mut Vec<Issue>) {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    for (field, kind) in fields {
        let mut path = prefix.to_vec();
        // "__all__" carries struct-level errors
        if *field != "__all__" {
            path.push(field.to_string());
        }

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    let message = match &error.message {
                        Some(message) => message.to_string(),
                        None => format!("Invalid value for {}", path.join(".")),
                    };
                    issues.push(Issue::new(error.code.to_string(), path.clone(), message));
                }
            }
            ValidationErrorsKind::Struct(nested) => collect_issues(nested, &path, issues),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    let mut item_path = path.clone();
                    item_path.push(index.to_string());
                    collect_issues(nested, &item_path, issues);
                }
            }
        }
    }
}

type CheckFn = dyn Fn(Value) -> Result<Value, Vec<Issue>> + Send + Sync;

/// Type-erased schema for a single request part.
///
/// A schema is any `Deserialize + Validate + Serialize` struct. Checking a
/// part decodes it into that struct, runs its rules, and re-encodes it so
/// defaults and normalized values flow on to the handler. Path params,
/// query strings and headers arrive as string maps, so their schemas use
/// string fields.
#[derive(Clone)]
pub struct PartSchema {
    check: Arc<CheckFn>,
}

impl PartSchema {
    pub fn of<T>() -> Self
    where
        T: DeserializeOwned + Validate + Serialize + 'static,
    {
        Self {
            check: Arc::new(|value| {
                let parsed: T = serde_json::from_value(value)
                    .map_err(|e| vec![Issue::new("invalid_type", Vec::new(), e.to_string())])?;
                parsed.validate().map_err(|e| issues_from_errors(&e))?;
                serde_json::to_value(&parsed)
                    .map_err(|e| vec![Issue::new("invalid_type", Vec::new(), e.to_string())])
            }),
        }
    }

    pub fn check(&self, value: Value) -> Result<Value, Vec<Issue>> {
        (self.check)(value)
    }
}

impl fmt::Debug for PartSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PartSchema")
    }
}

/// Per-route schemas, keyed by request part.
#[derive(Debug, Clone, Default)]
pub struct RequestSchemas {
    schemas: HashMap<RequestPart, PartSchema>,
}

impl RequestSchemas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn params<T: DeserializeOwned + Validate + Serialize + 'static>(self) -> Self {
        self.with(RequestPart::Params, PartSchema::of::<T>())
    }

    pub fn query<T: DeserializeOwned + Validate + Serialize + 'static>(self) -> Self {
        self.with(RequestPart::Query, PartSchema::of::<T>())
    }

    pub fn headers<T: DeserializeOwned + Validate + Serialize + 'static>(self) -> Self {
        self.with(RequestPart::Headers, PartSchema::of::<T>())
    }

    pub fn body<T: DeserializeOwned + Validate + Serialize + 'static>(self) -> Self {
        self.with(RequestPart::Body, PartSchema::of::<T>())
    }

    pub fn with(mut self, part: RequestPart, schema: PartSchema) -> Self {
        self.schemas.insert(part, schema);
        self
    }

    pub fn get(&self, part: RequestPart) -> Option<&PartSchema> {
        self.schemas.get(&part)
    }
}

/// Validated request parts, inserted as a request extension.
#[derive(Debug, Clone, Default)]
pub struct ValidatedRequest {
    parts: HashMap<RequestPart, Value>,
}

impl ValidatedRequest {
    pub fn get(&self, part: RequestPart) -> Option<&Value> {
        self.parts.get(&part)
    }

    /// Decodes a validated part into the handler's type.
    pub fn part<T: DeserializeOwned>(&self, part: RequestPart) -> Result<T, ApiError> {
        let value = self.get(part).cloned().ok_or_else(|| {
            ApiError::internal_server_error(format!("Request {} was not validated for this route", part))
        })?;
        serde_json::from_value(value).map_err(ApiError::from)
    }

    pub fn query<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        self.part(RequestPart::Query)
    }
}

/// Middleware checking every part that has a schema, in `RequestPart::ORDER`.
///
/// Mount with `from_fn_with_state(schemas, validate_request)` as a route
/// layer so path params are available.
pub async fn validate_request(
    State(schemas): State<RequestSchemas>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let mut validated = ValidatedRequest::default();

    for part in RequestPart::ORDER {
        let Some(schema) = schemas.get(part) else {
            continue;
        };

        let raw = match part {
            RequestPart::Params => params_value(&mut request).await?,
            RequestPart::Query => query_value(&request)?,
            RequestPart::Headers => headers_value(request.headers()),
            RequestPart::Body => {
                let (value, rebuilt) = body_value(request).await?;
                request = rebuilt;
                value
            }
        };

        let value = schema.check(raw).map_err(|issues| {
            tracing::debug!(part = %part, issues = issues.len(), "Request validation failed");
            ApiError::invalid_request(part, issues)
        })?;

        if part == RequestPart::Body {
            request = replace_body(request, &value)?;
        }
        validated.parts.insert(part, value);
    }

    request.extensions_mut().insert(validated);
    Ok(next.run(request).await)
}

async fn params_value(request: &mut Request) -> Result<Value, ApiError> {
    let params = request
        .extract_parts::<RawPathParams>()
        .await
        .map_err(|e| ApiError::invalid_request(RequestPart::Params, vec![Issue::new("invalid_params", Vec::new(), e.body_text())]))?;

    let map = params
        .iter()
        .map(|(key, value)| (key.to_string(), Value::String(value.to_string())))
        .collect::<Map<_, _>>();
    Ok(Value::Object(map))
}

fn query_value(request: &Request) -> Result<Value, ApiError> {
    let Query(query) = Query::<HashMap<String, String>>::try_from_uri(request.uri())
        .map_err(|e| ApiError::invalid_request(RequestPart::Query, vec![Issue::new("invalid_query", Vec::new(), e.body_text())]))?;

    let map = query
        .into_iter()
        .map(|(key, value)| (key, Value::String(value)))
        .collect::<Map<_, _>>();
    Ok(Value::Object(map))
}

fn headers_value(headers: &HeaderMap) -> Value {
    let map = headers
        .iter()
        .filter_map(|(name, value)| {
            let value = value.to_str().ok()?;
            Some((name.as_str().to_string(), Value::String(value.to_string())))
        })
        .collect::<Map<_, _>>();
    Value::Object(map)
}

/// Buffers the body (honoring `DefaultBodyLimit`) and parses it as JSON; an
/// empty body reads as `{}`. Returns the request with an empty body.
async fn body_value(request: Request) -> Result<(Value, Request), ApiError> {
    let (parts, body) = request.with_limited_body().into_parts();
    let bytes = to_bytes(body, usize::MAX).await.map_err(|e| {
        if exceeds_limit(&e) {
            ApiError::payload_too_large("Request body too large")
        } else {
            ApiError::bad_request(format!("Failed to read request body: {}", e))
        }
    })?;

    let value = if bytes.iter().all(u8::is_ascii_whitespace) {
        Value::Object(Map::new())
    } else {
        serde_json::from_slice(&bytes).map_err(|e| {
            ApiError::invalid_request(RequestPart::Body, vec![Issue::new("invalid_json", Vec::new(), e.to_string())])
        })?
    };

    Ok((value, Request::from_parts(parts, Body::empty())))
}

fn exceeds_limit(err: &axum::Error) -> bool {
    let mut source = std::error::Error::source(err);
    while let Some(err) = source {
        if err.is::<LengthLimitError>() {
            return true;
        }
        source = err.source();
    }
    false
}

fn replace_body(request: Request, value: &Value) -> Result<Request, ApiError> {
    let bytes = serde_json::to_vec(value)?;
    let (mut parts, _) = request.into_parts();
    parts.headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    parts.headers.insert(header::CONTENT_LENGTH, HeaderValue::from(bytes.len()));
    Ok(Request::from_parts(parts, Body::from(bytes)))
}
