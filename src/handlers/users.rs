// handlers/users.rs - GET /api/v1/users?email= handler

use axum::extract::{Extension, State};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::UserView;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, RequestSchemas, ValidatedRequest};
use crate::state::AppState;

/// Query string accepted by the user lookup route.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct GetUserByEmailQuery {
    #[validate(required(message = "Email is required"), email(message = "Invalid email format"))]
    pub email: Option<String>,
}

pub fn get_user_by_email_schemas() -> RequestSchemas {
    RequestSchemas::new().query::<GetUserByEmailQuery>()
}

/// Looks a user up by email. An unknown email is a 200 with `data: null`.
pub async fn get_user_by_email(
    State(state): State<AppState>,
    Extension(validated): Extension<ValidatedRequest>,
) -> ApiResult<Option<UserView>> {
    let query: GetUserByEmailQuery = validated.query()?;
    let email = query.email.ok_or_else(|| ApiError::bad_request("Email is required"))?;

    let user = state.users.find_by_email(&email).await?;
    Ok(ApiResponse::success("User fetched successfully", user.map(UserView::from)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::RequestPart;
    use serde_json::json;

    #[test]
    fn query_schema_messages() {
        let schemas = get_user_by_email_schemas();
        let schema = schemas.get(RequestPart::Query).unwrap();

        let issues = schema.check(json!({})).unwrap_err();
        assert_eq!(issues[0].message, "Email is required");
        assert_eq!(issues[0].path, ["email"]);

        let issues = schema.check(json!({ "email": "not-an-email" })).unwrap_err();
        assert_eq!(issues[0].message, "Invalid email format");

        let value = schema.check(json!({ "email": "a@b.com", "extra": "1" })).unwrap();
        assert_eq!(value, json!({ "email": "a@b.com" }));
    }
}
