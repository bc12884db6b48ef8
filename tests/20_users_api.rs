mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};
use videohub_api::config::Environment;

async fn get_users(server: &common::TestServer, query: &[(&str, &str)]) -> Result<(StatusCode, Value)> {
    let res = reqwest::Client::new()
        .get(server.url("/api/v1/users"))
        .query(query)
        .send()
        .await?;
    let status = res.status();
    Ok((status, res.json::<Value>().await?))
}

#[tokio::test]
async fn fetches_user_by_email() -> Result<()> {
    let server = common::TestServer::start(Environment::Test).await?;
    let user = server.seed_user("ada", "ada@example.com").await?;

    let (status, body) = get_users(&server, &[("email", "ada@example.com")]).await?;
    assert_eq!(status, StatusCode::OK, "unexpected body: {}", body);
    assert_eq!(body["message"], "User fetched successfully");
    assert_eq!(body["data"]["_id"], json!(user.id.expect("stored id").to_hex()));
    assert_eq!(body["data"]["email"], "ada@example.com");
    assert_eq!(body["data"]["username"], "ada");
    Ok(())
}

#[tokio::test]
async fn user_response_omits_credentials() -> Result<()> {
    let server = common::TestServer::start(Environment::Test).await?;
    server.seed_user("ada", "ada@example.com").await?;

    let (_, body) = get_users(&server, &[("email", "ada@example.com")]).await?;
    let data = body["data"].as_object().expect("data should be an object");
    assert!(!data.contains_key("password"), "password leaked: {}", body);
    assert!(!data.contains_key("refreshToken"), "refresh token leaked: {}", body);
    assert!(data.contains_key("createdAt"));
    Ok(())
}

#[tokio::test]
async fn email_lookup_ignores_case() -> Result<()> {
    let server = common::TestServer::start(Environment::Test).await?;
    server.seed_user("ada", "ada@example.com").await?;

    let (status, body) = get_users(&server, &[("email", "ADA@Example.com")]).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "ada");
    Ok(())
}

#[tokio::test]
async fn unknown_email_returns_null_data() -> Result<()> {
    let server = common::TestServer::start(Environment::Test).await?;
    server.seed_user("ada", "ada@example.com").await?;

    let (status, body) = get_users(&server, &[("email", "nobody@example.com")]).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "User fetched successfully", "data": null }));
    Ok(())
}

#[tokio::test]
async fn missing_email_is_rejected_in_query() -> Result<()> {
    let server = common::TestServer::start(Environment::Test).await?;

    let (status, body) = get_users(&server, &[]).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["errorIn"], "query");
    assert_eq!(body["errors"][0]["message"], "Email is required");
    assert_eq!(body["errors"][0]["path"], json!(["email"]));
    Ok(())
}

#[tokio::test]
async fn malformed_email_is_rejected() -> Result<()> {
    let server = common::TestServer::start(Environment::Test).await?;

    for email in ["not-an-email", ""] {
        let (status, body) = get_users(&server, &[("email", email)]).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "email {:?} accepted: {}", email, body);
        assert_eq!(body["errorIn"], "query");
        assert_eq!(body["errors"][0]["message"], "Invalid email format");
    }
    Ok(())
}

#[tokio::test]
async fn other_methods_on_users_are_not_found() -> Result<()> {
    let server = common::TestServer::start(Environment::Test).await?;

    let res = reqwest::Client::new()
        .post(server.url("/api/v1/users"))
        .json(&json!({ "email": "ada@example.com" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body = res.json::<Value>().await?;
    assert_eq!(body["message"], "Route POST /api/v1/users not found");
    Ok(())
}
