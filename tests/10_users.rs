mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn register_issues_token_and_hides_hash() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    let client = reqwest::Client::new();
    let email = common::unique_email("register");

    let (token, user) = common::register(server, &client, &email, "cabparts1").await?;
    assert!(!token.is_empty());
    assert_eq!(user["email"], email);
    assert_eq!(user["role"], "staff");
    assert_eq!(user["isActive"], true);
    assert!(user.get("passwordHash").is_none());

    let me: Value = client
        .get(server.url("/api/users/me"))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(me["data"]["id"], user["id"]);

    Ok(())
}

#[tokio::test]
async fn duplicate_registration_is_conflict() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    let client = reqwest::Client::new();
    let email = common::unique_email("dup");

    common::register(server, &client, &email, "cabparts1").await?;

    let res = client
        .post(server.url("/api/users/register"))
        .json(&json!({ "fullName": "Someone Else", "email": email.to_uppercase(), "password": "cabparts2" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = res.json().await?;
    assert_eq!(body["error"], "CONFLICT");
    assert_eq!(body["statusCode"], 409);

    Ok(())
}

#[tokio::test]
async fn login_failures_are_distinct_by_status_only_for_inactive() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    let client = reqwest::Client::new();
    let email = common::unique_email("login");
    let (_, user) = common::register(server, &client, &email, "cabparts1").await?;

    let login = |email: String, password: &'static str| {
        let client = client.clone();
        let url = server.url("/api/users/login");
        async move { client.post(url).json(&json!({ "email": email, "password": password })).send().await }
    };

    let ok = login(email.clone(), "cabparts1").await?;
    assert_eq!(ok.status(), StatusCode::OK);
    let ok_body: Value = ok.json().await?;
    let token = ok_body["data"]["token"].as_str().unwrap_or_default().to_string();

    let unknown = login(common::unique_email("nobody"), "cabparts1").await?;
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    let unknown_body: Value = unknown.json().await?;

    let wrong = login(email.clone(), "wrongpass9").await?;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    let wrong_body: Value = wrong.json().await?;
    assert_eq!(unknown_body["message"], wrong_body["message"]);

    // Staff may deactivate accounts, including their own
    let res = client
        .put(server.url(&format!("/api/users/{}/deactivate", user["id"])))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let inactive = login(email.clone(), "cabparts1").await?;
    assert_eq!(inactive.status(), StatusCode::FORBIDDEN);

    // Still retrievable by id
    let res = client
        .get(server.url(&format!("/api/users/{}", user["id"])))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["isActive"], false);

    Ok(())
}

#[tokio::test]
async fn password_update_then_login() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    let client = reqwest::Client::new();
    let email = common::unique_email("password");
    let (token, user) = common::register(server, &client, &email, "cabparts1").await?;
    let path = format!("/api/users/{}/password", user["id"]);

    let weak = client
        .put(server.url(&path))
        .bearer_auth(&token)
        .json(&json!({ "password": "short" }))
        .send()
        .await?;
    assert_eq!(weak.status(), StatusCode::BAD_REQUEST);

    let res = client
        .put(server.url(&path))
        .bearer_auth(&token)
        .json(&json!({ "password": "newparts22" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let old = client
        .post(server.url("/api/users/login"))
        .json(&json!({ "email": email, "password": "cabparts1" }))
        .send()
        .await?;
    assert_eq!(old.status(), StatusCode::UNAUTHORIZED);

    let new = client
        .post(server.url("/api/users/login"))
        .json(&json!({ "email": email, "password": "newparts22" }))
        .send()
        .await?;
    assert_eq!(new.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn profile_update_and_delete() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    let client = reqwest::Client::new();
    let (token, _) = common::register(server, &client, &common::unique_email("actor"), "cabparts1").await?;
    let (_, target) = common::register(server, &client, &common::unique_email("target"), "cabparts1").await?;
    let path = format!("/api/users/{}", target["id"]);

    let res = client
        .put(server.url(&path))
        .bearer_auth(&token)
        .json(&json!({ "fullName": "Renamed Staff" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["fullName"], "Renamed Staff");
    assert_eq!(body["data"]["email"], target["email"]);

    let res = client.delete(server.url(&path)).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(server.url(&path)).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client.delete(server.url(&path)).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn list_filters_by_search_and_role() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    let client = reqwest::Client::new();
    let marker = common::unique_email("roster");
    let marker = marker.split('@').next().unwrap_or_default().to_string();

    let (token, _) = common::register(server, &client, &format!("{}-a@multicab.test", marker), "cabparts1").await?;
    common::register(server, &client, &format!("{}-b@multicab.test", marker), "cabparts1").await?;

    let list = |role: &'static str| {
        client
            .get(server.url("/api/users"))
            .bearer_auth(&token)
            .query(&[("search", marker.as_str()), ("role", role)])
            .send()
    };

    let res = list("staff").await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["count"], 2);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));

    let body: Value = list("admin").await?.json().await?;
    assert_eq!(body["count"], 0);

    Ok(())
}
