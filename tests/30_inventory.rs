mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn staff_token(server: &common::TestServer, client: &reqwest::Client) -> Result<String> {
    let (token, _) = common::register(server, client, &common::unique_email("inventory"), "cabparts1").await?;
    Ok(token)
}

#[tokio::test]
async fn plywood_lifecycle() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    let client = reqwest::Client::new();
    let token = staff_token(server, &client).await?;

    let res = client
        .post(server.url("/api/materials"))
        .bearer_auth(&token)
        .json(&json!({
            "name": "Plywood",
            "category": "Lumber",
            "supplier": "Wood Works",
            "quantity": 10,
            "status": "In Stock"
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await?;
    let material = &created["data"];
    assert!(material["id"].as_i64().unwrap_or_default() > 0);
    assert_eq!(material["quantity"], 10);
    assert!(material["createdAt"].is_string());
    assert!(material["updatedAt"].is_string());
    let path = format!("/api/materials/{}", material["id"]);

    let res = client
        .put(server.url(&path))
        .bearer_auth(&token)
        .json(&json!({ "quantity": 0 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await?;
    assert_eq!(updated["data"]["quantity"], 0);
    assert_eq!(updated["data"]["name"], "Plywood");
    assert_eq!(updated["data"]["supplier"], "Wood Works");

    let res = client.delete(server.url(&path)).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(server.url(&path)).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await?;
    assert_eq!(body["error"], "NOT_FOUND");

    Ok(())
}

#[tokio::test]
async fn empty_patch_leaves_record_untouched() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    let client = reqwest::Client::new();
    let token = staff_token(server, &client).await?;

    let created: Value = client
        .post(server.url("/api/accessories"))
        .bearer_auth(&token)
        .json(&json!({
            "name": "Side Mirror",
            "make": "OEM",
            "color": "Chrome",
            "quantity": 4,
            "price": 850.5
        }))
        .send()
        .await?
        .json()
        .await?;
    let before = created["data"].clone();
    assert_eq!(before["status"], "Low Stock");

    let res = client
        .patch(server.url(&format!("/api/accessories/{}", before["id"])))
        .bearer_auth(&token)
        .json(&json!({}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let after: Value = res.json().await?;
    let after = &after["data"];

    for field in ["id", "name", "make", "color", "quantity", "price", "status", "image", "createdAt"] {
        assert_eq!(after[field], before[field], "field {} changed", field);
    }

    Ok(())
}

#[tokio::test]
async fn accessory_filters_and_public_reads() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    let client = reqwest::Client::new();
    let token = staff_token(server, &client).await?;
    let marker = common::unique_email("rack").replace('@', "-");

    for (make, color) in [("Aftermarket", "Black"), ("Aftermarket", "Silver"), ("Generic", "Black")] {
        let res = client
            .post(server.url("/api/accessories"))
            .bearer_auth(&token)
            .json(&json!({
                "name": format!("Roof Rack {}", marker),
                "make": make,
                "color": color,
                "quantity": 20,
                "price": 1500
            }))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    // No token needed for catalogue reads
    let res = client
        .get(server.url("/api/accessories"))
        .query(&[("search", marker.as_str()), ("make", "Aftermarket"), ("unit_color", "Black")])
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["make"], "Aftermarket");
    assert_eq!(body["data"][0]["color"], "Black");

    let body: Value = client
        .get(server.url("/api/accessories"))
        .query(&[("search", marker.as_str()), ("ignored_key", "x"), ("make", "")])
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["count"], 3);

    Ok(())
}

#[tokio::test]
async fn missing_and_invalid_records() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    let client = reqwest::Client::new();
    let token = staff_token(server, &client).await?;

    let res = client
        .delete(server.url("/api/cabs/999999999"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client.get(server.url("/api/cabs/999999999")).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .post(server.url("/api/cabs"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Carry", "make": "Suzuki", "color": "White", "quantity": 1, "price": -1 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await?;
    assert!(body["fieldErrors"]["price"].is_string());

    let res = client
        .post(server.url("/api/cabs"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Carry", "make": "Suzuki", "color": "White", "quantity": 1, "price": 100000000000.0 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await?;
    assert_eq!(body["fieldErrors"]["price"], "Must be at most 9999999999.99");

    Ok(())
}
