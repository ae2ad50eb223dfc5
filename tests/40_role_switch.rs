mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn seller_switch_lifecycle() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let (token, user) =
        common::login(&server.base_url, common::SELLER_EMAIL, common::SELLER_PASSWORD).await?;
    assert_eq!(user["role"], "CUSTOMER");

    // Switch the active role to an already-granted one.
    let res = client
        .post(format!("{}/api/auth/role", server.base_url))
        .bearer_auth(&token)
        .json(&json!({ "role": "SELLER" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<serde_json::Value>().await?;
    let switched = body["data"]["token"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["user"]["role"], "SELLER");
    assert_eq!(body["data"]["user"]["roles"], json!(["CUSTOMER", "SELLER"]));

    // The replacement token carries the new active role...
    let res = client
        .get(format!("{}/api/auth/whoami", server.base_url))
        .bearer_auth(&switched)
        .send()
        .await?;
    assert_eq!(res.json::<serde_json::Value>().await?["data"]["user"]["role"], "SELLER");

    // ...while the superseded token keeps asserting the old one until it
    // expires; tokens are never revoked.
    let res = client
        .get(format!("{}/api/auth/whoami", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<serde_json::Value>().await?["data"]["user"]["role"], "CUSTOMER");

    // Unrecognized target role.
    let res = client
        .post(format!("{}/api/auth/role", server.base_url))
        .bearer_auth(&switched)
        .json(&json!({ "role": "WAREHOUSE_GOBLIN" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<serde_json::Value>().await?["code"], "INVALID_ROLE");

    // Recognized but not granted: switching never grants a role.
    let res = client
        .post(format!("{}/api/auth/role", server.base_url))
        .bearer_auth(&switched)
        .json(&json!({ "role": "ADMIN" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // The switch landed in the audit trail with its from/to detail.
    let (admin_token, _) =
        common::login(&server.base_url, common::ADMIN_EMAIL, common::ADMIN_PASSWORD).await?;
    let res = client
        .get(format!("{}/api/admin/audit", server.base_url))
        .bearer_auth(&admin_token)
        .send()
        .await?;
    let body = res.json::<serde_json::Value>().await?;
    let records = body["data"].as_array().unwrap();
    let switch = records
        .iter()
        .find(|r| r["action"] == "ROLE_SWITCH" && r["actor"] == user["id"])
        .expect("role switch must be audited");
    assert_eq!(switch["detail"]["from"], "CUSTOMER");
    assert_eq!(switch["detail"]["to"], "SELLER");
    Ok(())
}

#[tokio::test]
async fn shopper_cannot_switch_roles() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let (token, user) =
        common::login(&server.base_url, common::SHOPPER_EMAIL, common::SHOPPER_PASSWORD).await?;

    // An unsophisticated customer holds neither role:switch nor ADMIN.
    let res = client
        .post(format!("{}/api/auth/role", server.base_url))
        .bearer_auth(&token)
        .json(&json!({ "role": "ADMIN" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // The attempt is audited as an unauthorized role switch.
    let (admin_token, _) =
        common::login(&server.base_url, common::ADMIN_EMAIL, common::ADMIN_PASSWORD).await?;
    let res = client
        .get(format!("{}/api/admin/audit", server.base_url))
        .bearer_auth(&admin_token)
        .send()
        .await?;
    let body = res.json::<serde_json::Value>().await?;
    let records = body["data"].as_array().unwrap();
    let attempt = records
        .iter()
        .find(|r| r["action"] == "UNAUTHORIZED_ROLE_SWITCH" && r["actor"] == user["id"])
        .expect("unauthorized switch must be audited");
    assert_eq!(attempt["detail"]["target"], "ADMIN");
    Ok(())
}
