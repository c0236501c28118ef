//! Server integration tests.
//!
//! Each test runs the proxy on an ephemeral port against a wiremock stand-in
//! for both the Yoto identity provider and the resource API.

mod common;

use anyhow::Result;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, body_partial_json, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use common::TestServer;

#[tokio::test]
async fn test_health_returns_version() -> Result<()> {
    let server = TestServer::start().await?;

    let resp = server
        .client
        .get(format!("{}/health", server.base_url()))
        .send()
        .await?;
    assert!(resp.status().is_success());

    let body: Value = resp.json().await?;
    assert_eq!(body["status"], "ok");
    assert!(body.get("version").is_some());
    Ok(())
}

#[tokio::test]
async fn test_check_config_header_mode() -> Result<()> {
    let server = TestServer::start().await?;

    let body: Value = server.get("/check-config/").send().await?.json().await?;
    assert_eq!(body, json!({"status": "success", "useEnvCredentials": false}));
    Ok(())
}

#[tokio::test]
async fn test_missing_access_token_is_401() -> Result<()> {
    let server = TestServer::start().await?;

    for route in ["/players/", "/library/", "/card/c1/"] {
        let resp = server
            .get(route)
            .header("X-Refresh-Token", "refresh")
            .send()
            .await?;
        assert_eq!(resp.status().as_u16(), 401, "{}", route);

        let body: Value = resp.json().await?;
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "No access token provided");
    }
    Ok(())
}

#[tokio::test]
async fn test_players_returns_devices() -> Result<()> {
    let server = TestServer::start().await?;

    Mock::given(method("GET"))
        .and(path("/device-v2/devices/mine"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"devices": [{"deviceId": "p1"}, {"deviceId": "p2"}]})),
        )
        .expect(1)
        .mount(&server.upstream)
        .await;

    let resp = server
        .get("/players/")
        .header("X-Access-Token", "tok")
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 200);

    let body: Value = resp.json().await?;
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"], json!([{"deviceId": "p1"}, {"deviceId": "p2"}]));
    Ok(())
}

#[tokio::test]
async fn test_players_and_library_normalize_odd_payloads() -> Result<()> {
    let server = TestServer::start().await?;

    Mock::given(method("GET"))
        .and(path("/device-v2/devices/mine"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"other": 1})))
        .mount(&server.upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/content/mine"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"cards": "nope"})))
        .mount(&server.upstream)
        .await;

    for route in ["/players/", "/library/"] {
        let body: Value = server
            .get(route)
            .header("X-Access-Token", "tok")
            .send()
            .await?
            .json()
            .await?;
        assert_eq!(body, json!({"status": "success", "data": []}), "{}", route);
    }
    Ok(())
}

#[tokio::test]
async fn test_card_requests_playable_urls() -> Result<()> {
    let server = TestServer::start().await?;
    let card = json!({"card": {"cardId": "c1", "title": "Stories"}});

    Mock::given(method("GET"))
        .and(path("/content/c1"))
        .and(query_param("playable", "true"))
        .and(query_param("signingType", "s3"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(card.clone()))
        .expect(1)
        .mount(&server.upstream)
        .await;

    let body: Value = server
        .get("/card/c1/")
        .header("X-Access-Token", "tok")
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body, json!({"status": "success", "data": card}));
    Ok(())
}

#[tokio::test]
async fn test_upstream_failure_is_500_without_body() -> Result<()> {
    let server = TestServer::start().await?;

    Mock::given(method("GET"))
        .and(path("/content/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("secret upstream detail"))
        .mount(&server.upstream)
        .await;

    let resp = server
        .get("/card/missing/")
        .header("X-Access-Token", "tok")
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 500);

    let body: Value = resp.json().await?;
    assert_eq!(body["status"], "error");
    assert!(!body["message"].as_str().unwrap_or("").contains("secret"));
    Ok(())
}

#[tokio::test]
async fn test_403_refreshes_once_with_header_credentials() -> Result<()> {
    let server = TestServer::start().await?;

    Mock::given(method("GET"))
        .and(path("/content/mine"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server.upstream)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_partial_json(json!({
            "grant_type": "refresh_token",
            "refresh_token": "user-refresh",
            "client_id": "user-id",
            "client_secret": "user-secret",
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access_token": "fresh", "expires_in": 3600})),
        )
        .expect(1)
        .mount(&server.upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/content/mine"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"cards": [{"cardId": "c1"}]})))
        .expect(1)
        .mount(&server.upstream)
        .await;

    let body: Value = server
        .get("/library/")
        .header("X-Access-Token", "stale")
        .header("X-Refresh-Token", "user-refresh")
        .header("X-Client-Id", "user-id")
        .header("X-Client-Secret", "user-secret")
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["data"], json!([{"cardId": "c1"}]));
    Ok(())
}

#[tokio::test]
async fn test_server_mode_ignores_caller_client_credentials() -> Result<()> {
    let server = TestServer::start_server_mode(None).await?;

    Mock::given(method("GET"))
        .and(path("/device-v2/devices/mine"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server.upstream)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_partial_json(json!({
            "refresh_token": "user-refresh",
            "client_id": "server-id",
            "client_secret": "server-secret",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "fresh"})))
        .expect(1)
        .mount(&server.upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/device-v2/devices/mine"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"devices": []})))
        .expect(1)
        .mount(&server.upstream)
        .await;

    let resp = server
        .get("/players/")
        .header("X-Access-Token", "stale")
        .header("X-Refresh-Token", "user-refresh")
        .header("X-Client-Id", "evil-id")
        .header("X-Client-Secret", "evil-secret")
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 200);
    Ok(())
}

#[tokio::test]
async fn test_exchange_token() -> Result<()> {
    let server = TestServer::start().await?;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_json(json!({
            "grant_type": "authorization_code",
            "code": "abc",
            "redirect_uri": "https://x/cb",
            "client_id": "id1",
            "client_secret": "sec1",
            "audience": "https://api.yotoplay.com",
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access_token": "tok", "expires_in": 3600})),
        )
        .expect(1)
        .mount(&server.upstream)
        .await;

    let resp = server
        .post("/auth/token")
        .json(&json!({
            "code": "abc",
            "clientId": "id1",
            "clientSecret": "sec1",
            "redirectUri": "https://x/cb",
        }))
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 200);

    let body: Value = resp.json().await?;
    assert_eq!(
        body,
        json!({"status": "success", "data": {"access_token": "tok", "expires_in": 3600}})
    );
    Ok(())
}

#[tokio::test]
async fn test_exchange_token_lists_missing_parameters() -> Result<()> {
    let server = TestServer::start().await?;

    let resp = server
        .post("/auth/token")
        .json(&json!({"code": "abc", "clientId": ""}))
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 400);

    let body: Value = resp.json().await?;
    assert_eq!(
        body["message"],
        "Missing required parameters: clientId, clientSecret, redirectUri"
    );
    Ok(())
}

#[tokio::test]
async fn test_exchange_token_passes_upstream_status() -> Result<()> {
    let server = TestServer::start().await?;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(403).set_body_string("invalid_grant"))
        .mount(&server.upstream)
        .await;

    let resp = server
        .post("/auth/token")
        .json(&json!({
            "code": "used",
            "clientId": "id1",
            "clientSecret": "sec1",
            "redirectUri": "https://x/cb",
        }))
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 403);

    let body: Value = resp.json().await?;
    assert_eq!(body["message"], "Token exchange failed: invalid_grant");
    Ok(())
}

#[tokio::test]
async fn test_invalid_json_body_is_400() -> Result<()> {
    let server = TestServer::start().await?;

    let resp = server
        .post("/auth/token")
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 400);
    Ok(())
}

#[tokio::test]
async fn test_token_account_requires_server_mode() -> Result<()> {
    let server = TestServer::start().await?;

    let resp = server
        .post("/auth/token-account")
        .json(&json!({"code": "abc", "redirectUri": "https://x/cb"}))
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 400);

    let body: Value = resp.json().await?;
    assert_eq!(body["message"], "Server credentials not enabled");
    Ok(())
}

#[tokio::test]
async fn test_token_account_uses_server_credentials() -> Result<()> {
    let server = TestServer::start_server_mode(None).await?;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_partial_json(json!({
            "grant_type": "authorization_code",
            "code": "abc",
            "client_id": "server-id",
            "client_secret": "server-secret",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "tok"})))
        .expect(1)
        .mount(&server.upstream)
        .await;

    let missing = server
        .post("/auth/token-account")
        .json(&json!({"code": "abc"}))
        .send()
        .await?;
    assert_eq!(missing.status().as_u16(), 400);
    let body: Value = missing.json().await?;
    assert_eq!(body["message"], "Missing required parameters: code or redirectUri");

    let body: Value = server
        .post("/auth/token-account")
        .json(&json!({
            "code": "abc",
            "redirectUri": "https://x/cb",
            "clientId": "ignored",
        }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body, json!({"status": "success", "data": {"access_token": "tok"}}));
    Ok(())
}

#[tokio::test]
async fn test_family_uses_server_refresh_token() -> Result<()> {
    let server = TestServer::start_server_mode(Some("server-refresh")).await?;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_partial_json(json!({"refresh_token": "server-refresh"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "srv"})))
        .expect(1)
        .mount(&server.upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/family"))
        .and(header("authorization", "Bearer srv"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"familyId": "f1"})))
        .expect(1)
        .mount(&server.upstream)
        .await;

    let body: Value = server.get("/family/").send().await?.json().await?;
    assert_eq!(body, json!({"status": "success", "data": {"familyId": "f1"}}));
    Ok(())
}

#[tokio::test]
async fn test_player_detail_uses_server_credentials() -> Result<()> {
    let server = TestServer::start_server_mode(Some("server-refresh")).await?;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "srv"})))
        .mount(&server.upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/devices/p1"))
        .and(header("authorization", "Bearer srv"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"deviceId": "p1"})))
        .expect(1)
        .mount(&server.upstream)
        .await;

    let body: Value = server.get("/players/p1").send().await?.json().await?;
    assert_eq!(body["data"], json!({"deviceId": "p1"}));
    Ok(())
}

#[tokio::test]
async fn test_env_endpoints_without_server_credentials() -> Result<()> {
    let server = TestServer::start().await?;

    for route in ["/family/", "/test/", "/players/p1/"] {
        let resp = server.get(route).send().await?;
        assert_eq!(resp.status().as_u16(), 500, "{}", route);

        let body: Value = resp.json().await?;
        assert_eq!(body["message"], "Server credentials not configured");
    }
    Ok(())
}

#[tokio::test]
async fn test_connection_reports_success_and_failure() -> Result<()> {
    let server = TestServer::start_server_mode(Some("server-refresh")).await?;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "srv"})))
        .up_to_n_times(1)
        .mount(&server.upstream)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("revoked"))
        .mount(&server.upstream)
        .await;

    let body: Value = server.get("/test/").send().await?.json().await?;
    assert_eq!(
        body,
        json!({"status": "success", "message": "Successfully connected to Yoto API"})
    );

    let resp = server.get("/test/").send().await?;
    assert_eq!(resp.status().as_u16(), 500);
    let body: Value = resp.json().await?;
    assert_eq!(body["status"], "error");
    Ok(())
}

#[tokio::test]
async fn test_start_oauth_redirects_to_authorize_endpoint() -> Result<()> {
    let server = TestServer::start_server_mode(None).await?;

    let resp = server
        .get("/start-oauth/")
        .header("X-Forwarded-Proto", "https")
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 302);

    let location = resp
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(location.starts_with(&format!("{}/oauth/authorize?", server.upstream.uri())));
    assert!(location.contains("response_type=code"));
    assert!(location.contains("client_id=server-id"));
    assert!(location.contains(&format!(
        "redirect_uri={}",
        urlencoding_callback(&server.base_url())
    )));
    assert!(location.contains("scope=offline_access%20library%3Aread%20players%3Aread%20family%3Aread"));
    Ok(())
}

#[tokio::test]
async fn test_start_oauth_requires_server_mode() -> Result<()> {
    let server = TestServer::start().await?;

    let resp = server.get("/start-oauth/").send().await?;
    assert_eq!(resp.status().as_u16(), 500);
    Ok(())
}

#[tokio::test]
async fn test_player_id_cannot_reach_other_resources() -> Result<()> {
    let server = TestServer::start_server_mode(Some("server-refresh")).await?;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "srv"})))
        .mount(&server.upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/content/mine"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"cards": ["secret"]})))
        .expect(0)
        .mount(&server.upstream)
        .await;

    let resp = server.get("/players/..%2Fcontent%2Fmine/").send().await?;
    assert_eq!(resp.status().as_u16(), 500);
    let body: Value = resp.json().await?;
    assert_eq!(body["status"], "error");
    Ok(())
}

#[tokio::test]
async fn test_card_id_cannot_add_query_parameters() -> Result<()> {
    let server = TestServer::start().await?;

    Mock::given(method("GET"))
        .and(path("/content/c1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"card": {}})))
        .expect(0)
        .mount(&server.upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/content/c1%3Fplayable%3Dfalse"))
        .and(query_param("playable", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"card": {"cardId": "odd"}})))
        .expect(1)
        .mount(&server.upstream)
        .await;

    let body: Value = server
        .get("/card/c1%3Fplayable%3Dfalse/")
        .header("X-Access-Token", "user-token")
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["data"]["card"]["cardId"], "odd");
    Ok(())
}

#[tokio::test]
async fn test_callback_redirects_to_setup_in_server_mode() -> Result<()> {
    let server = TestServer::start_server_mode(None).await?;

    let resp = server
        .client
        .get(format!("{}/callback?code=abc%2B1&state=s", server.base_url()))
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 302);
    assert_eq!(
        resp.headers().get("location").and_then(|v| v.to_str().ok()),
        Some("/setup/?code=abc%2B1")
    );
    Ok(())
}

#[tokio::test]
async fn test_callback_returns_code_in_header_mode() -> Result<()> {
    let server = TestServer::start().await?;

    let body: Value = server
        .client
        .get(format!("{}/callback?code=abc&state=s", server.base_url()))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(
        body,
        json!({"status": "success", "data": {"code": "abc", "state": "s"}})
    );
    Ok(())
}

/// Expected encoding of `https://{host}/callback` for the test server.
fn urlencoding_callback(base_url: &str) -> String {
    let host = base_url.trim_start_matches("http://");
    format!("https%3A%2F%2F{}%2Fcallback", host.replace(':', "%3A"))
}
