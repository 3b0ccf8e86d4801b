//! Axum router configuration with middleware.
//!
//! Will routes are under `/api`; `/health` sits at the root.
//! Middleware: CORS, tracing.

use axum::Router;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/will", post(handlers::will::create_will))
        .route("/will/seal", post(handlers::will::seal_will))
        .route("/will/{owner}", get(handlers::will::get_will))
        .route("/will/{owner}/execute", post(handlers::will::execute_will))
        .route("/will/{owner}/reveal", post(handlers::will::reveal_payload))
        .route(
            "/will/{owner}/countdown",
            get(handlers::countdown::get_countdown),
        )
        .route(
            "/will/{owner}/countdown/ws",
            get(handlers::countdown::countdown_ws),
        )
        .route(
            "/will/{owner}/history",
            get(handlers::history::will_history),
        )
        .route("/history", get(handlers::history::recent_history));

    Router::new()
        .nest("/api", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    axum::Json(json!({
        "ok": true,
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, SecondsFormat, Utc};
    use serde_json::Value;

    use crate::state::test_support::memory_state;

    fn addr(c: char) -> String {
        format!("G{}", c.to_string().repeat(55))
    }

    async fn spawn_app() -> (String, tempfile::TempDir) {
        let (state, dir) = memory_state().await;
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, build_router(state)).await.unwrap();
        });
        (base, dir)
    }

    fn seal_body(owner: &str, unlock_in: Duration) -> Value {
        json!({
            "owner": owner,
            "beneficiaries": [addr('A'), { "address": addr('B'), "share": 3 }],
            "amount": 400,
            "unlockTimestamp": (Utc::now() + unlock_in).to_rfc3339_opts(SecondsFormat::Millis, true),
            "payload": "the safe code is 1234",
        })
    }

    async fn post(client: &reqwest::Client, url: String, body: &Value) -> (u16, Value) {
        let resp = client.post(url).json(body).send().await.unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }

    async fn get_json(client: &reqwest::Client, url: String) -> (u16, Value) {
        let resp = client.get(url).send().await.unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (base, _dir) = spawn_app().await;
        let (status, body) = get_json(&reqwest::Client::new(), format!("{base}/health")).await;
        assert_eq!(status, 200);
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn test_create_requires_fields() {
        let (base, _dir) = spawn_app().await;
        let client = reqwest::Client::new();

        let (status, body) = post(
            &client,
            format!("{base}/api/will"),
            &json!({ "owner": addr('O'), "contentHash": "abc", "beneficiaries": [addr('A')] }),
        )
        .await;
        assert_eq!(status, 400);
        assert_eq!(body["ok"], false);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(body["error"]["message"].as_str().unwrap().contains("unlockTimestamp"));

        let unlock = (Utc::now() + Duration::days(1)).to_rfc3339();
        let (status, body) = post(
            &client,
            format!("{base}/api/will"),
            &json!({ "contentHash": "abc", "beneficiaries": [addr('A')], "unlockTimestamp": unlock }),
        )
        .await;
        assert_eq!(status, 400);
        assert!(body["error"]["message"].as_str().unwrap().contains("owner is required"));

        let resp = client
            .post(format!("{base}/api/will"))
            .header("content-type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 400);
    }

    #[tokio::test]
    async fn test_create_registers_locked_will() {
        let (base, _dir) = spawn_app().await;
        let client = reqwest::Client::new();
        let owner = addr('O');

        let (status, body) = post(
            &client,
            format!("{base}/api/will"),
            &json!({
                "owner": owner,
                "contentHash": "bafyexamplecontenthash",
                "beneficiaries": [addr('A')],
                "unlockTimestamp": (Utc::now() + Duration::days(2)).to_rfc3339(),
            }),
        )
        .await;
        assert_eq!(status, 201);
        assert!(!body["txId"].as_str().unwrap().is_empty());

        let (status, will) = get_json(&client, format!("{base}/api/will/{owner}")).await;
        assert_eq!(status, 200);
        assert_eq!(will["status"], "locked");
        assert_eq!(will["payloadReference"], "bafyexamplecontenthash");
        assert_eq!(will["createdTxId"], body["txId"]);
    }

    #[tokio::test]
    async fn test_locked_will_cannot_execute_or_reveal() {
        let (base, _dir) = spawn_app().await;
        let client = reqwest::Client::new();
        let owner = addr('L');

        let (status, sealed) =
            post(&client, format!("{base}/api/will/seal"), &seal_body(&owner, Duration::hours(25))).await;
        assert_eq!(status, 201);
        let key = sealed["generatedKey"].as_str().unwrap().to_string();

        let (status, countdown) =
            get_json(&client, format!("{base}/api/will/{owner}/countdown")).await;
        assert_eq!(status, 200);
        assert_eq!(countdown["state"], "locked");
        assert_eq!(countdown["remaining"]["days"], 1);

        let (status, body) =
            post(&client, format!("{base}/api/will/{owner}/execute"), &json!({})).await;
        assert_eq!(status, 409);
        assert_eq!(body["error"]["code"], "NOT_YET_UNLOCKABLE");
        assert_eq!(body["error"]["remaining"]["days"], 1);

        let (status, body) = post(
            &client,
            format!("{base}/api/will/{owner}/reveal"),
            &json!({ "key": key }),
        )
        .await;
        assert_eq!(status, 409);
        assert_eq!(body["error"]["code"], "NOT_YET_UNLOCKABLE");

        let (_, history) = get_json(&client, format!("{base}/api/will/{owner}/history")).await;
        assert_eq!(history["entries"].as_array().unwrap().len(), 1);
        assert_eq!(history["entries"][0]["kind"], "create");
    }

    #[tokio::test]
    async fn test_unknown_and_invalid_owner() {
        let (base, _dir) = spawn_app().await;
        let client = reqwest::Client::new();

        let (status, body) = get_json(&client, format!("{base}/api/will/{}", addr('Z'))).await;
        assert_eq!(status, 404);
        assert_eq!(body["error"]["code"], "NOT_FOUND");

        let (status, body) = get_json(&client, format!("{base}/api/will/not-an-address")).await;
        assert_eq!(status, 400);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_unlocked_will_executes_once_and_reveals() {
        let (base, _dir) = spawn_app().await;
        let client = reqwest::Client::new();
        let owner = addr('U');

        let (status, sealed) = post(
            &client,
            format!("{base}/api/will/seal"),
            &seal_body(&owner, Duration::milliseconds(1_500)),
        )
        .await;
        assert_eq!(status, 201);
        let key = sealed["generatedKey"].as_str().unwrap().to_string();

        tokio::time::sleep(std::time::Duration::from_millis(2_000)).await;

        let (status, first) =
            post(&client, format!("{base}/api/will/{owner}/execute"), &json!({})).await;
        assert_eq!(status, 200);
        assert_eq!(first["alreadyExecuted"], false);

        let (status, second) =
            post(&client, format!("{base}/api/will/{owner}/execute"), &json!({})).await;
        assert_eq!(status, 200);
        assert_eq!(second["alreadyExecuted"], true);
        assert_eq!(second["txId"], first["txId"]);

        let (status, revealed) = post(
            &client,
            format!("{base}/api/will/{owner}/reveal"),
            &json!({ "key": key }),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(revealed["payload"], "the safe code is 1234");
        assert_eq!(revealed["encoding"], "utf8");

        let (status, wrong) = post(
            &client,
            format!("{base}/api/will/{owner}/reveal"),
            &json!({ "secret": "not the right secret" }),
        )
        .await;
        assert_eq!(status, 422);
        assert_eq!(wrong["error"]["code"], "DECRYPTION_FAILED");

        let (_, will) = get_json(&client, format!("{base}/api/will/{owner}")).await;
        assert_eq!(will["status"], "executed");
        assert_eq!(will["executedTxId"], first["txId"]);

        let (_, history) = get_json(&client, format!("{base}/api/will/{owner}/history")).await;
        let kinds: Vec<&str> = history["entries"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["kind"].as_str().unwrap())
            .collect();
        assert_eq!(kinds, vec!["create", "execute"]);

        let (_, recent) = get_json(&client, format!("{base}/api/history?limit=1")).await;
        assert_eq!(recent["entries"].as_array().unwrap().len(), 1);
        assert_eq!(recent["entries"][0]["kind"], "execute");
    }

    #[tokio::test]
    async fn test_reveal_requires_key_or_secret() {
        let (base, _dir) = spawn_app().await;
        let client = reqwest::Client::new();
        let owner = addr('R');

        post(&client, format!("{base}/api/will/seal"), &seal_body(&owner, Duration::hours(1))).await;

        let (status, body) = post(
            &client,
            format!("{base}/api/will/{owner}/reveal"),
            &json!({ "key": "!!not base64!!" }),
        )
        .await;
        assert_eq!(status, 400);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_history_limit_must_be_positive() {
        let (base, _dir) = spawn_app().await;
        let (status, body) =
            get_json(&reqwest::Client::new(), format!("{base}/api/history?limit=0")).await;
        assert_eq!(status, 400);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }
}
