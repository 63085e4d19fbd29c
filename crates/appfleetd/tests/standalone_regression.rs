//! Admin API regression tests.
//!
//! Drives the router in-process against the in-memory platform: admin
//! auth, directory view, deploy with policy overrides, config round trip,
//! and the error shape front ends rely on.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use appfleet_api::{ApiState, build_router};
use appfleet_core::AppDeploymentConfig;
use appfleet_deployer::{ConfigPropagator, Deployer};
use appfleet_platform::{ConfigVars, Credential, MemoryPlatform};
use appfleet_rollout::PollConfig;
use appfleet_state::{AccountDirectory, CredentialSource};

const PASS: &str = "hunter2";

async fn test_router() -> (MemoryPlatform, Router) {
    let platform = MemoryPlatform::new();
    platform.add_account("A", "tok-a", 1000, 100).await;
    platform.add_account("B", "tok-b", 1000, 900).await;
    platform.add_app("B", "legacy", 40).await;

    let directory = Arc::new(AccountDirectory::new(
        Arc::new(platform.clone()),
        CredentialSource::Static(vec![
            Credential::new("A", "tok-a"),
            Credential::new("B", "tok-b"),
        ]),
    ));
    let apps = BTreeMap::from([(
        "myapp".to_string(),
        AppDeploymentConfig {
            targz_url: Some("http://x/y.tgz".to_string()),
            preferred_account: Some("A".to_string()),
            allowed_accounts: None,
        },
    )]);
    let deployer = Deployer::new(
        Arc::new(platform.clone()),
        directory,
        apps,
        ConfigPropagator::new(ConfigVars::new()),
    )
    .with_poll_config(PollConfig::immediate(30));

    let state = ApiState::new(Arc::new(deployer), Some(PASS.to_string()), "appfleet-test");
    (platform, build_router(state))
}

async fn post(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();

    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn init_is_public() {
    let (_, router) = test_router().await;
    let req = Request::builder().uri("/api/init").body(Body::empty()).unwrap();

    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["data"]["index_title"], "appfleet-test");
    assert!(body["data"]["server_started_at"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn wrong_password_is_refused_without_platform_calls() {
    let (platform, router) = test_router().await;

    for body in [json!({}), json!({"ADMIN_PASS": "nope"})] {
        let (status, resp) = post(&router, "/api/appman", body).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(resp["success"], false);
        assert_eq!(resp["error"], "not_authorized");
    }

    let (status, _) = post(&router, "/api/apps/myapp/deploy", json!({"ADMIN_PASS": "x"})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(platform.calls().await.is_empty());
}

#[tokio::test]
async fn unknown_strategy_gets_json_envelope() {
    let (platform, router) = test_router().await;
    let (status, resp) = post(
        &router,
        "/api/apps/myapp/deploy",
        json!({"ADMIN_PASS": PASS, "selection_strategy": "sideways"}),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(resp["success"], false);
    assert_eq!(resp["error"], "invalid_request");
    assert_eq!(resp["kind"], "invalid_params");
    assert!(platform.calls().await.is_empty());
}

#[tokio::test]
async fn missing_content_type_gets_json_envelope() {
    let (platform, router) = test_router().await;
    let req = Request::builder()
        .method("POST")
        .uri("/api/appman")
        .body(Body::from("{}"))
        .unwrap();

    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "invalid_request");
    assert!(platform.calls().await.is_empty());
}

#[tokio::test]
async fn appman_refreshes_and_returns_directory() {
    let (_, router) = test_router().await;
    let (status, resp) = post(&router, "/api/appman", json!({"ADMIN_PASS": PASS})).await;

    assert_eq!(status, StatusCode::OK);
    let data = &resp["data"];
    assert_eq!(data["refresh"]["accounts"], 2);
    assert_eq!(data["accounts"][1]["name"], "B");
    assert_eq!(data["accounts"][1]["apps"][0]["name"], "legacy");
    assert_eq!(data["accounts"][1]["apps"][0]["quota_used"], 40);
    assert_eq!(data["configured_apps"], json!(["myapp"]));
    assert!(!resp.to_string().contains("tok-a"));
}

#[tokio::test]
async fn deploy_uses_preferred_account() {
    let (platform, router) = test_router().await;
    let (status, resp) = post(&router, "/api/apps/myapp/deploy", json!({"ADMIN_PASS": PASS})).await;

    assert_eq!(status, StatusCode::OK, "{resp}");
    assert_eq!(resp["data"]["account"], "A");
    assert_eq!(resp["data"]["build_status"], "succeeded");
    assert_eq!(platform.apps_of("A").await, ["myapp"]);
}

#[tokio::test]
async fn deploy_failure_carries_code_kind_and_message() {
    let (platform, router) = test_router().await;
    let (status, resp) = post(
        &router,
        "/api/apps/myapp/deploy",
        json!({"ADMIN_PASS": PASS, "selection_strategy": "manual"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["success"], false);
    assert_eq!(resp["error"], "missing_target");
    assert_eq!(resp["kind"], "invalid_params");
    assert!(resp["message"].as_str().unwrap().contains("deploy target"));
    assert!(platform.mutating_calls().await.is_empty());
}

#[tokio::test]
async fn deploy_conflict_maps_to_409() {
    let (_, router) = test_router().await;
    let (status, resp) = post(
        &router,
        "/api/apps/legacy/deploy",
        json!({"ADMIN_PASS": PASS}),
    )
    .await;
    // No deployment config for legacy.
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(resp["error"], "no_config_for_app");

    let (platform, router) = test_router().await;
    platform.add_app("B", "myapp", 0).await;
    let (status, resp) = post(
        &router,
        "/api/apps/myapp/deploy",
        json!({"ADMIN_PASS": PASS, "migration_strategy": "disabled"}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(resp["kind"], "conflict");
}

#[tokio::test]
async fn config_set_then_get() {
    let (_, router) = test_router().await;
    let (status, _) = post(
        &router,
        "/api/apps/legacy/config/set",
        json!({"ADMIN_PASS": PASS, "config": {"K": "V"}}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, resp) = post(&router, "/api/apps/legacy/config", json!({"ADMIN_PASS": PASS})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["data"]["K"], "V");
}

#[tokio::test]
async fn builds_and_delete_for_unknown_app_are_not_found() {
    let (_, router) = test_router().await;
    for uri in ["/api/apps/ghost/builds", "/api/apps/ghost/delete"] {
        let (status, resp) = post(&router, uri, json!({"ADMIN_PASS": PASS})).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(resp["error"], "app_not_found");
    }
}

#[tokio::test]
async fn delete_removes_app() {
    let (platform, router) = test_router().await;
    let (status, resp) = post(&router, "/api/apps/legacy/delete", json!({"ADMIN_PASS": PASS})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["data"]["account"], "B");
    assert!(platform.apps_of("B").await.is_empty());
}
