#![allow(dead_code)]

use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use primer_core::dispatch::DispatchPolicy;
use primer_core::types::Candidate;
use primer_store::JobStore;
use serde_json::Value;
use tower::ServiceExt;

use primer_api::config::{RunnerKind, ServerConfig, StoreBackend};
use primer_api::router::build_app_router;
use primer_api::state::AppState;

/// Build a test `ServerConfig` with the given dispatch limits, an
/// in-memory store and the in-process runner.
pub fn test_config(async_limit: Candidate, compute_limit: Candidate) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        policy: DispatchPolicy::new(async_limit, compute_limit).unwrap(),
        store: StoreBackend::Memory,
        runner: RunnerKind::Task,
        stale_job_secs: 3600,
        stale_job_check_secs: 60,
    }
}

/// Build the full application router from `config`, returning the state
/// too so tests can inspect the job store directly.
pub async fn build_test_app(config: ServerConfig) -> (Router, AppState) {
    let state = AppState::from_config(config).await.unwrap();
    (build_app_router(state.clone()), state)
}

/// Router with the production default limits.
pub async fn default_app() -> (Router, AppState) {
    let defaults = DispatchPolicy::default();
    build_test_app(test_config(defaults.async_limit(), defaults.compute_limit())).await
}

pub async fn send(app: Router, method: Method, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri).await
}

pub async fn post(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::POST, uri).await
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// GET `uri` and decode the JSON body.
pub async fn get_json(app: &Router, uri: &str) -> Value {
    body_json(get(app.clone(), uri).await).await
}

/// Poll `?key=` until the job reports `complete`.
pub async fn poll_until_complete(app: &Router, key: &str) -> Value {
    for _ in 0..500 {
        let json = get_json(app, &format!("/?key={key}")).await;
        if json["message"] == "complete" {
            return json;
        }
        assert_eq!(json["message"], "processing", "unexpected poll body: {json}");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {key} did not complete in time");
}

/// Number of records the store is still waiting on.
pub async fn pending_count(store: &dyn JobStore) -> usize {
    store.list_pending().await.unwrap().len()
}
