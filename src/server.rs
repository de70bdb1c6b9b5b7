//! Webhook HTTP server.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use log::{error, info, warn};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::engine::TriggerEngine;
use crate::github::{hook, DiffClient, Hook, Push, EVENT_HEADER};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: TriggerEngine,
    pub diff: DiffClient,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub repositories: usize,
    pub jobs: usize,
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

fn message(status: StatusCode, text: impl Into<String>) -> Response {
    (status, Json(MessageResponse { message: text.into() })).into_response()
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/hook", post(handle_hook))
        .route("/health", get(health))
        .with_state(state)
}

/// Serves until the process is stopped.
pub async fn serve(listen: SocketAddr, state: Arc<AppState>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(listen).await?;
    info!("Listening for GitHub hooks on {}", listener.local_addr()?);
    axum::serve(listener, create_router(state)).await?;
    Ok(())
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let config = state.engine.config();
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        repositories: config.repositories.len(),
        jobs: config.job_count(),
    })
}

async fn handle_hook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let event = headers
        .get(EVENT_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    match hook::parse(event, &body) {
        Ok(Hook::Ping) => {
            info!("Received ping hook");
            message(StatusCode::OK, "pong")
        }
        Ok(Hook::Push(push)) => handle_push(&state, &push).await,
        Err(e) => {
            warn!("Unable to parse hook request: {e}");
            message(StatusCode::BAD_REQUEST, e.to_string())
        }
    }
}

async fn handle_push(state: &AppState, push: &Push) -> Response {
    let repository = &push.repository.name;
    info!("Received push hook for {repository} {}", push.ref_);

    if push.deleted {
        info!("Ref {} was deleted, nothing to build", push.ref_);
        return message(StatusCode::OK, "ref deleted");
    }

    if state.engine.config().lookup(repository).is_none() {
        warn!("Repository {repository} is not registered");
        return message(
            StatusCode::NOT_FOUND,
            format!("Repository {repository} is not registered"),
        );
    }

    let changed_files = match state.diff.changed_files(push).await {
        Ok(files) => files,
        Err(e) => {
            error!("Error calling diff client: {e}");
            return message(StatusCode::FAILED_DEPENDENCY, e.to_string());
        }
    };
    info!("Files changed: {changed_files:?}");

    match state
        .engine
        .trigger(repository, push.branch(), &changed_files, &push.cause())
        .await
    {
        Ok(report) => {
            let status = if report.all_succeeded() {
                StatusCode::OK
            } else {
                StatusCode::BAD_GATEWAY
            };
            (status, Json(report)).into_response()
        }
        Err(e) => message(StatusCode::NOT_FOUND, e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RawProject;
    use crate::github::hook::tests::PUSH_BODY;
    use crate::jenkins::{Dispatcher, JenkinsClient};
    use crate::model::tests::{raw_config, raw_job, secrets};
    use crate::model::CompiledConfig;
    use axum::body::Body;
    use axum::http::Request;
    use mockito::Matcher;
    use reqwest::Client;
    use std::time::Duration;
    use tower::ServiceExt;
    use url::Url;

    fn state(base_url: &str) -> Arc<AppState> {
        let mut raw = raw_config(
            base_url,
            vec![RawProject {
                path: "api/".to_string(),
                jobs: vec![raw_job("api-build", "master", "^src/")],
            }],
        );
        raw.github.api_url = base_url.to_string();
        let config = CompiledConfig::compile(&raw, &secrets()).unwrap();

        let jenkins = JenkinsClient::new(
            Client::new(),
            config.jenkins.url.clone(),
            Duration::from_secs(5),
        );
        let diff = DiffClient::new(
            Client::new(),
            Url::parse(base_url).unwrap(),
            None,
            Duration::from_secs(5),
        );

        Arc::new(AppState {
            engine: TriggerEngine::new(Arc::new(config), Dispatcher::new(jenkins)),
            diff,
        })
    }

    fn hook_request(event: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/hook")
            .header(EVENT_HEADER, event)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_ping() {
        let response = create_router(state("http://127.0.0.1:1"))
            .oneshot(hook_request("ping", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unsupported_event() {
        let response = create_router(state("http://127.0.0.1:1"))
            .oneshot(hook_request("issues", "{}"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_repository() {
        let body = PUSH_BODY.replace("\"name\": \"repo\"", "\"name\": \"other\"");
        let response = create_router(state("http://127.0.0.1:1"))
            .oneshot(hook_request("push", &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_push_triggers_matching_job() {
        let mut server = mockito::Server::new_async().await;
        let diff = server
            .mock("GET", Matcher::Regex(r"^/repos/owner/repo/compare/".to_string()))
            .with_status(200)
            .with_body("diff --git a/api/src/main.rs b/api/src/main.rs\n")
            .create_async()
            .await;
        let jenkins = server
            .mock("GET", "/job/api-build/build")
            .match_query(Matcher::UrlEncoded(
                "cause".into(),
                "Push by owner to owner/repo master (0d1a26e)".into(),
            ))
            .with_status(201)
            .create_async()
            .await;

        let response = create_router(state(&server.url()))
            .oneshot(hook_request("push", PUSH_BODY))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["repository"], "repo");
        assert_eq!(body["ref"], "master");
        assert_eq!(body["outcomes"][0]["job"], "api-build");
        assert_eq!(body["outcomes"][0]["succeeded"], true);
        diff.assert_async().await;
        jenkins.assert_async().await;
    }

    #[tokio::test]
    async fn test_push_with_failed_trigger() {
        let mut server = mockito::Server::new_async().await;
        let _diff = server
            .mock("GET", Matcher::Regex(r"^/repos/".to_string()))
            .with_status(200)
            .with_body("diff --git a/api/src/main.rs b/api/src/main.rs\n")
            .create_async()
            .await;
        let _jenkins = server
            .mock("GET", "/job/api-build/build")
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let response = create_router(state(&server.url()))
            .oneshot(hook_request("push", PUSH_BODY))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = json_body(response).await;
        assert_eq!(body["outcomes"][0]["succeeded"], false);
    }

    #[tokio::test]
    async fn test_push_with_failed_diff() {
        let mut server = mockito::Server::new_async().await;
        let _diff = server
            .mock("GET", Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let response = create_router(state(&server.url()))
            .oneshot(hook_request("push", PUSH_BODY))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FAILED_DEPENDENCY);
    }

    #[tokio::test]
    async fn test_health() {
        let response = create_router(state("http://127.0.0.1:1"))
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["repositories"], 1);
        assert_eq!(body["jobs"], 1);
    }
}
