//! HTTP server.
//!
//! One route, one handler. The walk itself is blocking filesystem I/O,
//! so it runs under `spawn_blocking` to keep the runtime responsive.

use crate::auth::AdminAuth;
use crate::protocol::{templates_route, ErrorBody};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use trellis_index::{build_index, IndexOptions, IndexRoot};

/// Errors from running the server.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// What every request needs: where to look and who may ask.
#[derive(Debug, Clone)]
pub struct ServiceState {
    pub roots: Vec<IndexRoot>,
    pub options: IndexOptions,
    pub auth: AdminAuth,
}

/// Network configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// Mount point of the admin area, e.g. `/admin`.
    pub admin_base: String,
}

/// Builds the router serving the templates endpoint under `admin_base`.
pub fn router(state: ServiceState, admin_base: &str) -> Router {
    Router::new()
        .route(&templates_route(admin_base), get(list_templates))
        .with_state(Arc::new(state))
}

async fn list_templates(State(state): State<Arc<ServiceState>>, headers: HeaderMap) -> Response {
    if let Err(denied) = state.auth.authorize(&headers) {
        return denied.status().into_response();
    }

    let job = Arc::clone(&state);
    let outcome = tokio::task::spawn_blocking(move || build_index(&job.roots, &job.options)).await;

    match outcome {
        Ok(Ok(result)) => Json(result.into_response()).into_response(),
        Ok(Err(e)) => {
            error!("Template index failed: {}", e);
            internal_error()
        }
        Err(e) => {
            error!("Template index task panicked: {}", e);
            internal_error()
        }
    }
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody::index_failed()),
    )
        .into_response()
}

/// The template index HTTP server.
pub struct TrellisServer {
    state: ServiceState,
    config: ServerConfig,
}

impl TrellisServer {
    pub fn new(state: ServiceState, config: ServerConfig) -> Self {
        Self { state, config }
    }

    /// Full route the endpoint is served at.
    pub fn route(&self) -> String {
        templates_route(&self.config.admin_base)
    }

    /// Binds and serves until Ctrl+C.
    pub async fn run(self) -> Result<(), ServerError> {
        let addr = self.config.addr;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        if !self.state.auth.has_tokens() {
            warn!("No admin tokens configured; every request will be rejected");
        }
        info!("Serving templates at http://{}{}", addr, self.route());

        let app = router(self.state, &self.config.admin_base);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(ServerError::Serve)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::header::AUTHORIZATION;
    use axum::http::Request;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;
    use tower::ServiceExt;
    use trellis_core::TemplatesResponse;

    const ROUTE: &str = "/admin/template-service/templates";

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    fn app(roots: Vec<IndexRoot>) -> Router {
        let state = ServiceState {
            roots,
            options: IndexOptions::default(),
            auth: AdminAuth::new(vec!["s3cret".to_string()]),
        };
        router(state, "/admin")
    }

    fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_lists_templates_in_order() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "index.twig");
        touch(dir.path(), "_layout/base.twig");
        touch(dir.path(), "blog/post.twig");

        let response = app(vec![IndexRoot::required(dir.path(), "")])
            .oneshot(get_request(ROUTE, Some("s3cret")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let parsed: TemplatesResponse = serde_json::from_slice(&body).unwrap();
        let paths: Vec<_> = parsed.templates.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["_layout/base", "blog", "blog/post", "index"]);

        let raw: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(raw["templates"][1]["type"], "folder");
        assert_eq!(raw["templates"][2]["fullLabel"], "└ post (blog)");
        assert!(raw["templates"][3].get("fullLabel").is_none());
    }

    #[tokio::test]
    async fn test_missing_credentials_are_unauthorized() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "index.twig");

        let response = app(vec![IndexRoot::required(dir.path(), "")])
            .oneshot(get_request(ROUTE, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_wrong_token_is_forbidden() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "index.twig");

        let response = app(vec![IndexRoot::required(dir.path(), "")])
            .oneshot(get_request(ROUTE, Some("guess")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_missing_site_root_is_not_an_error() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "index.twig");

        let roots = vec![
            IndexRoot::optional(dir.path().join("de"), "de"),
            IndexRoot::required(dir.path(), ""),
        ];
        let response = app(roots)
            .oneshot(get_request(ROUTE, Some("s3cret")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let parsed: TemplatesResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.templates.len(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unreadable_root_is_a_server_error() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let locked = dir.path().join("templates");
        touch(&locked, "index.twig");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        let enforced = fs::read_dir(&locked).is_err();

        let response = app(vec![IndexRoot::required(&locked, "")])
            .oneshot(get_request(ROUTE, Some("s3cret")))
            .await
            .unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        // Permissions are not enforced for root.
        if !enforced {
            return;
        }

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let parsed: ErrorBody = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed, ErrorBody::index_failed());
    }

    #[tokio::test]
    async fn test_other_routes_are_not_served() {
        let response = app(Vec::new())
            .oneshot(get_request("/template-service/templates", Some("s3cret")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
