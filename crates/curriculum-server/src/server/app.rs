//! Axum application setup.

use std::net::SocketAddr;

use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method, header},
    routing::{get, post},
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

use super::client::USER_ID_HEADER;
use super::handlers;
use super::state::AppState;

/// Build the CORS layer.
///
/// With no configured origins any origin is allowed without credentials.
/// Otherwise only the listed origins are allowed, with credentials.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .map(|o| o.trim())
        .filter(|o| !o.is_empty())
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(USER_ID_HEADER),
        ])
        .allow_credentials(true)
}

/// Create the Axum router with all routes.
pub fn create_router(state: AppState, cors_origins: &[String]) -> Router {
    let content_routes = Router::new()
        .route("/", post(handlers::post_content))
        // Listings
        .route("/domains", get(handlers::list_domains))
        .route("/clusters", get(handlers::list_clusters))
        .route("/concepts", get(handlers::list_concepts))
        .route("/exercises", get(handlers::list_exercises))
        // Point lookups
        .route("/domains/:id", get(handlers::get_domain))
        .route("/clusters/:id", get(handlers::get_cluster))
        .route("/concepts/:id", get(handlers::get_concept))
        .route("/exercises/:id", get(handlers::get_exercise))
        // Traversal
        .route("/clusters/:id/concepts", get(handlers::get_cluster_concepts))
        .route("/lessons/:id", get(handlers::get_lesson))
        // Maintenance
        .route("/diagnostics", get(handlers::get_diagnostics))
        .route("/reload", post(handlers::reload_content));

    Router::new()
        .nest("/content", content_routes)
        .route("/sandbox", post(handlers::post_sandbox))
        .route("/log", post(handlers::post_log))
        .route("/log/stats", get(handlers::get_log_stats))
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

/// Start the web server.
pub async fn run_server(
    state: AppState,
    addr: SocketAddr,
    cors_origins: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(state, cors_origins);

    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use curriculum::interaction::{InteractionLogConfig, InteractionLogger};
    use curriculum::{ContentConfig, ContentStore};
    use serde_json::{Value, json};
    use tempfile::TempDir;
    use tower::ServiceExt;

    struct Fixture {
        _content: TempDir,
        logs: TempDir,
        router: Router,
    }

    fn fixture() -> Fixture {
        let content = TempDir::new().unwrap();
        fs::write(
            content.path().join("CURRICULUM.yaml"),
            "domains:\n  - {id: d1, name: D, inquiry: q, clusterIds: [c1]}\n\
             clusters:\n  - {id: c1, name: C, domainId: d1, conceptIds: [x2, x9, x1]}\n",
        )
        .unwrap();
        fs::write(
            content.path().join("lesson-01.yaml"),
            "concepts:\n  - {id: x1, name: One, inquiry: q, objective: o, reflectionPrompts: [p], reflectionTargets: [t]}\n  \
             - {id: x2, name: Two, inquiry: q, objective: o, reflectionPrompts: [p], reflectionTargets: [t]}\n",
        )
        .unwrap();

        let logs = TempDir::new().unwrap();
        let store = ContentStore::new(&ContentConfig::new(content.path())).unwrap();
        let logger = InteractionLogger::new(InteractionLogConfig::new(logs.path()));
        let router = create_router(AppState::new(store, logger), &[]);

        Fixture {
            _content: content,
            logs,
            router,
        }
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .header(USER_ID_HEADER, "learner-1")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn logged_lines(fixture: &Fixture) -> Vec<Value> {
        let path = fixture.logs.path().join("app.log");
        fs::read_to_string(path)
            .unwrap_or_default()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_post_content_concepts_by_cluster() {
        let fixture = fixture();
        let (status, body) = send(
            &fixture.router,
            post_json(
                "/content",
                json!({"operation": "conceptsByCluster", "variables": {"clusterId": "c1"}}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let concepts = body["data"]["conceptsByCluster"].as_array().unwrap();
        let ids: Vec<&str> = concepts.iter().map(|c| c["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["x2", "x1"]);

        let lines = logged_lines(&fixture);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["endpoint"], "/content");
        assert_eq!(lines[0]["user_id"], "learner-1");
        assert_eq!(lines[0]["success"], true);
    }

    #[tokio::test]
    async fn test_post_content_empty_id_is_bad_request() {
        let fixture = fixture();
        let (status, body) = send(
            &fixture.router,
            post_json("/content", json!({"query": "concept", "variables": {"id": ""}})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["errors"][0]["message"].as_str().unwrap().contains("non-empty"));
        assert_eq!(logged_lines(&fixture)[0]["success"], false);
    }

    #[tokio::test]
    async fn test_post_content_malformed_body_uses_error_envelope() {
        let fixture = fixture();

        for body in [
            json!({"variables": {"id": "x1"}}),
            json!({"operation": "getConcept", "variables": ["x1"]}),
        ] {
            let (status, body) = send(&fixture.router, post_json("/content", body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(body["errors"][0]["message"].is_string());
        }
        assert_eq!(logged_lines(&fixture).len(), 2);
    }

    #[tokio::test]
    async fn test_post_content_not_found_is_null() {
        let fixture = fixture();
        let (status, body) = send(
            &fixture.router,
            post_json(
                "/content",
                json!({"operation": "lessonById", "variables": {"lessonId": "lesson-missing"}}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["data"]["lessonById"].is_null());
    }

    #[tokio::test]
    async fn test_rest_routes() {
        let fixture = fixture();

        let (status, body) = send(&fixture.router, get("/content/concepts")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);

        let (status, body) = send(&fixture.router, get("/content/domains/d1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["clusterIds"][0], "c1");

        let (status, body) = send(&fixture.router, get("/content/concepts/x404")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");

        let (status, body) = send(&fixture.router, get("/content/lessons/lesson-01")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], "x1");

        let (status, body) = send(&fixture.router, get("/content/clusters/c1/concepts")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_diagnostics_and_reload() {
        let fixture = fixture();

        let (status, body) = send(&fixture.router, get("/content/diagnostics")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cache_policy"], "rebuild");
        assert_eq!(body["summary"]["dangling_references"], 1);
        assert_eq!(body["dangling_references"][0]["target_id"], "x9");

        let (status, body) = send(&fixture.router, post_json("/content/reload", json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["revision"].as_str().unwrap().starts_with("sha256:"));
        assert_eq!(body["changed"], false);
    }

    #[tokio::test]
    async fn test_sandbox() {
        let fixture = fixture();

        let (status, body) =
            send(&fixture.router, post_json("/sandbox", json!({"query": "{ ping }"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["ping"], "sandbox-pong");

        let (status, body) =
            send(&fixture.router, post_json("/sandbox", json!({"query": "{ users }"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["errors"].is_array());
        assert_eq!(logged_lines(&fixture).len(), 2);
    }

    #[tokio::test]
    async fn test_log_endpoint_and_stats() {
        let fixture = fixture();

        let (status, body) = send(
            &fixture.router,
            post_json(
                "/log",
                json!({"query": "{ ping }", "response": "pong", "success": true, "endpoint": "/sandbox"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "logged");
        assert!(body["log_id"].as_str().unwrap().contains('-'));

        let lines = logged_lines(&fixture);
        assert_eq!(lines[0]["endpoint"], "/sandbox");
        assert_eq!(lines[0]["response"], "pong");

        let (status, body) = send(&fixture.router, get("/log/stats")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["log_file_exists"], true);
    }
}
