//! Content query handlers.
//!
//! `POST /content` takes a named operation with variables and answers in a
//! `{ "data": ... }` / `{ "errors": [...] }` envelope. The `GET` routes are
//! REST shortcuts over the same operations. Every request is recorded in the
//! interaction log once the query service has answered.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use curriculum::content::{DanglingReference, DocumentInfo, DuplicateId, GraphSummary};
use curriculum::{CachePolicy, EntityKind, InteractionRecord, Query, QueryOutput};

use crate::server::client::ClientInfo;
use crate::server::error::ApiError;
use crate::server::state::AppState;

const CONTENT_ENDPOINT: &str = "/content";

/// Request body for `POST /content`.
#[derive(Debug, Deserialize)]
pub struct ContentRequest {
    #[serde(alias = "query")]
    pub operation: String,
    #[serde(default)]
    pub variables: Option<Map<String, Value>>,
}

/// Execute a query off the async workers and record the interaction.
async fn run_query(
    state: &AppState,
    client: &ClientInfo,
    query_text: String,
    query: Result<Query, curriculum::CurriculumError>,
) -> Result<QueryOutput, ApiError> {
    let result = match query {
        Ok(query) => {
            let service = state.service.clone();
            tokio::task::spawn_blocking(move || service.execute(&query))
                .await
                .map_err(ApiError::from)
                .and_then(|r| r.map_err(ApiError::from))
        }
        Err(e) => Err(ApiError::from(e)),
    };

    let response = match &result {
        Ok(output) => serde_json::to_value(output).unwrap_or(Value::Null),
        Err(e) => Value::String(e.message()),
    };
    let record = InteractionRecord::new(CONTENT_ENDPOINT, query_text)
        .with_response(response, result.is_ok());
    state.record(client.apply(record)).await;

    result
}

/// POST /content - Execute a named content operation.
pub async fn post_content(
    State(state): State<AppState>,
    client: ClientInfo,
    request: Result<Json<ContentRequest>, JsonRejection>,
) -> Response {
    let request = match request {
        Ok(Json(request)) => request,
        Err(rejection) => {
            let error = ApiError::BadRequest(rejection.body_text());
            let record = InteractionRecord::new(CONTENT_ENDPOINT, String::new())
                .with_response(Value::String(error.message()), false);
            state.record(client.apply(record)).await;
            return errors_envelope(&error);
        }
    };

    let variables = request.variables.unwrap_or_default();
    let query = Query::parse(&request.operation, &variables);
    let query_text = match &query {
        Ok(q) => q.to_string(),
        Err(_) => request.operation.clone(),
    };
    let operation = match &query {
        Ok(q) => q.operation().to_string(),
        Err(_) => request.operation.trim().to_string(),
    };

    match run_query(&state, &client, query_text, query).await {
        Ok(output) => {
            let mut data = Map::new();
            data.insert(
                operation,
                serde_json::to_value(&output).unwrap_or(Value::Null),
            );
            Json(json!({ "data": data })).into_response()
        }
        Err(e) => errors_envelope(&e),
    }
}

fn errors_envelope(error: &ApiError) -> Response {
    (
        error.status(),
        Json(json!({ "errors": [{ "message": error.message() }] })),
    )
        .into_response()
}

async fn list(
    state: AppState,
    client: ClientInfo,
    kind: EntityKind,
) -> Result<Json<QueryOutput>, ApiError> {
    let query = Query::List(kind);
    let output = run_query(&state, &client, query.to_string(), Ok(query)).await?;
    Ok(Json(output))
}

async fn get_one(
    state: AppState,
    client: ClientInfo,
    query: Query,
    what: String,
) -> Result<Json<QueryOutput>, ApiError> {
    let output = run_query(&state, &client, query.to_string(), Ok(query)).await?;
    if output.is_not_found() {
        return Err(ApiError::NotFound(what));
    }
    Ok(Json(output))
}

fn get_query(kind: EntityKind, id: String) -> (Query, String) {
    let what = format!("{} '{}'", kind, id);
    (Query::Get { kind, id }, what)
}

/// GET /content/domains
pub async fn list_domains(
    State(state): State<AppState>,
    client: ClientInfo,
) -> Result<Json<QueryOutput>, ApiError> {
    list(state, client, EntityKind::Domain).await
}

/// GET /content/clusters
pub async fn list_clusters(
    State(state): State<AppState>,
    client: ClientInfo,
) -> Result<Json<QueryOutput>, ApiError> {
    list(state, client, EntityKind::Cluster).await
}

/// GET /content/concepts
pub async fn list_concepts(
    State(state): State<AppState>,
    client: ClientInfo,
) -> Result<Json<QueryOutput>, ApiError> {
    list(state, client, EntityKind::Concept).await
}

/// GET /content/exercises
pub async fn list_exercises(
    State(state): State<AppState>,
    client: ClientInfo,
) -> Result<Json<QueryOutput>, ApiError> {
    list(state, client, EntityKind::Exercise).await
}

/// GET /content/domains/:id
pub async fn get_domain(
    State(state): State<AppState>,
    client: ClientInfo,
    Path(id): Path<String>,
) -> Result<Json<QueryOutput>, ApiError> {
    let (query, what) = get_query(EntityKind::Domain, id);
    get_one(state, client, query, what).await
}

/// GET /content/clusters/:id
pub async fn get_cluster(
    State(state): State<AppState>,
    client: ClientInfo,
    Path(id): Path<String>,
) -> Result<Json<QueryOutput>, ApiError> {
    let (query, what) = get_query(EntityKind::Cluster, id);
    get_one(state, client, query, what).await
}

/// GET /content/concepts/:id
pub async fn get_concept(
    State(state): State<AppState>,
    client: ClientInfo,
    Path(id): Path<String>,
) -> Result<Json<QueryOutput>, ApiError> {
    let (query, what) = get_query(EntityKind::Concept, id);
    get_one(state, client, query, what).await
}

/// GET /content/exercises/:id
pub async fn get_exercise(
    State(state): State<AppState>,
    client: ClientInfo,
    Path(id): Path<String>,
) -> Result<Json<QueryOutput>, ApiError> {
    let (query, what) = get_query(EntityKind::Exercise, id);
    get_one(state, client, query, what).await
}

/// GET /content/clusters/:id/concepts - Concepts of a cluster, in cluster order.
pub async fn get_cluster_concepts(
    State(state): State<AppState>,
    client: ClientInfo,
    Path(cluster_id): Path<String>,
) -> Result<Json<QueryOutput>, ApiError> {
    let query = Query::ConceptsByCluster { cluster_id };
    let output = run_query(&state, &client, query.to_string(), Ok(query)).await?;
    Ok(Json(output))
}

/// GET /content/lessons/:id - Primary concept of a lesson document.
pub async fn get_lesson(
    State(state): State<AppState>,
    client: ClientInfo,
    Path(lesson_id): Path<String>,
) -> Result<Json<QueryOutput>, ApiError> {
    let what = format!("lesson '{}'", lesson_id);
    get_one(state, client, Query::LessonById { lesson_id }, what).await
}

/// Response for the diagnostics endpoint.
#[derive(Serialize)]
pub struct DiagnosticsResponse {
    pub revision: String,
    pub cache_policy: CachePolicy,
    pub summary: GraphSummary,
    pub documents: Vec<DocumentInfo>,
    pub dangling_references: Vec<DanglingReference>,
    pub duplicate_ids: Vec<DuplicateId>,
}

/// GET /content/diagnostics - Consistency report for the current content.
pub async fn get_diagnostics(
    State(state): State<AppState>,
) -> Result<Json<DiagnosticsResponse>, ApiError> {
    let service = state.service.clone();
    let response = tokio::task::spawn_blocking(move || {
        let graph = service.graph();
        DiagnosticsResponse {
            revision: graph.revision().to_string(),
            cache_policy: service.store().policy(),
            summary: graph.summary(),
            documents: graph.documents().to_vec(),
            dangling_references: graph.dangling_references().to_vec(),
            duplicate_ids: graph.duplicates().to_vec(),
        }
    })
    .await?;
    Ok(Json(response))
}

/// Response after a reload.
#[derive(Serialize)]
pub struct ReloadResponse {
    pub revision: String,
    pub changed: bool,
}

/// POST /content/reload - Rebuild the content snapshot from disk.
pub async fn reload_content(
    State(state): State<AppState>,
) -> Result<Json<ReloadResponse>, ApiError> {
    let service = state.service.clone();
    let outcome = tokio::task::spawn_blocking(move || service.reload()).await?;
    Ok(Json(ReloadResponse {
        revision: outcome.revision,
        changed: outcome.changed,
    }))
}
