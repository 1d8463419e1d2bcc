//! Practice sandbox: a fixed toy schema for experimenting with queries.

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Map, Value, json};

use curriculum::InteractionRecord;

use crate::server::client::ClientInfo;
use crate::server::error::ApiError;
use crate::server::state::AppState;

const SANDBOX_ENDPOINT: &str = "/sandbox";

/// Fields the sandbox schema knows, with their fixed answers.
const SANDBOX_FIELDS: &[(&str, &str)] = &[
    ("ping", "sandbox-pong"),
    ("marco", "sandbox-polo"),
    ("field", "sandbox-value"),
];

/// Request body for `POST /sandbox`.
#[derive(Debug, Deserialize)]
pub struct SandboxRequest {
    #[serde(alias = "operation")]
    pub query: String,
}

/// Resolve a selection such as `{ ping marco }` against the sandbox schema.
///
/// An optional leading `query` keyword and an operation name are ignored.
pub fn resolve_sandbox(query: &str) -> Result<Map<String, Value>, ApiError> {
    let body = match (query.find('{'), query.rfind('}')) {
        (Some(open), Some(close)) if open < close => &query[open + 1..close],
        (None, None) => query,
        _ => return Err(ApiError::BadRequest("unbalanced braces".to_string())),
    };

    let mut data = Map::new();
    for field in body
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
    {
        let answer = SANDBOX_FIELDS
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, answer)| *answer)
            .ok_or_else(|| {
                ApiError::BadRequest(format!("Cannot query field '{}' on type 'Query'", field))
            })?;
        data.insert(field.to_string(), Value::String(answer.to_string()));
    }

    if data.is_empty() {
        return Err(ApiError::BadRequest("query selects no fields".to_string()));
    }
    Ok(data)
}

/// POST /sandbox - Answer a practice query.
pub async fn post_sandbox(
    State(state): State<AppState>,
    client: ClientInfo,
    Json(request): Json<SandboxRequest>,
) -> Response {
    let result = resolve_sandbox(&request.query);

    let (response, body) = match &result {
        Ok(data) => {
            let body = json!({ "data": data });
            (body.clone(), Json(body).into_response())
        }
        Err(e) => {
            let body = json!({ "errors": [{ "message": e.message() }] });
            (body.clone(), (e.status(), Json(body)).into_response())
        }
    };

    let record = InteractionRecord::new(SANDBOX_ENDPOINT, request.query)
        .with_response(response, result.is_ok());
    state.record(client.apply(record)).await;

    body
}
