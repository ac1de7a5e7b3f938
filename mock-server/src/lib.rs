//! In-memory stand-in for the parts of the Kibana Fleet API exercised by the
//! client's integration tests.
//!
//! Errors follow Kibana's shape, `{"statusCode":..,"error":..,"message":..}`,
//! except where Kibana itself answers with plain text (wrong upload content
//! type). Mutating requests without a `kbn-xsrf` header are rejected.

use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, HeaderMap, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentPolicy {
    pub id: String,
    pub name: String,
    pub namespace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub monitoring_enabled: Vec<String>,
    #[serde(default)]
    pub is_managed: bool,
    pub status: String,
    pub revision: u64,
}

#[derive(Deserialize)]
pub struct AgentPolicyInput {
    pub id: Option<String>,
    pub name: String,
    pub namespace: String,
    pub description: Option<String>,
    pub monitoring_enabled: Option<Vec<String>>,
}

#[derive(Deserialize)]
pub struct CopyInput {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteInput {
    pub agent_policy_id: String,
}

#[derive(Deserialize)]
pub struct ListParams {
    pub page: Option<usize>,
    #[serde(rename = "perPage")]
    pub per_page: Option<usize>,
}

#[derive(Default)]
pub struct Store {
    policies: BTreeMap<String, AgentPolicy>,
    uploads: usize,
}

pub type Db = Arc<RwLock<Store>>;

/// Kibana-style JSON error.
#[derive(Debug)]
pub struct FleetError {
    status: StatusCode,
    message: String,
}

impl FleetError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for FleetError {
    fn into_response(self) -> Response {
        let body = json!({
            "statusCode": self.status.as_u16(),
            "error": self.status.canonical_reason().unwrap_or("Error"),
            "message": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route(
            "/api/fleet/agent_policies",
            get(list_agent_policies).post(create_agent_policy),
        )
        .route("/api/fleet/agent_policies/delete", post(delete_agent_policy))
        .route(
            "/api/fleet/agent_policies/{id}",
            get(get_agent_policy).put(update_agent_policy),
        )
        .route("/api/fleet/agent_policies/{id}/copy", post(copy_agent_policy))
        .route("/api/fleet/epm/packages", post(install_by_upload))
        .layer(middleware::from_fn(require_xsrf))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn require_xsrf(request: Request, next: Next) -> Response {
    if request.method() != Method::GET && !request.headers().contains_key("kbn-xsrf") {
        tracing::warn!(method = %request.method(), uri = %request.uri(), "rejected request without kbn-xsrf");
        return FleetError::bad_request("Request must contain a kbn-xsrf header.").into_response();
    }
    next.run(request).await
}

async fn list_agent_policies(
    State(db): State<Db>,
    Query(params): Query<ListParams>,
) -> Json<serde_json::Value> {
    let page = params.page.unwrap_or(1).max(1);
    let per_page = params.per_page.unwrap_or(20);
    let store = db.read().await;
    let items: Vec<&AgentPolicy> = store
        .policies
        .values()
        .skip((page - 1).saturating_mul(per_page))
        .take(per_page)
        .collect();
    Json(json!({
        "items": items,
        "total": store.policies.len(),
        "page": page,
        "perPage": per_page,
    }))
}

async fn get_agent_policy(
    State(db): State<Db>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, FleetError> {
    let store = db.read().await;
    let policy = store.policies.get(&id).ok_or_else(|| missing_policy(&id))?;
    Ok(Json(json!({ "item": policy })))
}

async fn create_agent_policy(
    State(db): State<Db>,
    Json(input): Json<AgentPolicyInput>,
) -> Result<Json<serde_json::Value>, FleetError> {
    let mut store = db.write().await;
    if store.policies.values().any(|policy| policy.name == input.name) {
        return Err(FleetError::new(
            StatusCode::CONFLICT,
            format!("Agent Policy '{}' already exists", input.name),
        ));
    }
    let policy = AgentPolicy {
        id: input.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
        name: input.name,
        namespace: input.namespace,
        description: input.description,
        monitoring_enabled: input.monitoring_enabled.unwrap_or_default(),
        is_managed: false,
        status: "active".to_string(),
        revision: 1,
    };
    tracing::info!(id = %policy.id, name = %policy.name, "agent policy created");
    store.policies.insert(policy.id.clone(), policy.clone());
    Ok(Json(json!({ "item": policy })))
}

async fn update_agent_policy(
    State(db): State<Db>,
    Path(id): Path<String>,
    Json(input): Json<AgentPolicyInput>,
) -> Result<Json<serde_json::Value>, FleetError> {
    let mut store = db.write().await;
    let policy = store.policies.get_mut(&id).ok_or_else(|| missing_policy(&id))?;
    policy.name = input.name;
    policy.namespace = input.namespace;
    if input.description.is_some() {
        policy.description = input.description;
    }
    if let Some(monitoring) = input.monitoring_enabled {
        policy.monitoring_enabled = monitoring;
    }
    policy.revision += 1;
    tracing::info!(id = %policy.id, revision = policy.revision, "agent policy updated");
    Ok(Json(json!({ "item": policy })))
}

async fn copy_agent_policy(
    State(db): State<Db>,
    Path(id): Path<String>,
    Json(input): Json<CopyInput>,
) -> Result<Json<serde_json::Value>, FleetError> {
    let mut store = db.write().await;
    let source = store.policies.get(&id).ok_or_else(|| missing_policy(&id))?;
    let copy = AgentPolicy {
        id: Uuid::new_v4().to_string(),
        name: input.name,
        description: input.description.or_else(|| source.description.clone()),
        revision: 1,
        is_managed: false,
        ..source.clone()
    };
    tracing::info!(source = %id, id = %copy.id, "agent policy copied");
    store.policies.insert(copy.id.clone(), copy.clone());
    Ok(Json(json!({ "item": copy })))
}

async fn delete_agent_policy(
    State(db): State<Db>,
    Json(input): Json<DeleteInput>,
) -> Result<Json<serde_json::Value>, FleetError> {
    let mut store = db.write().await;
    let policy = store
        .policies
        .get(&input.agent_policy_id)
        .ok_or_else(|| missing_policy(&input.agent_policy_id))?;
    if policy.is_managed {
        return Err(FleetError::bad_request(format!(
            "Cannot delete hosted agent policy {}",
            policy.id
        )));
    }
    let policy = store
        .policies
        .remove(&input.agent_policy_id)
        .ok_or_else(|| missing_policy(&input.agent_policy_id))?;
    tracing::info!(id = %policy.id, "agent policy deleted");
    Ok(Json(json!({ "id": policy.id, "name": policy.name })))
}

async fn install_by_upload(
    State(db): State<Db>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, Response> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if content_type != "application/zip" && content_type != "application/gzip" {
        return Err((
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            format!("Unsupported content type: {content_type}"),
        )
            .into_response());
    }
    if !body.starts_with(ZIP_MAGIC) {
        return Err(FleetError::bad_request("Uploaded archive is not a valid zip file").into_response());
    }

    let mut store = db.write().await;
    store.uploads += 1;
    tracing::info!(bytes = body.len(), uploads = store.uploads, "package uploaded");
    Ok(Json(json!({
        "items": [{ "id": Uuid::new_v4().to_string(), "type": "epm-packages-assets" }],
        "_meta": { "install_source": "upload" },
    })))
}

fn missing_policy(id: &str) -> FleetError {
    FleetError::not_found(format!("Agent policy {id} not found"))
}
