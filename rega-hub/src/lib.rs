//! HTTP API of the Rega hub: named collections of JSON documents.
//!
//! Routes:
//! - `GET   /health`
//! - `GET   /v1/{collection}` with optional `?field=F&equals=<json>`
//! - `GET   /v1/{collection}/{id}`
//! - `POST  /v1/{collection}`
//! - `PATCH /v1/{collection}/{id}`

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::Json,
    routing::get,
};
use rega_types::Document;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Documents held by the hub, keyed by collection name.
#[derive(Debug, Default)]
pub struct HubState {
    collections: RwLock<HashMap<String, Vec<Document>>>,
    token: Option<String>,
}

impl HubState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires `Authorization: Bearer <token>` on every collection route.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Adds documents to `collection` as-is.
    pub async fn seed(&self, collection: &str, documents: impl IntoIterator<Item = Document>) {
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .extend(documents);
    }

    /// Snapshot of a collection.
    pub async fn documents(&self, collection: &str) -> Vec<Document> {
        self.collections
            .read()
            .await
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    fn authorize(&self, headers: &HeaderMap) -> Result<(), StatusCode> {
        let Some(token) = &self.token else {
            return Ok(());
        };
        let presented = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        if presented == Some(token.as_str()) {
            Ok(())
        } else {
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DocumentList {
    pub documents: Vec<Document>,
}

#[derive(Deserialize, Debug)]
pub struct ListParams {
    field: Option<String>,
    /// JSON-encoded value the field must equal.
    equals: Option<String>,
}

type Shared = Arc<HubState>;

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn list_handler(
    State(hub): State<Shared>,
    Path(collection): Path<String>,
    Query(params): Query<ListParams>,
    headers: HeaderMap,
) -> Result<Json<DocumentList>, StatusCode> {
    hub.authorize(&headers)?;
    let filter = match (params.field, params.equals) {
        (Some(field), Some(equals)) => {
            let value: Value =
                serde_json::from_str(&equals).map_err(|_| StatusCode::BAD_REQUEST)?;
            Some((field, value))
        }
        (None, None) => None,
        _ => return Err(StatusCode::BAD_REQUEST),
    };

    let collections = hub.collections.read().await;
    let documents = collections
        .get(&collection)
        .map(|docs| {
            docs.iter()
                .filter(|d| {
                    filter
                        .as_ref()
                        .is_none_or(|(field, value)| d.field_equals(field, value))
                })
                .cloned()
                .collect()
        })
        .unwrap_or_default();
    Ok(Json(DocumentList { documents }))
}

async fn get_handler(
    State(hub): State<Shared>,
    Path((collection, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<Document>, StatusCode> {
    hub.authorize(&headers)?;
    hub.collections
        .read()
        .await
        .get(&collection)
        .and_then(|docs| docs.iter().find(|d| d.id == id).cloned())
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn insert_handler(
    State(hub): State<Shared>,
    Path(collection): Path<String>,
    headers: HeaderMap,
    Json(data): Json<Value>,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    hub.authorize(&headers)?;
    if !data.is_object() {
        return Err(StatusCode::BAD_REQUEST);
    }
    let id = uuid::Uuid::now_v7().to_string();
    hub.collections
        .write()
        .await
        .entry(collection.clone())
        .or_default()
        .push(Document::new(id.clone(), data));
    info!("Stored {collection}/{id}");
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

async fn update_handler(
    State(hub): State<Shared>,
    Path((collection, id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(patch): Json<Value>,
) -> Result<Json<Document>, StatusCode> {
    hub.authorize(&headers)?;
    let Value::Object(patch) = patch else {
        return Err(StatusCode::BAD_REQUEST);
    };
    let mut collections = hub.collections.write().await;
    let doc = collections
        .get_mut(&collection)
        .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
        .ok_or(StatusCode::NOT_FOUND)?;
    match &mut doc.data {
        Value::Object(fields) => fields.extend(patch),
        other => *other = Value::Object(patch),
    }
    debug!("Updated {collection}/{id}");
    Ok(Json(doc.clone()))
}

/// Build the HTTP API router over the given hub state.
pub fn build_router(hub: Arc<HubState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/v1/{collection}", get(list_handler).post(insert_handler))
        .route(
            "/v1/{collection}/{id}",
            get(get_handler).patch(update_handler),
        )
        .with_state(hub)
}
