//! ArangoDB REST client
//!
//! Thin adapter over the HTTP API: collection and index DDL, document
//! writes for the history store, and AQL cursors. Every call is a fresh
//! round trip - the database is the single source of truth shared across
//! process restarts and tenants, so nothing is cached here.
//!
//! Credentials are encoded into a basic-auth header once at connect time.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use crate::domain::script::{DropIndexSpec, IndexSpec, ScriptStep};
use crate::error::StoreError;

/// Matches the original tooling's 15-minute request timeout; a long-running
/// migration statement blocks the whole process until it returns or raises.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(900);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Error body returned by ArangoDB on failed requests
#[derive(Debug, Deserialize)]
struct ArangoError {
    #[serde(rename = "errorMessage")]
    error_message: Option<String>,
}

/// One AQL cursor batch
#[derive(Debug, Deserialize)]
struct CursorBatch {
    result: Vec<Value>,
    #[serde(rename = "hasMore", default)]
    has_more: bool,
    id: Option<String>,
}

/// Index listing response
#[derive(Debug, Deserialize)]
struct IndexList {
    indexes: Vec<IndexEntry>,
}

#[derive(Debug, Deserialize)]
struct IndexEntry {
    id: String,
    name: Option<String>,
}

/// A connection to one ArangoDB database
#[derive(Debug, Clone)]
pub struct Database {
    client: Client,
    base_url: String,
    name: String,
    auth_header: String,
}

impl Database {
    /// Connect and verify reachability and credentials against the target
    /// database. Fails with the server's status code on bad auth or an
    /// unknown database name.
    pub async fn connect(
        host: &str,
        dbname: &str,
        username: &str,
        password: &str,
    ) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        let auth_header = format!(
            "Basic {}",
            BASE64.encode(format!("{}:{}", username, password))
        );

        let db = Self {
            client,
            base_url: host.trim_end_matches('/').to_string(),
            name: dbname.to_string(),
            auth_header,
        };

        let response = db.get(&db.url("database/current")).send().await?;
        check(response).await?;

        Ok(db)
    }

    /// Database name this connection is scoped to
    pub fn name(&self) -> &str {
        &self.name
    }

    fn url(&self, path: &str) -> String {
        format!("{}/_db/{}/_api/{}", self.base_url, self.name, path)
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.client.get(url).header(AUTHORIZATION, &self.auth_header)
    }

    fn post(&self, url: &str) -> reqwest::RequestBuilder {
        self.client.post(url).header(AUTHORIZATION, &self.auth_header)
    }

    fn put(&self, url: &str) -> reqwest::RequestBuilder {
        self.client.put(url).header(AUTHORIZATION, &self.auth_header)
    }

    fn delete(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .delete(url)
            .header(AUTHORIZATION, &self.auth_header)
    }

    /// Check whether a collection exists
    pub async fn has_collection(&self, collection: &str) -> Result<bool, StoreError> {
        let url = self.url(&format!("collection/{}", collection));
        let response = self.get(&url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        check(response).await?;
        Ok(true)
    }

    /// Create a document (type 2) or edge (type 3) collection
    pub async fn create_collection(&self, collection: &str, edge: bool) -> Result<(), StoreError> {
        let body = json!({
            "name": collection,
            "type": if edge { 3 } else { 2 },
        });
        let response = self.post(&self.url("collection")).json(&body).send().await?;
        check(response).await?;
        debug!(collection, edge, "created collection");
        Ok(())
    }

    pub async fn drop_collection(&self, collection: &str) -> Result<(), StoreError> {
        let url = self.url(&format!("collection/{}", collection));
        let response = self.delete(&url).send().await?;
        check(response).await?;
        debug!(collection, "dropped collection");
        Ok(())
    }

    /// Create a persistent index
    pub async fn create_index(&self, spec: &IndexSpec) -> Result<(), StoreError> {
        let url = format!("{}?collection={}", self.url("index"), spec.collection);
        let mut body = json!({
            "type": "persistent",
            "fields": spec.fields,
            "unique": spec.unique,
            "sparse": spec.sparse,
        });
        if let Some(name) = &spec.name {
            body["name"] = json!(name);
        }
        let response = self.post(&url).json(&body).send().await?;
        check(response).await?;
        Ok(())
    }

    /// Drop an index by name, resolving its handle through the index listing
    pub async fn drop_index(&self, spec: &DropIndexSpec) -> Result<(), StoreError> {
        let url = format!("{}?collection={}", self.url("index"), spec.collection);
        let response = self.get(&url).send().await?;
        let listing: IndexList = check(response).await?.json().await?;

        let entry = listing
            .indexes
            .into_iter()
            .find(|ix| ix.name.as_deref() == Some(spec.name.as_str()))
            .ok_or_else(|| StoreError::UnexpectedResponse {
                message: format!("no index named {} on {}", spec.name, spec.collection),
            })?;

        let url = self.url(&format!("index/{}", entry.id));
        let response = self.delete(&url).send().await?;
        check(response).await?;
        Ok(())
    }

    /// Insert a document into a collection
    pub async fn insert_document(&self, collection: &str, doc: &Value) -> Result<(), StoreError> {
        let url = self.url(&format!("document/{}", collection));
        let response = self.post(&url).json(doc).send().await?;
        check(response).await?;
        Ok(())
    }

    /// Delete a document by key. Returns false when the document was absent.
    pub async fn delete_document(&self, collection: &str, key: &str) -> Result<bool, StoreError> {
        let url = self.url(&format!("document/{}/{}", collection, key));
        let response = self.delete(&url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        check(response).await?;
        Ok(true)
    }

    /// Run an AQL query, draining the cursor across batches
    pub async fn query(&self, aql: &str, bind_vars: Value) -> Result<Vec<Value>, StoreError> {
        let body = json!({
            "query": aql,
            "bindVars": bind_vars,
            "batchSize": 1000,
        });
        let response = self.post(&self.url("cursor")).json(&body).send().await?;
        let mut batch: CursorBatch = check(response).await?.json().await?;

        let mut rows = std::mem::take(&mut batch.result);
        while batch.has_more {
            let id = batch.id.as_deref().ok_or_else(|| StoreError::UnexpectedResponse {
                message: "cursor reports more results but carries no id".to_string(),
            })?;
            let url = self.url(&format!("cursor/{}", id));
            let response = self.put(&url).send().await?;
            batch = check(response).await?.json().await?;
            rows.append(&mut batch.result);
        }

        Ok(rows)
    }

    /// Execute a migration script's steps in order, stopping at the first
    /// failure. Steps are opaque: errors are surfaced, never interpreted.
    pub async fn execute_steps(&self, steps: &[ScriptStep]) -> Result<(), StoreError> {
        for step in steps {
            match step {
                ScriptStep::CreateCollection(name) => self.create_collection(name, false).await?,
                ScriptStep::CreateEdgeCollection(name) => self.create_collection(name, true).await?,
                ScriptStep::DropCollection(name) => self.drop_collection(name).await?,
                ScriptStep::CreateIndex(spec) => self.create_index(spec).await?,
                ScriptStep::DropIndex(spec) => self.drop_index(spec).await?,
                ScriptStep::Aql(query) => {
                    self.query(query, json!({})).await?;
                }
            }
        }
        Ok(())
    }
}

/// Map non-2xx responses to a typed server error carrying the status code
/// and the ArangoDB error message when the body has one.
async fn check(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ArangoError>(&body)
        .ok()
        .and_then(|e| e.error_message)
        .unwrap_or(body);

    Err(StoreError::Server {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_is_scoped_to_the_database() {
        let db = Database {
            client: Client::new(),
            base_url: "http://localhost:8529".to_string(),
            name: "orders".to_string(),
            auth_header: String::new(),
        };
        assert_eq!(
            db.url("collection/migration_history"),
            "http://localhost:8529/_db/orders/_api/collection/migration_history"
        );
    }

    #[test]
    fn test_trailing_slash_in_host_is_normalized() {
        let auth = format!("Basic {}", BASE64.encode("root:"));
        let db = Database {
            client: Client::new(),
            base_url: "http://localhost:8529/".trim_end_matches('/').to_string(),
            name: "orders".to_string(),
            auth_header: auth,
        };
        assert_eq!(
            db.url("cursor"),
            "http://localhost:8529/_db/orders/_api/cursor"
        );
    }

    #[test]
    fn test_arango_error_body_parsing() {
        let parsed: ArangoError =
            serde_json::from_str(r#"{"error":true,"errorMessage":"unauthorized","code":401}"#)
                .unwrap();
        assert_eq!(parsed.error_message.as_deref(), Some("unauthorized"));
    }
}
