//! Minimal REST client for the remote document store.
//!
//! Speaks the Firestore v1 document surface: existence check by id,
//! upsert-merge by id, and collection listing. Only the document shapes the
//! ledger and the profile store need are supported; values round-trip
//! through plain JSON with [`encode_fields`] / [`decode_fields`].

use crate::error::{Result, StoreError};
use mietbot_core::RemoteSection;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::fs;
use std::time::Duration;

const API_BASE: &str = "https://firestore.googleapis.com/v1";

/// Bearer credential file contents.
#[derive(Debug, Deserialize)]
struct CredentialFile {
    token: String,
}

/// One collection-scoped handle on the remote document store.
#[derive(Debug, Clone)]
pub struct RemoteDocStore {
    client: Client,
    /// `projects/{project}/databases/{database}/documents`
    documents_path: String,
    token: Option<String>,
}

impl RemoteDocStore {
    /// Build a client from the remote config section.
    ///
    /// # Errors
    /// `MissingParameter` when no project id is configured; `Credentials`
    /// when a credential file is configured but unreadable.
    pub fn from_config(remote: &RemoteSection) -> Result<Self> {
        let project_id =
            remote
                .project_id
                .as_deref()
                .ok_or(StoreError::MissingParameter {
                    field: "remote.project_id",
                })?;

        let token = match &remote.credentials_path {
            Some(path) => {
                let contents =
                    fs::read_to_string(path).map_err(|e| StoreError::Credentials {
                        path: path.display().to_string(),
                        reason: e.to_string(),
                    })?;
                let parsed: CredentialFile =
                    serde_json::from_str(&contents).map_err(|e| StoreError::Credentials {
                        path: path.display().to_string(),
                        reason: format!("not a credential document: {e}"),
                    })?;
                Some(parsed.token)
            }
            None => None,
        };

        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            documents_path: format!(
                "projects/{project_id}/databases/{}/documents",
                remote.database
            ),
            token,
        })
    }

    fn document_url(&self, collection: &str, doc_id: &str) -> String {
        format!("{API_BASE}/{}/{collection}/{doc_id}", self.documents_path)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Whether a document exists, by id. A 404 is a definite "no"; any other
    /// non-success status is an error the caller must handle.
    pub async fn document_exists(&self, collection: &str, doc_id: &str) -> Result<bool> {
        let url = self.document_url(collection, doc_id);
        let response = self.authorized(self.client.get(&url)).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(StoreError::Remote {
                status: status.as_u16(),
                operation: "get document".to_string(),
                message: response.text().await.unwrap_or_default(),
            }),
        }
    }

    /// Fetch a document's fields as plain JSON.
    pub async fn get_document(&self, collection: &str, doc_id: &str) -> Result<Value> {
        let url = self.document_url(collection, doc_id);
        let response = self.authorized(self.client.get(&url)).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(StoreError::NotFound {
                key: format!("{collection}/{doc_id}"),
            }),
            status if status.is_success() => {
                let document: Value = response.json().await?;
                Ok(decode_fields(&document))
            }
            status => Err(StoreError::Remote {
                status: status.as_u16(),
                operation: "get document".to_string(),
                message: response.text().await.unwrap_or_default(),
            }),
        }
    }

    /// Upsert-merge a document by id.
    ///
    /// Uses a field mask over the supplied top-level keys, so fields the
    /// payload doesn't mention survive on an existing document and a missing
    /// document is created. `fields` must be a JSON object.
    pub async fn upsert_document(
        &self,
        collection: &str,
        doc_id: &str,
        fields: &Value,
    ) -> Result<()> {
        let object = fields
            .as_object()
            .ok_or_else(|| StoreError::MalformedDocument {
                key: format!("{collection}/{doc_id}"),
                reason: "upsert payload must be a JSON object".to_string(),
            })?;

        let url = self.document_url(collection, doc_id);
        let mask: Vec<(&str, &String)> = object
            .keys()
            .map(|key| ("updateMask.fieldPaths", key))
            .collect();

        let response = self
            .authorized(self.client.patch(&url))
            .query(&mask)
            .json(&json!({ "fields": encode_fields(object) }))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(StoreError::Remote {
                status: status.as_u16(),
                operation: "upsert document".to_string(),
                message: response.text().await.unwrap_or_default(),
            })
        }
    }

    /// List the document ids of a collection.
    pub async fn list_document_ids(&self, collection: &str) -> Result<Vec<String>> {
        let url = format!("{API_BASE}/{}/{collection}", self.documents_path);
        let response = self
            .authorized(self.client.get(&url))
            .query(&[("pageSize", "300")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Remote {
                status: status.as_u16(),
                operation: "list documents".to_string(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let body: Value = response.json().await?;
        let ids = body["documents"]
            .as_array()
            .map(|documents| {
                documents
                    .iter()
                    .filter_map(|doc| doc["name"].as_str())
                    .filter_map(|name| name.rsplit('/').next())
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Ok(ids)
    }
}

/// Encode a plain JSON object into the store's typed-value field map.
#[must_use]
pub fn encode_fields(object: &Map<String, Value>) -> Value {
    let fields: Map<String, Value> = object
        .iter()
        .map(|(key, value)| (key.clone(), encode_value(value)))
        .collect();
    Value::Object(fields)
}

fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                // Integer values travel as strings on the wire
                json!({ "integerValue": i.to_string() })
            } else {
                json!({ "doubleValue": n.as_f64() })
            }
        }
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(object) => json!({ "mapValue": { "fields": encode_fields(object) } }),
    }
}

/// Decode a document response back into a plain JSON object.
#[must_use]
pub fn decode_fields(document: &Value) -> Value {
    let Some(fields) = document["fields"].as_object() else {
        return json!({});
    };
    let object: Map<String, Value> = fields
        .iter()
        .map(|(key, value)| (key.clone(), decode_value(value)))
        .collect();
    Value::Object(object)
}

fn decode_value(value: &Value) -> Value {
    let Some(object) = value.as_object() else {
        return Value::Null;
    };
    if let Some(s) = object.get("stringValue").and_then(Value::as_str) {
        return Value::String(s.to_string());
    }
    if let Some(s) = object.get("timestampValue").and_then(Value::as_str) {
        return Value::String(s.to_string());
    }
    if let Some(b) = object.get("booleanValue").and_then(Value::as_bool) {
        return Value::Bool(b);
    }
    if let Some(s) = object.get("integerValue").and_then(Value::as_str) {
        if let Ok(i) = s.parse::<i64>() {
            return json!(i);
        }
    }
    if let Some(d) = object.get("doubleValue").and_then(Value::as_f64) {
        return json!(d);
    }
    if let Some(items) = object
        .get("arrayValue")
        .and_then(|a| a["values"].as_array())
    {
        return Value::Array(items.iter().map(decode_value).collect());
    }
    if let Some(fields) = object.get("mapValue") {
        return decode_fields(fields);
    }
    Value::Null
}
