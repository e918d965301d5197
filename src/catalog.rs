//! Service metadata provider.
//!
//! Loads botocore-layout API model files (the same JSON data the AWS CLI and
//! boto3 ship) and resolves each operation's flat shape table into the
//! [`SchemaNode`] trees the rest of the crate consumes. Models are read once
//! per service per run; nothing here is cached across runs.

use crate::schema::{
    Member, OperationModel, Protocol, SchemaNode, ServiceMetadata, ServiceModel,
};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Shape references in the model files can be recursive (DynamoDB's
/// `AttributeValue`, Organizations policies). Resolution stops here and emits
/// [`SchemaNode::Unknown`], which the synthesizer treats as "no value".
const MAX_SCHEMA_DEPTH: usize = 12;

/// Source of per-service operation catalogs and input schemas.
pub trait CatalogProvider: Send + Sync {
    /// Snapshot the operation catalog for `service`. Errors for unknown or
    /// unreadable services; the orchestrator records that and skips the
    /// service rather than failing the run.
    fn service_model(&self, service: &str) -> Result<ServiceModel>;
}

/// Reads models from a botocore data directory:
/// `<root>/<service>/<api-version>/service-2.json`, latest version winning.
/// A flat `<root>/<service>.json` file is also accepted.
#[derive(Debug, Clone)]
pub struct BotocoreCatalog {
    root: PathBuf,
}

impl BotocoreCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn model_path(&self, service: &str) -> Result<PathBuf> {
        let dir = self.root.join(service);
        if dir.is_dir() {
            // Version directories sort lexicographically; API versions are
            // ISO dates, so the last one is the newest.
            let mut versions: Vec<PathBuf> = std::fs::read_dir(&dir)
                .with_context(|| format!("failed to read model directory {}", dir.display()))?
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.join("service-2.json").is_file())
                .collect();
            versions.sort();
            if let Some(latest) = versions.pop() {
                return Ok(latest.join("service-2.json"));
            }
        }
        let flat = self.root.join(format!("{}.json", service));
        if flat.is_file() {
            return Ok(flat);
        }
        bail!(
            "no API model for service '{}' under {}",
            service,
            self.root.display()
        );
    }
}

impl CatalogProvider for BotocoreCatalog {
    fn service_model(&self, service: &str) -> Result<ServiceModel> {
        let path = self.model_path(service)?;
        debug!("Loading API model for {} from {}", service, path.display());
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let raw: RawModel = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(raw.resolve(service))
    }
}

// Raw deserialization targets for the model files. Only the fields this crate
// consumes are declared; everything else is ignored.

#[derive(Debug, Deserialize)]
struct RawModel {
    metadata: RawMetadata,
    #[serde(default)]
    operations: BTreeMap<String, RawOperation>,
    #[serde(default)]
    shapes: BTreeMap<String, RawShape>,
}

#[derive(Debug, Deserialize)]
struct RawMetadata {
    protocol: String,
    #[serde(rename = "endpointPrefix")]
    endpoint_prefix: String,
    #[serde(rename = "apiVersion")]
    api_version: String,
    #[serde(rename = "signingName")]
    signing_name: Option<String>,
    #[serde(rename = "targetPrefix")]
    target_prefix: Option<String>,
    #[serde(rename = "jsonVersion")]
    json_version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawOperation {
    http: Option<RawHttp>,
    input: Option<RawRef>,
}

#[derive(Debug, Deserialize)]
struct RawHttp {
    method: Option<String>,
    #[serde(rename = "requestUri")]
    request_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawRef {
    shape: String,
    location: Option<String>,
    #[serde(rename = "locationName")]
    location_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawShape {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    members: BTreeMap<String, RawRef>,
    #[serde(default)]
    required: Vec<String>,
    member: Option<Box<RawRef>>,
    key: Option<Box<RawRef>>,
    value: Option<Box<RawRef>>,
    #[serde(rename = "enum", default)]
    enum_values: Vec<String>,
}

impl RawModel {
    fn resolve(&self, service: &str) -> ServiceModel {
        let metadata = ServiceMetadata {
            protocol: Protocol::parse(&self.metadata.protocol),
            endpoint_prefix: self.metadata.endpoint_prefix.clone(),
            api_version: self.metadata.api_version.clone(),
            signing_name: self.metadata.signing_name.clone(),
            target_prefix: self.metadata.target_prefix.clone(),
            json_version: self.metadata.json_version.clone(),
        };

        let operations = self
            .operations
            .iter()
            .map(|(name, op)| {
                let (http_method, request_uri) = match &op.http {
                    Some(http) => (
                        http.method.clone().unwrap_or_else(|| "POST".to_string()),
                        http.request_uri.clone().unwrap_or_else(|| "/".to_string()),
                    ),
                    None => ("POST".to_string(), "/".to_string()),
                };
                OperationModel {
                    name: name.clone(),
                    http_method,
                    request_uri,
                    input: op
                        .input
                        .as_ref()
                        .map(|r| self.resolve_shape(&r.shape, MAX_SCHEMA_DEPTH)),
                }
            })
            .collect();

        ServiceModel {
            service: service.to_string(),
            metadata,
            operations,
        }
    }

    fn resolve_shape(&self, name: &str, depth: usize) -> SchemaNode {
        if depth == 0 {
            return SchemaNode::Unknown;
        }
        let shape = match self.shapes.get(name) {
            Some(s) => s,
            None => return SchemaNode::Unknown,
        };
        match shape.kind.as_str() {
            "string" => SchemaNode::String {
                values: shape.enum_values.clone(),
            },
            "integer" | "long" => SchemaNode::Integer,
            "boolean" => SchemaNode::Boolean,
            "float" | "double" => SchemaNode::Float,
            "list" => SchemaNode::List {
                member: shape
                    .member
                    .as_ref()
                    .map(|m| Box::new(self.resolve_shape(&m.shape, depth - 1))),
            },
            "map" => SchemaNode::Map {
                key: shape
                    .key
                    .as_ref()
                    .map(|k| Box::new(self.resolve_shape(&k.shape, depth - 1))),
                value: shape
                    .value
                    .as_ref()
                    .map(|v| Box::new(self.resolve_shape(&v.shape, depth - 1))),
            },
            "structure" => SchemaNode::Structure {
                members: shape
                    .members
                    .iter()
                    .map(|(mname, mref)| Member {
                        name: mname.clone(),
                        schema: self.resolve_shape(&mref.shape, depth - 1),
                        location: mref.location.clone(),
                        location_name: mref.location_name.clone(),
                    })
                    .collect(),
                required: shape.required.clone(),
            },
            // blob, timestamp, document, ...
            _ => SchemaNode::Unknown,
        }
    }
}

/// Resolve the model root directory: explicit flag, then the first entry of
/// `AWS_DATA_PATH`, then `~/.aws/models`.
pub fn default_models_dir(flag: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = flag {
        return Ok(dir.to_path_buf());
    }
    if let Ok(data_path) = std::env::var("AWS_DATA_PATH") {
        if let Some(first) = data_path.split(':').find(|s| !s.is_empty()) {
            return Ok(PathBuf::from(first));
        }
    }
    let home = std::env::var("HOME").context("HOME is not set; pass --models-dir")?;
    Ok(PathBuf::from(home).join(".aws").join("models"))
}
