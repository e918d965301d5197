//! Client dispatch: the seam between the executor and the real network.
//!
//! [`OperationInvoker`] is the callable-per-operation abstraction the
//! executor drives; [`ClientFactory`] builds one per service (the "acquire
//! client" step of the pipeline). The production implementation,
//! [`SigningInvoker`], serializes synthesized arguments for the service's
//! declared wire protocol, SigV4-signs the request, and classifies the
//! provider's response. Tests swap in scripted invokers.

use crate::schema::{OperationModel, Protocol, SchemaNode, ServiceMetadata, ServiceModel};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_credential_types::provider::ProvideCredentials;
use aws_sigv4::http_request::{
    sign, SignableBody, SignableRequest, SigningParams, SigningSettings,
};
use aws_sigv4::sign::v4;
use aws_smithy_runtime_api::client::identity::Identity;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::debug;

/// Successful invocation outcome.
#[derive(Debug, Clone)]
pub struct InvokeOutput {
    /// Provider-side request tracking identifier, when returned.
    pub request_id: Option<String>,
}

/// Failure modes of one invocation attempt. The executor maps these onto the
/// record taxonomy; nothing here is fatal to the run.
#[derive(Debug)]
pub enum InvokeError {
    /// The provider rejected the call (permissions, bogus identifiers, bad
    /// shape). Expected and desired for most probes.
    Rejected {
        code: Option<String>,
        msg: Option<String>,
        request_id: Option<String>,
    },
    /// No callable can be bound for this operation (unknown wire protocol).
    Unsupported { protocol: String },
    /// Transport, signing, or other unclassified local failure.
    Other(anyhow::Error),
}

/// One live per-service client handle: a callable per operation name.
#[async_trait]
pub trait OperationInvoker: Send + Sync {
    /// Perform exactly one real invocation attempt with the given arguments.
    async fn invoke(
        &self,
        op: &OperationModel,
        args: &Map<String, Value>,
    ) -> Result<InvokeOutput, InvokeError>;
}

/// Builds an authenticated invoker for one service. Failure here is the
/// orchestrator's client-initialization error path.
#[async_trait]
pub trait ClientFactory: Send + Sync {
    async fn client_for(&self, model: &ServiceModel) -> Result<Arc<dyn OperationInvoker>>;
}

/// Production factory: resolves credentials from the SDK config once per
/// service client and hands out [`SigningInvoker`]s.
pub struct SigningClientFactory {
    config: SdkConfig,
    http: reqwest::Client,
}

impl SigningClientFactory {
    pub fn new(config: SdkConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ClientFactory for SigningClientFactory {
    async fn client_for(&self, model: &ServiceModel) -> Result<Arc<dyn OperationInvoker>> {
        let region = self
            .config
            .region()
            .context("no region configured")?
            .to_string();
        let provider = self
            .config
            .credentials_provider()
            .context("no credentials provider configured")?;
        let credentials = provider
            .provide_credentials()
            .await
            .context("failed to resolve AWS credentials")?;
        let endpoint = endpoint_url(&model.metadata.endpoint_prefix, &region);
        debug!("Client for {} -> {}", model.service, endpoint);
        Ok(Arc::new(SigningInvoker {
            http: self.http.clone(),
            identity: Identity::from(credentials),
            region,
            endpoint,
            metadata: model.metadata.clone(),
        }))
    }
}

/// Regional endpoint, with the handful of partition-global services pinned
/// to their fixed hostnames.
fn endpoint_url(endpoint_prefix: &str, region: &str) -> String {
    match endpoint_prefix {
        "iam" | "route53" | "cloudfront" => format!("https://{}.amazonaws.com", endpoint_prefix),
        _ => format!("https://{}.{}.amazonaws.com", endpoint_prefix, region),
    }
}

/// A request about to be signed and sent.
struct PreparedRequest {
    method: String,
    url: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

/// Generic SigV4-signed HTTP invoker driven entirely by the service model:
/// endpoint from the metadata, argument serialization from the declared
/// protocol, dispatch header/body conventions per protocol family.
pub struct SigningInvoker {
    http: reqwest::Client,
    identity: Identity,
    region: String,
    endpoint: String,
    metadata: ServiceMetadata,
}

#[async_trait]
impl OperationInvoker for SigningInvoker {
    async fn invoke(
        &self,
        op: &OperationModel,
        args: &Map<String, Value>,
    ) -> Result<InvokeOutput, InvokeError> {
        let mut request = match &self.metadata.protocol {
            Protocol::Json => self.build_json(op, args).map_err(InvokeError::Other)?,
            Protocol::Query | Protocol::Ec2 => {
                self.build_query(op, args).map_err(InvokeError::Other)?
            }
            Protocol::RestJson | Protocol::RestXml => {
                self.build_rest(op, args).map_err(InvokeError::Other)?
            }
            Protocol::Other(p) => {
                return Err(InvokeError::Unsupported {
                    protocol: p.clone(),
                })
            }
        };
        self.sign_request(&mut request).map_err(InvokeError::Other)?;
        self.send(request).await
    }
}

impl SigningInvoker {
    fn build_json(&self, op: &OperationModel, args: &Map<String, Value>) -> Result<PreparedRequest> {
        let version = self.metadata.json_version.as_deref().unwrap_or("1.1");
        let target_prefix = self
            .metadata
            .target_prefix
            .as_deref()
            .unwrap_or(&self.metadata.endpoint_prefix);
        let body = serde_json::to_vec(&Value::Object(args.clone()))?;
        Ok(PreparedRequest {
            method: "POST".to_string(),
            url: format!("{}/", self.endpoint),
            headers: vec![
                (
                    "content-type".to_string(),
                    format!("application/x-amz-json-{}", version),
                ),
                (
                    "x-amz-target".to_string(),
                    format!("{}.{}", target_prefix, op.name),
                ),
            ],
            body,
        })
    }

    fn build_query(&self, op: &OperationModel, args: &Map<String, Value>) -> Result<PreparedRequest> {
        let ec2_style = self.metadata.protocol == Protocol::Ec2;
        let mut pairs: Vec<(String, String)> = vec![
            ("Action".to_string(), op.name.clone()),
            ("Version".to_string(), self.metadata.api_version.clone()),
        ];
        for (name, value) in args {
            let schema = op.input.as_ref().and_then(|i| i.member(name)).map(|m| &m.schema);
            flatten_query_value(name, value, schema, ec2_style, &mut pairs);
        }
        let mut body = url::form_urlencoded::Serializer::new(String::new());
        for (k, v) in &pairs {
            body.append_pair(k, v);
        }
        Ok(PreparedRequest {
            method: "POST".to_string(),
            url: format!("{}/", self.endpoint),
            headers: vec![(
                "content-type".to_string(),
                "application/x-www-form-urlencoded".to_string(),
            )],
            body: body.finish().into_bytes(),
        })
    }

    fn build_rest(&self, op: &OperationModel, args: &Map<String, Value>) -> Result<PreparedRequest> {
        let empty = SchemaNode::Structure {
            members: vec![],
            required: vec![],
        };
        let input = op.input.as_ref().unwrap_or(&empty);

        let mut headers: Vec<(String, String)> = Vec::new();
        let mut query_pairs: Vec<(String, String)> = Vec::new();
        let mut body_args: Map<String, Value> = Map::new();
        let mut uri_args: HashMap<String, String> = HashMap::new();

        for (name, value) in args {
            let member = input.member(name);
            let location = member.and_then(|m| m.location.as_deref());
            let wire_name = member
                .and_then(|m| m.location_name.clone())
                .unwrap_or_else(|| name.clone());
            match location {
                Some("uri") => {
                    uri_args.insert(name.clone(), scalar_string(value));
                    if let Some(m) = member {
                        if let Some(ln) = &m.location_name {
                            uri_args.insert(ln.clone(), scalar_string(value));
                        }
                    }
                }
                Some("querystring") => query_pairs.push((wire_name, scalar_string(value))),
                Some("header") | Some("headers") => headers.push((wire_name, scalar_string(value))),
                _ => {
                    body_args.insert(name.clone(), value.clone());
                }
            }
        }

        let (path_template, fixed_query) = match op.request_uri.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (op.request_uri.as_str(), None),
        };
        let path = fill_uri_template(path_template, &uri_args);

        let mut url = format!("{}{}", self.endpoint, path);
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        let mut has_query = false;
        for (k, v) in &query_pairs {
            query.append_pair(k, v);
            has_query = true;
        }
        let encoded = query.finish();
        match (fixed_query, has_query) {
            (Some(fixed), true) => url = format!("{}?{}&{}", url, fixed, encoded),
            (Some(fixed), false) => url = format!("{}?{}", url, fixed),
            (None, true) => url = format!("{}?{}", url, encoded),
            (None, false) => {}
        }

        // rest-json carries residual members as a JSON body; rest-xml body
        // serialization is deliberately not implemented, so body-bound
        // members are dropped and the provider's rejection is the telemetry.
        let body = if self.metadata.protocol == Protocol::RestJson && !body_args.is_empty() {
            headers.push(("content-type".to_string(), "application/json".to_string()));
            serde_json::to_vec(&Value::Object(body_args))?
        } else {
            Vec::new()
        };

        Ok(PreparedRequest {
            method: op.http_method.clone(),
            url,
            headers,
            body,
        })
    }

    fn sign_request(&self, request: &mut PreparedRequest) -> Result<()> {
        let params: SigningParams<'_> = v4::SigningParams::builder()
            .identity(&self.identity)
            .region(&self.region)
            .name(self.metadata.signing_name())
            .time(SystemTime::now())
            .settings(SigningSettings::default())
            .build()
            .map_err(|e| anyhow!("failed to build signing params: {}", e))?
            .into();
        let signable = SignableRequest::new(
            request.method.as_str(),
            request.url.as_str(),
            request.headers.iter().map(|(k, v)| (k.as_str(), v.as_str())),
            SignableBody::Bytes(&request.body),
        )
        .map_err(|e| anyhow!("failed to build signable request: {}", e))?;
        let (instructions, _signature) = sign(signable, &params)
            .map_err(|e| anyhow!("signing failed: {}", e))?
            .into_parts();
        for (name, value) in instructions.headers() {
            request.headers.push((name.to_string(), value.to_string()));
        }
        Ok(())
    }

    async fn send(&self, request: PreparedRequest) -> Result<InvokeOutput, InvokeError> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|e| InvokeError::Other(anyhow!("bad HTTP method: {}", e)))?;
        let mut builder = self.http.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        let response = builder
            .body(request.body)
            .send()
            .await
            .map_err(|e| InvokeError::Other(anyhow!(e)))?;

        let status = response.status();
        let header_request_id = response
            .headers()
            .get("x-amzn-requestid")
            .or_else(|| response.headers().get("x-amz-request-id"))
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let error_type_header = response
            .headers()
            .get("x-amzn-errortype")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        if status.as_u16() < 400 {
            return Ok(InvokeOutput {
                request_id: header_request_id,
            });
        }

        let body = response.text().await.unwrap_or_default();
        let rejection = classify_rejection(&body, error_type_header.as_deref());
        Err(InvokeError::Rejected {
            code: rejection.code,
            msg: rejection.msg,
            request_id: rejection.request_id.or(header_request_id),
        })
    }
}

fn scalar_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Flatten one argument into AWS query-protocol pairs, guided by the input
/// schema. Lists index as `Name.member.N` (query) or `Name.N` (ec2); maps
/// expand to `Name.entry.N.key`/`Name.entry.N.value` (query) or
/// `Name.N.key`/`Name.N.value` (ec2); structure members dot-join. An absent
/// schema (past an `Unknown` node) falls back to structure-style dot-joining.
fn flatten_query_value(
    prefix: &str,
    value: &Value,
    schema: Option<&SchemaNode>,
    ec2_style: bool,
    out: &mut Vec<(String, String)>,
) {
    match value {
        Value::Null => {}
        Value::Bool(_) | Value::Number(_) | Value::String(_) => {
            out.push((prefix.to_string(), scalar_string(value)));
        }
        Value::Array(items) => {
            let member = match schema {
                Some(SchemaNode::List { member }) => member.as_deref(),
                _ => None,
            };
            for (i, item) in items.iter().enumerate() {
                let key = if ec2_style {
                    format!("{}.{}", prefix, i + 1)
                } else {
                    format!("{}.member.{}", prefix, i + 1)
                };
                flatten_query_value(&key, item, member, ec2_style, out);
            }
        }
        Value::Object(fields) => {
            if let Some(SchemaNode::Map { value: val, .. }) = schema {
                for (i, (k, v)) in fields.iter().enumerate() {
                    let entry = if ec2_style {
                        format!("{}.{}", prefix, i + 1)
                    } else {
                        format!("{}.entry.{}", prefix, i + 1)
                    };
                    out.push((format!("{}.key", entry), k.clone()));
                    flatten_query_value(
                        &format!("{}.value", entry),
                        v,
                        val.as_deref(),
                        ec2_style,
                        out,
                    );
                }
            } else {
                for (name, v) in fields {
                    let member = schema.and_then(|s| s.member(name)).map(|m| &m.schema);
                    flatten_query_value(&format!("{}.{}", prefix, name), v, member, ec2_style, out);
                }
            }
        }
    }
}

/// Characters escaped in URI path segments: everything outside the RFC 3986
/// unreserved set.
const PATH_SEGMENT: &percent_encoding::AsciiSet = &percent_encoding::NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Substitute `{name}` / `{name+}` placeholders in a rest request URI.
/// Greedy placeholders keep `/` unescaped; missing values become empty
/// segments (the provider's complaint is still a logged call).
fn fill_uri_template(template: &str, args: &HashMap<String, String>) -> String {
    static PLACEHOLDER: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\{([A-Za-z0-9_]+)(\+?)\}").expect("valid placeholder regex"));
    PLACEHOLDER
        .replace_all(template, |caps: &regex::Captures<'_>| {
            let value = args.get(&caps[1]).cloned().unwrap_or_default();
            if &caps[2] == "+" {
                value
                    .split('/')
                    .map(|seg| {
                        percent_encoding::utf8_percent_encode(seg, PATH_SEGMENT).to_string()
                    })
                    .collect::<Vec<_>>()
                    .join("/")
            } else {
                percent_encoding::utf8_percent_encode(&value, PATH_SEGMENT).to_string()
            }
        })
        .into_owned()
}

#[derive(Debug, Default, PartialEq)]
struct Rejection {
    code: Option<String>,
    msg: Option<String>,
    request_id: Option<String>,
}

/// Extract code/message/request id from a provider error body, JSON
/// (`__type`, `message`) or XML (`<Code>`, `<Message>`, `<RequestId>`).
fn classify_rejection(body: &str, error_type_header: Option<&str>) -> Rejection {
    static XML_CODE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"<Code>([^<]+)</Code>").expect("valid regex"));
    static XML_MSG: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"<Message>([^<]+)</Message>").expect("valid regex"));
    static XML_REQUEST_ID: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"<Request[Ii][Dd]>([^<]+)</Request[Ii][Dd]>").expect("valid regex"));

    let mut rejection = Rejection::default();

    if let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(body) {
        rejection.code = fields
            .get("__type")
            .or_else(|| fields.get("code"))
            .or_else(|| fields.get("Code"))
            .and_then(|v| v.as_str())
            .map(strip_error_type);
        rejection.msg = fields
            .get("message")
            .or_else(|| fields.get("Message"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());
        rejection.request_id = fields
            .get("RequestId")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());
    } else {
        rejection.code = XML_CODE
            .captures(body)
            .map(|c| c[1].to_string());
        rejection.msg = XML_MSG.captures(body).map(|c| c[1].to_string());
        rejection.request_id = XML_REQUEST_ID.captures(body).map(|c| c[1].to_string());
    }

    if rejection.code.is_none() {
        rejection.code = error_type_header.map(strip_error_type);
    }
    rejection
}

/// `x-amzn-ErrorType` and `__type` carry namespaces and attributes:
/// `com.amazon.coral#AccessDeniedException:http://...`.
fn strip_error_type(raw: &str) -> String {
    let no_attrs = raw.split(':').next().unwrap_or(raw);
    no_attrs
        .rsplit('#')
        .next()
        .unwrap_or(no_attrs)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_endpoint_url_regional_and_global() {
        assert_eq!(
            endpoint_url("ec2", "eu-west-1"),
            "https://ec2.eu-west-1.amazonaws.com"
        );
        assert_eq!(endpoint_url("iam", "eu-west-1"), "https://iam.amazonaws.com");
    }

    #[test]
    fn test_flatten_query_scalars_and_lists() {
        let mut out = Vec::new();
        flatten_query_value("InstanceId", &json!(["i-000000000"]), None, false, &mut out);
        assert_eq!(
            out,
            vec![("InstanceId.member.1".to_string(), "i-000000000".to_string())]
        );

        let mut out = Vec::new();
        flatten_query_value("InstanceId", &json!(["i-000000000"]), None, true, &mut out);
        assert_eq!(out, vec![("InstanceId.1".to_string(), "i-000000000".to_string())]);
    }

    #[test]
    fn test_flatten_query_nested_structure() {
        let mut out = Vec::new();
        flatten_query_value(
            "Filter",
            &json!([{"Name": "noop", "Values": ["noop"]}]),
            None,
            true,
            &mut out,
        );
        assert_eq!(
            out,
            vec![
                ("Filter.1.Name".to_string(), "noop".to_string()),
                ("Filter.1.Values.1".to_string(), "noop".to_string()),
            ]
        );
    }

    #[test]
    fn test_flatten_query_map_entries() {
        // SQS TagQueue's Tags argument: a map member must expand to
        // entry.N.key/value pairs, not dot-joined structure members.
        let schema = SchemaNode::Map {
            key: Some(Box::new(SchemaNode::String { values: vec![] })),
            value: Some(Box::new(SchemaNode::String { values: vec![] })),
        };
        let mut out = Vec::new();
        flatten_query_value(
            "Tags",
            &json!({"nonexistent-abc": "noop"}),
            Some(&schema),
            false,
            &mut out,
        );
        assert_eq!(
            out,
            vec![
                ("Tags.entry.1.key".to_string(), "nonexistent-abc".to_string()),
                ("Tags.entry.1.value".to_string(), "noop".to_string()),
            ]
        );

        let mut out = Vec::new();
        flatten_query_value(
            "Tags",
            &json!({"nonexistent-abc": "noop"}),
            Some(&schema),
            true,
            &mut out,
        );
        assert_eq!(
            out,
            vec![
                ("Tags.1.key".to_string(), "nonexistent-abc".to_string()),
                ("Tags.1.value".to_string(), "noop".to_string()),
            ]
        );
    }

    #[test]
    fn test_flatten_skips_null() {
        let mut out = Vec::new();
        flatten_query_value("DryRun", &Value::Null, None, false, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_fill_uri_template() {
        let mut args = HashMap::new();
        args.insert("Bucket".to_string(), "nonexistent-abc123".to_string());
        args.insert("Key".to_string(), "a/b c".to_string());
        assert_eq!(
            fill_uri_template("/{Bucket}/{Key+}", &args),
            "/nonexistent-abc123/a/b%20c"
        );
        // Missing placeholder values become empty segments.
        assert_eq!(fill_uri_template("/{Other}", &args), "/");
    }

    fn rest_invoker(protocol: Protocol) -> SigningInvoker {
        let credentials =
            aws_credential_types::Credentials::from_keys("AKIDEXAMPLE", "notasecret", None);
        SigningInvoker {
            http: reqwest::Client::new(),
            identity: Identity::from(credentials),
            region: "us-east-1".to_string(),
            endpoint: "https://svc.us-east-1.amazonaws.com".to_string(),
            metadata: ServiceMetadata {
                protocol,
                endpoint_prefix: "svc".to_string(),
                api_version: "2020-01-01".to_string(),
                signing_name: None,
                target_prefix: None,
                json_version: None,
            },
        }
    }

    /// One member per binding location: uri, querystring, header, and body.
    fn rest_op() -> OperationModel {
        use crate::schema::Member;

        let free = || SchemaNode::String { values: vec![] };
        let mut bucket = Member::new("Bucket", free());
        bucket.location = Some("uri".to_string());
        let mut marker = Member::new("Marker", free());
        marker.location = Some("querystring".to_string());
        marker.location_name = Some("marker".to_string());
        let mut acl = Member::new("Acl", free());
        acl.location = Some("header".to_string());
        acl.location_name = Some("x-amz-acl".to_string());
        let payload = Member::new("Payload", free());

        OperationModel {
            name: "GetThing".to_string(),
            http_method: "GET".to_string(),
            request_uri: "/{Bucket}?list-type=2".to_string(),
            input: Some(SchemaNode::Structure {
                members: vec![bucket, marker, acl, payload],
                required: vec![],
            }),
        }
    }

    fn rest_args() -> Map<String, Value> {
        let mut args = Map::new();
        args.insert("Bucket".to_string(), json!("nonexistent-abc123"));
        args.insert("Marker".to_string(), json!("m1"));
        args.insert("Acl".to_string(), json!("private"));
        args.insert("Payload".to_string(), json!("noop"));
        args
    }

    #[test]
    fn test_build_rest_json_splits_members_by_location() {
        let request = rest_invoker(Protocol::RestJson)
            .build_rest(&rest_op(), &rest_args())
            .unwrap();

        assert_eq!(request.method, "GET");
        assert_eq!(
            request.url,
            "https://svc.us-east-1.amazonaws.com/nonexistent-abc123?list-type=2&marker=m1"
        );
        assert!(request
            .headers
            .contains(&("x-amz-acl".to_string(), "private".to_string())));
        assert!(request
            .headers
            .contains(&("content-type".to_string(), "application/json".to_string())));
        let body: Value = serde_json::from_slice(&request.body).unwrap();
        assert_eq!(body, json!({"Payload": "noop"}));
    }

    #[test]
    fn test_build_rest_xml_drops_body_members() {
        let request = rest_invoker(Protocol::RestXml)
            .build_rest(&rest_op(), &rest_args())
            .unwrap();

        assert_eq!(
            request.url,
            "https://svc.us-east-1.amazonaws.com/nonexistent-abc123?list-type=2&marker=m1"
        );
        assert!(request.body.is_empty());
        assert_eq!(
            request.headers,
            vec![("x-amz-acl".to_string(), "private".to_string())]
        );
    }

    #[test]
    fn test_classify_json_rejection() {
        let body = r#"{"__type":"com.amazon.coral.service#UnrecognizedClientException","message":"The security token included in the request is invalid."}"#;
        let r = classify_rejection(body, None);
        assert_eq!(r.code.as_deref(), Some("UnrecognizedClientException"));
        assert!(r.msg.unwrap().contains("security token"));
    }

    #[test]
    fn test_classify_xml_rejection() {
        let body = r#"<Response><Errors><Error><Code>InvalidInstanceID.NotFound</Code><Message>The instance ID 'i-000000000' does not exist</Message></Error></Errors><RequestID>11aa22bb</RequestID></Response>"#;
        let r = classify_rejection(body, None);
        assert_eq!(r.code.as_deref(), Some("InvalidInstanceID.NotFound"));
        assert_eq!(r.request_id.as_deref(), Some("11aa22bb"));
    }

    #[test]
    fn test_classify_falls_back_to_error_type_header() {
        let r = classify_rejection("", Some("AccessDeniedException:http://internal"));
        assert_eq!(r.code.as_deref(), Some("AccessDeniedException"));
    }
}
