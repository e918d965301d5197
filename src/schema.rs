//! Service and operation models consumed by the selector, synthesizer, and
//! HTTP invoker.
//!
//! A [`SchemaNode`] is an explicit tagged-union snapshot of one operation's
//! input shape. The catalog provider resolves the flat shape table of a
//! botocore-format model file into these trees once per service per run;
//! everything downstream is pure traversal with no runtime introspection.

/// One node of an operation's input schema tree.
///
/// Schema trees are finite: the catalog resolver breaks recursive shape
/// references by emitting [`SchemaNode::Unknown`] past a fixed depth, and the
/// synthesizer treats `Unknown` as "no value".
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    /// A string, optionally restricted to a fixed set of legal values.
    /// `values` is empty for a free-form string.
    String { values: Vec<String> },
    /// Integer or long.
    Integer,
    Boolean,
    /// Float or double.
    Float,
    /// A list with at most one member schema.
    List { member: Option<Box<SchemaNode>> },
    /// A map with key and value schemas (either may be absent).
    Map {
        key: Option<Box<SchemaNode>>,
        value: Option<Box<SchemaNode>>,
    },
    /// A structure with named members, in model order.
    Structure {
        members: Vec<Member>,
        required: Vec<String>,
    },
    /// Blob, timestamp, document, or anything the resolver could not place.
    /// Synthesizes to an absent value.
    Unknown,
}

/// One named member of a structure, with the HTTP binding metadata the rest
/// protocols need (`location: uri|querystring|header`).
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub name: String,
    pub schema: SchemaNode,
    pub location: Option<String>,
    pub location_name: Option<String>,
}

impl Member {
    pub fn new(name: impl Into<String>, schema: SchemaNode) -> Self {
        Self {
            name: name.into(),
            schema,
            location: None,
            location_name: None,
        }
    }
}

impl SchemaNode {
    /// Members of a structure node, empty for any other kind.
    pub fn members(&self) -> &[Member] {
        match self {
            SchemaNode::Structure { members, .. } => members,
            _ => &[],
        }
    }

    /// Required member names of a structure node.
    pub fn required(&self) -> &[String] {
        match self {
            SchemaNode::Structure { required, .. } => required,
            _ => &[],
        }
    }

    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members().iter().find(|m| m.name == name)
    }

    /// True if this structure declares a `DryRun` member, meaning the
    /// operation can validate a call server-side without applying effects.
    pub fn has_dry_run_member(&self) -> bool {
        self.member(DRY_RUN_MEMBER).is_some()
    }
}

/// The member name AWS uses for dry-run-capable operations.
pub const DRY_RUN_MEMBER: &str = "DryRun";

/// Wire protocol declared by a service's model metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Protocol {
    /// awsJson1.0 / awsJson1.1 (`X-Amz-Target` dispatch).
    Json,
    /// AWS query protocol (IAM, CloudFormation, ...).
    Query,
    /// EC2's query dialect (unindexed list member names).
    Ec2,
    RestJson,
    RestXml,
    /// Anything this crate cannot dispatch; invocations resolve to no method.
    Other(String),
}

impl Protocol {
    pub fn parse(s: &str) -> Self {
        match s {
            "json" => Protocol::Json,
            "query" => Protocol::Query,
            "ec2" => Protocol::Ec2,
            "rest-json" => Protocol::RestJson,
            "rest-xml" => Protocol::RestXml,
            other => Protocol::Other(other.to_string()),
        }
    }
}

/// Service-level metadata from the model file, enough to build and sign a
/// request for any of the service's operations.
#[derive(Debug, Clone)]
pub struct ServiceMetadata {
    pub protocol: Protocol,
    pub endpoint_prefix: String,
    pub api_version: String,
    pub signing_name: Option<String>,
    pub target_prefix: Option<String>,
    pub json_version: Option<String>,
}

impl ServiceMetadata {
    /// The SigV4 signing name, falling back to the endpoint prefix.
    pub fn signing_name(&self) -> &str {
        self.signing_name.as_deref().unwrap_or(&self.endpoint_prefix)
    }
}

/// One named remote operation with its HTTP binding and input schema.
/// `input` is `None` when the operation takes no arguments.
#[derive(Debug, Clone)]
pub struct OperationModel {
    pub name: String,
    pub http_method: String,
    pub request_uri: String,
    pub input: Option<SchemaNode>,
}

impl OperationModel {
    /// True if the operation accepts a `DryRun` flag.
    pub fn dry_run_capable(&self) -> bool {
        self.input
            .as_ref()
            .map(|s| s.has_dry_run_member())
            .unwrap_or(false)
    }
}

/// Read-only snapshot of one service's operation catalog, fetched once per
/// service per run. Operation order is the catalog order the selector and
/// executor rely on.
#[derive(Debug, Clone)]
pub struct ServiceModel {
    pub service: String,
    pub metadata: ServiceMetadata,
    pub operations: Vec<OperationModel>,
}

impl ServiceModel {
    pub fn operation(&self, name: &str) -> Option<&OperationModel> {
        self.operations.iter().find(|op| op.name == name)
    }

    pub fn operation_names(&self) -> impl Iterator<Item = &str> {
        self.operations.iter().map(|op| op.name.as_str())
    }
}
