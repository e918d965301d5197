//! Schema-driven argument synthesis.
//!
//! Builds minimally valid, intentionally bogus arguments from an operation's
//! input schema. No real-world lookups: identifiers are syntactically
//! plausible but guaranteed non-existent, so the provider rejects the call
//! server-side after logging it. Synthesis is total: any schema tree yields a
//! value or an explicit absence, never an error.

use crate::schema::{SchemaNode, DRY_RUN_MEMBER};
use rand::Rng;
use serde_json::{json, Map, Value};

/// Fake resource identifiers keyed by lowercased field-name suffix. These
/// match each resource type's conventional prefix so client-side format
/// validation passes and the server logs a clean not-found rejection.
const FAKE_RESOURCE_IDS: &[(&str, &str)] = &[
    ("imageid", "ami-000000000"),
    ("instanceid", "i-000000000"),
    ("subnetid", "subnet-000000000"),
    ("vpcid", "vpc-000000000"),
    ("securitygroupid", "sg-000000000"),
    ("allocationid", "eipalloc-000000000"),
    ("internetgatewayid", "igw-000000000"),
    ("transitgatewayattachmentid", "tgw-attach-000000000"),
];

/// Generic identifier-ish suffixes that get a random `nonexistent-` token.
const IDENTIFIER_SUFFIXES: &[&str] = &["id", "name", "key", "bucket", "stream"];

/// Random lowercase-alphanumeric token for placeholder identifiers.
pub fn rand_token(rng: &mut impl Rng, len: usize) -> String {
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    (0..len)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

fn dummy_string(name_hint: &str, rng: &mut impl Rng) -> Value {
    let nh = name_hint.to_lowercase();
    if nh.contains("arn") {
        return json!(format!(
            "arn:aws:service:region:111122223333:resource/{}",
            rand_token(rng, 8)
        ));
    }
    for (suffix, fake_id) in FAKE_RESOURCE_IDS {
        if nh.ends_with(suffix) {
            return json!(fake_id);
        }
    }
    if IDENTIFIER_SUFFIXES.iter().any(|s| nh.ends_with(s)) {
        return json!(format!("nonexistent-{}", rand_token(rng, 8)));
    }
    json!("noop")
}

/// Synthesize a value for one schema node, depth-first.
///
/// `name_hint` is the field name the node was reached through; it drives the
/// string heuristics. Returns `None` for unknown shape kinds (blobs,
/// timestamps, depth-capped recursion), which callers must tolerate.
pub fn synthesize(node: &SchemaNode, name_hint: &str, rng: &mut impl Rng) -> Option<Value> {
    match node {
        SchemaNode::String { values } => {
            // A valid enum value guarantees client-side validation passes.
            if let Some(first) = values.first() {
                Some(json!(first))
            } else {
                Some(dummy_string(name_hint, rng))
            }
        }
        SchemaNode::Integer => Some(json!(1)),
        SchemaNode::Boolean => Some(json!(false)),
        SchemaNode::Float => Some(json!(0.0)),
        SchemaNode::List { member } => match member {
            Some(m) => {
                let item = synthesize(m, name_hint, rng);
                Some(Value::Array(item.into_iter().collect()))
            }
            None => Some(Value::Array(vec![])),
        },
        SchemaNode::Map { key, value } => {
            let mut out = Map::new();
            if let (Some(k), Some(v)) = (key, value) {
                let key_val = synthesize(k, name_hint, rng);
                let val_val = synthesize(v, name_hint, rng);
                if let (Some(Value::String(ks)), Some(vv)) = (key_val, val_val) {
                    out.insert(ks, vv);
                }
            }
            Some(Value::Object(out))
        }
        SchemaNode::Structure { members, .. } => {
            // Every declared member, not only required ones; the
            // required-only filter applies at the top-level call boundary.
            let mut out = Map::new();
            for member in members {
                if let Some(v) = synthesize(&member.schema, &member.name, rng) {
                    out.insert(member.name.clone(), v);
                }
            }
            Some(Value::Object(out))
        }
        SchemaNode::Unknown => None,
    }
}

/// Build the call arguments for one operation from its input schema.
///
/// Distinct from the generic structure recursion above: only required members
/// are populated, and a declared `DryRun` member is forced to `true`
/// regardless of requiredness to bias toward non-mutating behavior. No input
/// schema means no arguments.
pub fn build_call_args(input: Option<&SchemaNode>, rng: &mut impl Rng) -> Map<String, Value> {
    let mut params = Map::new();
    let input = match input {
        Some(schema) => schema,
        None => return params,
    };

    if input.has_dry_run_member() {
        params.insert(DRY_RUN_MEMBER.to_string(), json!(true));
    }

    for name in input.required() {
        if let Some(member) = input.member(name) {
            if let Some(v) = synthesize(&member.schema, &member.name, rng) {
                params.insert(member.name.clone(), v);
            }
        }
    }

    params
}
