//! Operation selection policy engine.
//!
//! Composes four overlapping heuristics into one ordered, deduplicated,
//! capped list per service: the all-ops bypass, pinned + discovered
//! dry-run-capable operations, pinned aggressive writes, and safe read-only
//! operations. Insertion order is the execution/submission order downstream.

use crate::config::SelectionPolicy;
use crate::schema::ServiceModel;
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

/// Name prefixes that mark an operation as read-only.
pub const SAFE_PREFIXES: &[&str] = &["List", "Get", "Describe", "Head"];

/// Curated write-ish operations that fail safely server-side with bogus
/// identifiers while still producing a CloudTrail entry. Consulted per
/// service; absence of a service here is fine.
static PINNED_AGGRESSIVE: Lazy<HashMap<&'static str, Vec<&'static str>>> = Lazy::new(|| {
    HashMap::from([
        (
            "lambda",
            vec![
                "UpdateFunctionConfiguration",
                "PublishVersion",
                "CreateAlias",
                "DeleteFunction",
            ],
        ),
        ("s3", vec!["DeleteObject", "PutBucketTagging"]),
        (
            "iam",
            vec!["AttachRolePolicy", "AttachUserPolicy", "CreateAccessKey"],
        ),
        ("events", vec!["PutRule", "PutTargets", "PutEvents"]),
        (
            "logs",
            vec![
                "PutResourcePolicy",
                "PutRetentionPolicy",
                "PutSubscriptionFilter",
            ],
        ),
        (
            "sqs",
            vec!["SetQueueAttributes", "RemovePermission", "TagQueue"],
        ),
        ("sns", vec!["SetTopicAttributes", "Subscribe", "Unsubscribe"]),
        ("ecr", vec!["BatchDeleteImage", "DeleteRepository"]),
        (
            "rds",
            vec!["ModifyDBInstance", "StopDBInstance", "StartDBInstance"],
        ),
        ("eks", vec!["UpdateClusterConfig"]),
        ("es", vec!["UpdateElasticsearchDomainConfig"]),
        ("opensearch", vec!["UpdateDomainConfig"]),
        (
            "kms",
            vec!["DisableKey", "EnableKeyRotation", "ScheduleKeyDeletion"],
        ),
        (
            "cloudtrail",
            vec!["UpdateTrail", "StartLogging", "StopLogging"],
        ),
        ("glue", vec!["StartJobRun", "CreateJob", "DeleteJob"]),
        ("stepfunctions", vec!["StartExecution", "StopExecution"]),
        ("bedrock", vec!["PutModelInvocationLoggingConfiguration"]),
    ])
});

/// DryRun-capable operations to definitely try where available.
static PINNED_DRYRUN: Lazy<HashMap<&'static str, Vec<&'static str>>> = Lazy::new(|| {
    HashMap::from([
        (
            "ec2",
            vec![
                "StartInstances",
                "StopInstances",
                "TerminateInstances",
                "RebootInstances",
                "RunInstances",
                "CreateTags",
            ],
        ),
        (
            "autoscaling",
            vec![
                "CreateAutoScalingGroup",
                "UpdateAutoScalingGroup",
                "DeleteAutoScalingGroup",
            ],
        ),
    ])
});

fn pinned_in_catalog(
    table: &HashMap<&'static str, Vec<&'static str>>,
    model: &ServiceModel,
) -> Vec<String> {
    table
        .get(model.service.as_str())
        .map(|ops| {
            ops.iter()
                .filter(|op| model.operation(op).is_some())
                .map(|op| op.to_string())
                .collect()
        })
        .unwrap_or_default()
}

/// Select the operations to attempt for one service.
///
/// Each stage is additive, deduplicates against everything already chosen,
/// and short-circuits once `max_ops_per_service` is reached. `all_ops`
/// bypasses every heuristic and returns the catalog head verbatim.
pub fn select_operations(model: &ServiceModel, policy: &SelectionPolicy) -> Vec<String> {
    if policy.all_ops {
        return model
            .operation_names()
            .take(policy.max_ops_per_service)
            .map(|s| s.to_string())
            .collect();
    }

    let mut out: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut push = |op: String, out: &mut Vec<String>, seen: &mut HashSet<String>| {
        if out.len() < policy.max_ops_per_service && seen.insert(op.clone()) {
            out.push(op);
        }
    };

    if policy.include_dry_run {
        // Pinned first, in table order, then discovered DryRun-capable
        // operations in catalog order.
        let pinned = pinned_in_catalog(&PINNED_DRYRUN, model);
        for op in &pinned {
            push(op.clone(), &mut out, &mut seen);
        }
        for op in &model.operations {
            if op.dry_run_capable() && !pinned.contains(&op.name) {
                push(op.name.clone(), &mut out, &mut seen);
            }
        }
    }

    if policy.aggressive && out.len() < policy.max_ops_per_service {
        for op in pinned_in_catalog(&PINNED_AGGRESSIVE, model) {
            push(op, &mut out, &mut seen);
        }
    }

    if out.len() < policy.max_ops_per_service {
        for op in &model.operations {
            if SAFE_PREFIXES.iter().any(|p| op.name.starts_with(p)) {
                push(op.name.clone(), &mut out, &mut seen);
            }
        }
    }

    out
}
