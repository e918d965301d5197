//! Single-operation execution and outcome classification.
//!
//! One invocation attempt in, exactly one record out. Errors never propagate
//! to the caller: the provider rejecting bogus arguments is the expected,
//! desired outcome, and anything else is classified and logged.

use crate::client::{InvokeError, OperationInvoker};
use crate::recorder::{InvocationRecord, Recorder};
use crate::schema::ServiceModel;
use crate::synth::build_call_args;
use tracing::debug;

/// Translate an operation name to the boto3-style snake_case method name
/// reported in `no_method` records (`DescribeDBInstances` ->
/// `describe_db_instances`).
pub fn python_method_name(op_name: &str) -> String {
    let chars: Vec<char> = op_name.chars().collect();
    let mut out = String::with_capacity(op_name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() {
            let after_lower = i > 0 && (chars[i - 1].is_ascii_lowercase() || chars[i - 1].is_ascii_digit());
            let acronym_end = i > 0
                && chars[i - 1].is_ascii_uppercase()
                && chars.get(i + 1).map(|n| n.is_ascii_lowercase()).unwrap_or(false);
            if after_lower || acronym_end {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Attempt one operation and record the outcome.
///
/// Resolves the input schema from the catalog snapshot, synthesizes
/// arguments, invokes through the client, and writes exactly one record
/// whatever happens.
pub async fn execute_operation(
    invoker: &dyn OperationInvoker,
    model: &ServiceModel,
    op_name: &str,
    recorder: &Recorder,
) {
    let service = model.service.as_str();
    let op = match model.operation(op_name) {
        Some(op) => op,
        None => {
            // Selector output always comes from the same snapshot, but a
            // missing operation must still produce a record, not a panic.
            recorder.write(&InvocationRecord::exception(
                service,
                op_name,
                format!("operation '{}' not in catalog snapshot", op_name),
            ));
            return;
        }
    };

    let args = build_call_args(op.input.as_ref(), &mut rand::thread_rng());
    debug!("{} {} args: {}", service, op_name, serde_json::Value::Object(args.clone()));

    match invoker.invoke(op, &args).await {
        Ok(output) => {
            recorder.write(&InvocationRecord::invoked(service, op_name, output.request_id));
        }
        Err(InvokeError::Rejected { code, msg, request_id }) => {
            recorder.write(&InvocationRecord::client_error(
                service, op_name, code, msg, request_id,
            ));
        }
        Err(InvokeError::Unsupported { protocol }) => {
            debug!("{} {}: no callable for protocol '{}'", service, op_name, protocol);
            recorder.write(&InvocationRecord::no_method(
                service,
                op_name,
                python_method_name(op_name),
            ));
        }
        Err(InvokeError::Other(e)) => {
            recorder.write(&InvocationRecord::exception(service, op_name, e.to_string()));
        }
    }
}
