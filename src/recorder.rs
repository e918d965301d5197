//! Thread-safe structured record sink.
//!
//! One compact JSON object per line, timestamped at generation. The write
//! plus flush is serialized under a mutex so concurrent workers never
//! interleave or truncate lines. Records are write-once facts; ordering
//! across services and workers is not guaranteed.

use chrono::Utc;
use serde::Serialize;
use std::io::Write;
use std::sync::Mutex;
use tracing::warn;

/// One immutable fact about an attempted (or abandoned) operation.
/// Status-specific fields are omitted from the JSON when unset.
#[derive(Debug, Clone, Serialize)]
pub struct InvocationRecord {
    pub service: String,
    pub op: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub py_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub ts: String,
}

fn timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

impl InvocationRecord {
    fn base(service: &str, op: &str, status: &'static str) -> Self {
        Self {
            service: service.to_string(),
            op: op.to_string(),
            status,
            request_id: None,
            code: None,
            msg: None,
            py_method: None,
            error: None,
            ts: timestamp(),
        }
    }

    /// The call went through; the provider accepted it.
    pub fn invoked(service: &str, op: &str, request_id: Option<String>) -> Self {
        Self {
            request_id,
            ..Self::base(service, op, "invoked")
        }
    }

    /// The provider rejected the call. Expected and desired for most
    /// operations, since the arguments are intentionally bogus.
    pub fn client_error(
        service: &str,
        op: &str,
        code: Option<String>,
        msg: Option<String>,
        request_id: Option<String>,
    ) -> Self {
        Self {
            code,
            msg,
            request_id,
            ..Self::base(service, op, "client_error")
        }
    }

    /// No callable could be bound to the operation name. `py_method` carries
    /// the snake_case name the binding would have used.
    pub fn no_method(service: &str, op: &str, py_method: String) -> Self {
        Self {
            py_method: Some(py_method),
            ..Self::base(service, op, "no_method")
        }
    }

    /// Any other unclassified local failure.
    pub fn exception(service: &str, op: &str, error: String) -> Self {
        Self {
            error: Some(error),
            ..Self::base(service, op, "exception")
        }
    }

    /// Client or catalog acquisition failed; the service is skipped.
    pub fn client_init_error(service: &str, error: String) -> Self {
        Self {
            error: Some(error),
            ..Self::base(service, "-", "client_error")
        }
    }
}

/// Serialized sink appending one record per line to an output stream.
pub struct Recorder {
    out: Mutex<Box<dyn Write + Send>>,
}

impl Recorder {
    /// Recorder writing to standard output.
    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    /// Recorder writing to an injected stream (tests, file capture).
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self { out: Mutex::new(out) }
    }

    /// Append one record and flush. Lines are never interleaved: the whole
    /// write+flush happens under the lock.
    pub fn write(&self, record: &InvocationRecord) {
        let line = match serde_json::to_string(record) {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to serialize record for {}/{}: {}", record.service, record.op, e);
                return;
            }
        };
        let mut out = self.out.lock().expect("recorder lock poisoned");
        if let Err(e) = writeln!(out, "{}", line).and_then(|_| out.flush()) {
            warn!("Failed to write record: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::Value;
    use std::sync::Arc;

    /// Shared in-memory sink for asserting on emitted lines.
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn lines(&self) -> Vec<String> {
            String::from_utf8(self.0.lock().unwrap().clone())
                .unwrap()
                .lines()
                .map(|s| s.to_string())
                .collect()
        }
    }

    #[test]
    fn test_record_shape_and_field_elision() {
        let buf = SharedBuf::default();
        let recorder = Recorder::new(Box::new(buf.clone()));

        recorder.write(&InvocationRecord::invoked("ec2", "DescribeInstances", None));
        recorder.write(&InvocationRecord::client_error(
            "s3",
            "DeleteObject",
            Some("NoSuchBucket".to_string()),
            Some("The specified bucket does not exist".to_string()),
            Some("req-123".to_string()),
        ));

        let lines = buf.lines();
        assert_eq!(lines.len(), 2);

        let first: Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(first["service"], "ec2");
        assert_eq!(first["op"], "DescribeInstances");
        assert_eq!(first["status"], "invoked");
        assert!(first.get("code").is_none());
        // Timestamp format: YYYY-MM-DDTHH:MM:SSZ
        let ts = first["ts"].as_str().unwrap();
        assert_eq!(ts.len(), 20);
        assert!(ts.ends_with('Z'));

        let second: Value = serde_json::from_str(&lines[1]).unwrap();
        assert_eq!(second["status"], "client_error");
        assert_eq!(second["code"], "NoSuchBucket");
        assert_eq!(second["request_id"], "req-123");
    }

    #[test]
    fn test_no_method_record_carries_py_method_field() {
        let buf = SharedBuf::default();
        let recorder = Recorder::new(Box::new(buf.clone()));
        recorder.write(&InvocationRecord::no_method(
            "workspaces",
            "DescribeWorkspaces",
            "describe_workspaces".to_string(),
        ));
        let record: Value = serde_json::from_str(&buf.lines()[0]).unwrap();
        assert_eq!(record["status"], "no_method");
        assert_eq!(record["py_method"], "describe_workspaces");
        assert!(record.get("method").is_none());
    }

    #[test]
    fn test_init_error_uses_placeholder_op() {
        let buf = SharedBuf::default();
        let recorder = Recorder::new(Box::new(buf.clone()));
        recorder.write(&InvocationRecord::client_init_error(
            "nosuchsvc",
            "no API model".to_string(),
        ));
        let record: Value = serde_json::from_str(&buf.lines()[0]).unwrap();
        assert_eq!(record["op"], "-");
        assert_eq!(record["status"], "client_error");
    }

    #[test]
    fn test_concurrent_writers_never_interleave() {
        let buf = SharedBuf::default();
        let recorder = Arc::new(Recorder::new(Box::new(buf.clone())));

        let mut handles = Vec::new();
        for worker in 0..50 {
            let recorder = recorder.clone();
            handles.push(std::thread::spawn(move || {
                for i in 0..100 {
                    recorder.write(&InvocationRecord::invoked(
                        "ec2",
                        &format!("Op{}-{}", worker, i),
                        Some(format!("req-{}-{}", worker, i)),
                    ));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let lines = buf.lines();
        assert_eq!(lines.len(), 5000);
        for line in &lines {
            let parsed: Value =
                serde_json::from_str(line).unwrap_or_else(|e| panic!("corrupt line {:?}: {}", line, e));
            assert_eq!(parsed["status"], "invoked");
        }
    }
}
