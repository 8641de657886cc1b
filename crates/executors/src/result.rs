use serde_json::{Map, Value, json};
use utils::protocol::{self, LogEntry};

/// Everything captured from one finished script run. Owned by the caller that
/// requested the execution; nothing here is shared.
#[derive(Debug)]
pub struct ExecutionResult {
    pub exit_code: i32,
    pub raw_stdout: String,
    pub raw_stderr: String,
    /// Last JSON-object line seen on stdout, parsed at exit. `None` when no
    /// candidate appeared or the candidate failed to parse.
    pub payload: Option<Map<String, Value>>,
    pub logs: Vec<LogEntry>,
    pub is_patched: bool,
}

impl ExecutionResult {
    /// An explicit `success` flag in the payload is authoritative; otherwise
    /// the exit code decides.
    pub fn success(&self) -> bool {
        if let Some(Value::Bool(flag)) = self.payload.as_ref().and_then(|p| p.get("success")) {
            return *flag;
        }
        self.exit_code == 0
    }

    /// Operator-facing failure message, with enough context to be actionable.
    /// Benign third-party stderr noise is filtered out; the raw capture keeps it.
    pub fn error_message(&self, script: &str) -> Option<String> {
        if self.success() {
            return None;
        }
        let mut message = if self.exit_code == 0 {
            format!("script '{script}' reported failure")
        } else {
            format!("script '{script}' exited with code {}", self.exit_code)
        };
        let noisy: Vec<&str> = self
            .raw_stderr
            .lines()
            .filter(|l| !l.trim().is_empty() && !protocol::is_benign_stderr(l))
            .collect();
        if !noisy.is_empty() {
            message.push_str(": ");
            message.push_str(&noisy.join("\n"));
        }
        Some(message)
    }

    /// Flatten into the JSON body returned to HTTP callers:
    /// `{success, logs, error, patched}` with payload fields merged on top.
    /// On a name collision the payload wins.
    pub fn into_response_json(self, script: &str) -> Value {
        let success = self.success();
        let error = self.error_message(script);

        let mut body = Map::new();
        body.insert("success".to_string(), json!(success));
        body.insert(
            "logs".to_string(),
            serde_json::to_value(&self.logs).unwrap_or_else(|_| json!([])),
        );
        body.insert(
            "error".to_string(),
            error.map(Value::String).unwrap_or(Value::Null),
        );
        body.insert("patched".to_string(), json!(self.is_patched));

        if let Some(payload) = self.payload {
            for (key, value) in payload {
                body.insert(key, value);
            }
        }

        Value::Object(body)
    }
}
