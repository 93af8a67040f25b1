//! Remote response classification and payload extraction
//!
//! The remote environment has no structured side-channel: measured data is
//! smuggled back inside a diagnostic message, wrapped between the `-_` and
//! `_-` sentinels. That convention is the interop contract with the remote
//! script framework and is preserved exactly.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::debug;

use crate::types::{ExecuteResponse, GovernorLimits};

use super::schema::{SchemaRegistry, BENCHMARK_REPORT_SCHEMA, GOVERNOR_LIMITS_SCHEMA};

/// Leading sentinel of the embedded-payload convention.
pub const DATA_MARKER_OPEN: &str = "-_";
/// Trailing sentinel of the embedded-payload convention.
pub const DATA_MARKER_CLOSE: &str = "_-";

/* ===================== Error Types ===================== */

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Compile Error (line {line}, col {column}): {problem}")]
    Compile {
        line: i32,
        column: i32,
        problem: String,
    },

    /// Genuine remote failure; the message text is preserved verbatim.
    #[error("{message}")]
    Execution { message: String },

    /// The transaction succeeded but produced no measurable output.
    #[error("{message}")]
    MissingData { message: String },
}

/* ===================== Decoded Shapes ===================== */

/// Standard-dialect payload: limits plus optional display overrides.
#[derive(Debug, Clone, Deserialize)]
pub struct BenchmarkReport {
    pub name: Option<String>,
    pub action: Option<String>,
    pub limits: GovernorLimits,
}

/* ===================== Decoder ===================== */

pub struct ResponseDecoder {
    registry: Arc<SchemaRegistry>,
}

impl std::fmt::Debug for ResponseDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseDecoder").finish_non_exhaustive()
    }
}

impl ResponseDecoder {
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self { registry }
    }

    /// Decode a legacy-dialect response into governor limits.
    pub fn decode_limits(&self, response: &ExecuteResponse) -> Result<GovernorLimits, DecodeError> {
        let payload = self.classify(response, "script did not collect limits usage")?;
        self.validate(GOVERNOR_LIMITS_SCHEMA, &payload, response)?;
        serde_json::from_value(payload).map_err(|_| execution_error(response))
    }

    /// Decode a standard-dialect response into a benchmark report.
    pub fn decode_report(&self, response: &ExecuteResponse) -> Result<BenchmarkReport, DecodeError> {
        let payload = self.classify(response, "script did not assert false with benchmark data")?;
        self.validate(BENCHMARK_REPORT_SCHEMA, &payload, response)?;
        serde_json::from_value(payload).map_err(|_| execution_error(response))
    }

    /// Check a control-only response for compile or runtime failure.
    pub fn ensure_success(&self, response: &ExecuteResponse) -> Result<(), DecodeError> {
        if !response.compiled {
            return Err(compile_error(response));
        }
        if !response.succeeded {
            return Err(execution_error(response));
        }
        Ok(())
    }

    /// Classify a response in priority order: compile failure, then
    /// data-bearing error, then success-without-data.
    fn classify(
        &self,
        response: &ExecuteResponse,
        missing_data: &str,
    ) -> Result<JsonValue, DecodeError> {
        if !response.compiled {
            return Err(compile_error(response));
        }

        if response.succeeded {
            return Err(DecodeError::MissingData {
                message: missing_data.to_string(),
            });
        }

        let Some(raw) = extract_payload(&response.exception_message) else {
            // no data pattern: a genuine runtime failure
            return Err(execution_error(response));
        };

        debug!(bytes = raw.len(), "extracted embedded payload");
        // a malformed payload must not mask the real diagnostic
        serde_json::from_str(raw).map_err(|_| execution_error(response))
    }

    fn validate(
        &self,
        schema: &str,
        payload: &JsonValue,
        response: &ExecuteResponse,
    ) -> Result<(), DecodeError> {
        let validator = self
            .registry
            .validator(schema)
            .map_err(|e| DecodeError::Execution {
                message: e.to_string(),
            })?;
        if !validator.is_valid(payload) {
            return Err(execution_error(response));
        }
        Ok(())
    }
}

/* ===================== Payload Convention ===================== */

/// Extract the text between the first `-_` and the last `_-` of a message.
pub fn extract_payload(message: &str) -> Option<&str> {
    let start = message.find(DATA_MARKER_OPEN)? + DATA_MARKER_OPEN.len();
    let end = message[start..].rfind(DATA_MARKER_CLOSE)? + start;
    Some(&message[start..end])
}

/// Wrap a serialized payload in the data-marker convention.
pub fn encode_payload(json: &str) -> String {
    format!("{}{}{}", DATA_MARKER_OPEN, json, DATA_MARKER_CLOSE)
}

fn compile_error(response: &ExecuteResponse) -> DecodeError {
    DecodeError::Compile {
        line: response.line,
        column: response.column,
        problem: response.compile_problem.clone(),
    }
}

fn execution_error(response: &ExecuteResponse) -> DecodeError {
    DecodeError::Execution {
        message: response.exception_message.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoder() -> ResponseDecoder {
        ResponseDecoder::new(Arc::new(SchemaRegistry::new()))
    }

    fn limits_json() -> String {
        serde_json::to_string(&GovernorLimits {
            duration: 120,
            cpu_time: 64,
            db_statements: 1,
            db_rows: 10,
            queries: 3,
            query_rows: 200,
            heap_size: 4096,
            async_jobs: 0,
        })
        .unwrap()
    }

    fn failed_with_message(message: &str) -> ExecuteResponse {
        ExecuteResponse {
            compiled: true,
            succeeded: false,
            exception_message: message.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_limits_round_trip_through_marker_convention() {
        let message = format!("System.AssertException: {}", encode_payload(&limits_json()));
        let decoded = decoder().decode_limits(&failed_with_message(&message)).unwrap();
        assert_eq!(decoded.duration, 120);
        assert_eq!(decoded.cpu_time, 64);
        assert_eq!(decoded.query_rows, 200);
    }

    #[test]
    fn test_compile_error_references_problem_verbatim() {
        let response = ExecuteResponse {
            compiled: false,
            succeeded: false,
            compile_problem: "Unexpected token ')'".to_string(),
            line: 3,
            column: 14,
            ..Default::default()
        };
        let err = decoder().decode_limits(&response).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Compile Error (line 3, col 14): Unexpected token ')'"
        );
    }

    #[test]
    fn test_runtime_failure_without_payload_is_surfaced_unchanged() {
        let err = decoder()
            .decode_limits(&failed_with_message("NullPointerException at line 2"))
            .unwrap_err();
        assert_eq!(
            err,
            DecodeError::Execution {
                message: "NullPointerException at line 2".to_string()
            }
        );
    }

    #[test]
    fn test_malformed_payload_reraises_original_exception() {
        let message = "AssertException: -_{not json}_-";
        let err = decoder().decode_limits(&failed_with_message(message)).unwrap_err();
        assert_eq!(
            err,
            DecodeError::Execution {
                message: message.to_string()
            }
        );
    }

    #[test]
    fn test_partial_payload_reraises_original_exception() {
        let message = r#"AssertException: -_{"duration": 5}_-"#;
        let err = decoder().decode_limits(&failed_with_message(message)).unwrap_err();
        assert_eq!(
            err,
            DecodeError::Execution {
                message: message.to_string()
            }
        );
    }

    #[test]
    fn test_success_without_payload_is_missing_data() {
        let response = ExecuteResponse {
            compiled: true,
            succeeded: true,
            ..Default::default()
        };
        let err = decoder().decode_limits(&response).unwrap_err();
        assert!(matches!(err, DecodeError::MissingData { .. }));
    }

    #[test]
    fn test_report_carries_name_and_action_overrides() {
        let message = format!(
            "AssertException: -_{{\"name\":\"bulk insert\",\"action\":\"measure\",\"limits\":{}}}_-",
            limits_json()
        );
        let report = decoder().decode_report(&failed_with_message(&message)).unwrap();
        assert_eq!(report.name.as_deref(), Some("bulk insert"));
        assert_eq!(report.action.as_deref(), Some("measure"));
        assert_eq!(report.limits.heap_size, 4096);
    }

    #[test]
    fn test_payload_extraction_is_greedy() {
        // nested close markers stay inside the payload: first open, last close
        assert_eq!(extract_payload("x -_a_-b_- y"), Some("a_-b"));
        assert_eq!(extract_payload("no markers here"), None);
        assert_eq!(extract_payload("-_only open"), None);
    }
}
