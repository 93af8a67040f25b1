use serde::{Deserialize, Serialize};

/// How a transaction's remote response is interpreted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// The response is expected to carry a measured-data payload.
    Data,
    /// Control-only step (setup/teardown); no payload is extracted.
    Execute,
}

/// One remote-executable unit of script code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub action: String,
    pub code: String,
    pub kind: TransactionKind,
}

/// The fixed set of numeric resource counters measured per transaction.
///
/// All fields are mandatory on the wire; a partially-populated payload is a
/// schema violation, not a default-to-zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernorLimits {
    pub duration: i64,
    pub cpu_time: i64,
    pub db_statements: i64,
    pub db_rows: i64,
    pub queries: i64,
    pub query_rows: i64,
    pub heap_size: i64,
    pub async_jobs: i64,
}

/// One accepted measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub name: String,
    pub action: String,
    pub limits: GovernorLimits,
}

/// One failure, always attributable to a name+action pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResult {
    pub name: String,
    pub action: String,
    pub error: String,
}

/// Raw response from the remote execution collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResponse {
    pub compiled: bool,
    pub succeeded: bool,
    #[serde(default)]
    pub compile_problem: String,
    #[serde(default)]
    pub line: i32,
    #[serde(default)]
    pub column: i32,
    #[serde(default)]
    pub exception_message: String,
    #[serde(default)]
    pub exception_stack_trace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_log: Option<String>,
}

/// Debug options forwarded to the remote execution collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    #[serde(default)]
    pub capture_log: bool,
}
