//! Benchmark construction, dialect detection, and lifecycle
//!
//! A benchmark is constructed once from raw source + options, prepares its
//! transaction list exactly once, and accumulates results/errors across any
//! number of runs. Which authoring convention a script follows decides how
//! it is prepared and how its results are extracted.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::types::{BenchmarkResult, ErrorResult, Transaction};

pub mod decoder;
pub mod legacy;
mod runner;
pub mod schema;
pub mod standard;


pub use decoder::{BenchmarkReport, DecodeError, ResponseDecoder};
pub use schema::SchemaRegistry;

/* ===================== Dialect Detection ===================== */

/// Known authoring conventions for benchmark scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Two-snapshot / diff / assert-false convention; self-contained.
    Legacy,
    /// Marker-wrapped sections over the prefixed framework bootstrap.
    Standard,
}

/// Pick the authoring convention for a script. Total and exclusive: a
/// script either carries the legacy diff signature or it is standard.
pub fn detect_dialect(source: &str) -> Dialect {
    if contains_call(source, legacy::DIFF_METHOD) {
        Dialect::Legacy
    } else {
        Dialect::Standard
    }
}

/* ===================== Options ===================== */

/// What happens to the transactions remaining after a Data-type failure.
/// Execute-type failures always abort the rest of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortPolicy {
    StopOnFirstError,
    ContinueAfterDataError,
}

#[derive(Debug, Clone, Default)]
pub struct BenchmarkOptions {
    /// Display name; a standard-dialect payload may override it.
    pub name: Option<String>,

    /// Action labels, one per measured section; missing entries default to
    /// the 1-based transaction index.
    pub actions: Vec<String>,

    /// Control-only code to run before the measured transactions.
    pub setup: Option<String>,

    /// Abort behavior override; defaults per dialect.
    pub abort_policy: Option<AbortPolicy>,

    /// Debug options forwarded to the remote collaborator on every call.
    pub debug: crate::types::DebugOptions,
}

/* ===================== Error Types ===================== */

/// The script's static shape does not satisfy the selected dialect.
/// Raised before any execution; fatal to constructing the benchmark.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("script does not capture a limits snapshot at least twice (found {found})")]
    MissingSnapshots { found: usize },

    #[error("script never diffs its limits snapshots")]
    MissingDiff,

    #[error("script does not assert false with embedded limits data")]
    MissingDataAssert,

    #[error("script does not match the script grammar: {0}")]
    Unparseable(String),
}

/* ===================== Benchmark ===================== */

/// One logical measurement run over a script.
///
/// Lifecycle: Constructed -> Prepared (transactions fixed, once) -> Run
/// (re-enterable; results/errors repopulated from scratch each time).
#[derive(Debug)]
pub struct Benchmark {
    name: String,
    dialect: Dialect,
    source: String,
    options: BenchmarkOptions,
    abort_policy: AbortPolicy,
    transactions: Vec<Transaction>,
    prepared: bool,
    decoder: ResponseDecoder,
    results: Vec<BenchmarkResult>,
    errors: Vec<ErrorResult>,
}

impl Benchmark {
    /// Construct a benchmark from raw source, selecting its dialect.
    /// Legacy-dialect scripts are validated here, before any transaction is
    /// constructed or any remote call is made.
    pub fn from_source(source: &str, options: BenchmarkOptions) -> Result<Self, ValidationError> {
        Self::with_registry(source, options, Arc::new(SchemaRegistry::new()))
    }

    /// As `from_source`, with a caller-supplied schema registry so
    /// concurrent benchmarks share one compiled-validator cache.
    pub fn with_registry(
        source: &str,
        options: BenchmarkOptions,
        registry: Arc<SchemaRegistry>,
    ) -> Result<Self, ValidationError> {
        let dialect = detect_dialect(source);
        if dialect == Dialect::Legacy {
            legacy::validate(source)?;
        }

        let abort_policy = options.abort_policy.unwrap_or(match dialect {
            Dialect::Legacy => AbortPolicy::StopOnFirstError,
            Dialect::Standard => AbortPolicy::ContinueAfterDataError,
        });

        Ok(Self {
            name: options.name.clone().unwrap_or_else(|| "benchmark".to_string()),
            dialect,
            source: source.to_string(),
            options,
            abort_policy,
            transactions: Vec::new(),
            prepared: false,
            decoder: ResponseDecoder::new(registry),
            results: Vec::new(),
            errors: Vec::new(),
        })
    }

    /// Fix the transaction list. Idempotent: repeated calls (and repeated
    /// runs) reuse the transactions prepared first.
    pub fn prepare(&mut self) -> &[Transaction] {
        if !self.prepared {
            self.transactions = match self.dialect {
                Dialect::Legacy => legacy::prepare(&self.source, &self.options),
                Dialect::Standard => standard::prepare(&self.source, &self.options),
            };
            self.prepared = true;
        }
        &self.transactions
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn abort_policy(&self) -> AbortPolicy {
        self.abort_policy
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn results(&self) -> &[BenchmarkResult] {
        &self.results
    }

    pub fn errors(&self) -> &[ErrorResult] {
        &self.errors
    }
}

/* ===================== Call Scanning ===================== */

/// True when `name` occurs in `source` as a call: at a token boundary,
/// followed (after whitespace) by an opening parenthesis.
pub(crate) fn contains_call(source: &str, name: &str) -> bool {
    next_call(source, name, 0).is_some()
}

/// Byte offset of the next call occurrence of `name` at or after `from`.
pub(crate) fn next_call(source: &str, name: &str, from: usize) -> Option<usize> {
    let bytes = source.as_bytes();
    let mut at = from;
    while let Some(found) = source[at..].find(name).map(|i| i + at) {
        let boundary_before = found == 0 || !is_ident_byte(bytes[found - 1]);
        let rest = source[found + name.len()..].trim_start();
        if boundary_before && rest.starts_with('(') {
            return Some(found);
        }
        at = found + 1;
    }
    None
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}
