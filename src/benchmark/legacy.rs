//! Legacy-dialect validation and preparation
//!
//! Legacy scripts snapshot limits before and after the measured work, diff
//! the two snapshots, and assert-false with the serialized diff. They carry
//! their own measurement plumbing, so preparation sends them unmodified.

use crate::parser::analysis::ScriptAnalysis;
use crate::types::{Transaction, TransactionKind};

use super::decoder::DATA_MARKER_OPEN;
use super::{BenchmarkOptions, ValidationError};

/// Snapshot-current-limits method of the legacy convention.
pub const SNAPSHOT_METHOD: &str = "captureLimits";
/// Snapshot-diff method of the legacy convention.
pub const DIFF_METHOD: &str = "diffLimits";
/// Assertion method carrying the serialized diff.
pub const ASSERT_METHOD: &str = "assert";

/// Validate the legacy script shape, offline, before any transaction is
/// constructed or any remote call is made.
pub(super) fn validate(source: &str) -> Result<(), ValidationError> {
    let analysis =
        ScriptAnalysis::parse(source).map_err(|e| ValidationError::Unparseable(e.to_string()))?;

    let calls = analysis.method_calls();
    let dictionary =
        analysis.call_dictionary(&calls.external, &[SNAPSHOT_METHOD, DIFF_METHOD, ASSERT_METHOD]);

    let snapshots = dictionary[SNAPSHOT_METHOD].len();
    if snapshots < 2 {
        return Err(ValidationError::MissingSnapshots { found: snapshots });
    }

    if dictionary[DIFF_METHOD].is_empty() {
        return Err(ValidationError::MissingDiff);
    }

    // Wrong-shaped asserts are skipped rather than fatal: query errors on a
    // candidate translate into the validation verdict below.
    let has_data_assert = dictionary[ASSERT_METHOD].iter().any(|call| {
        let asserts_false = matches!(analysis.boolean_param(call, 0), Ok(false));
        let carries_marker = analysis
            .expression_param(call, 1)
            .map(|text| text.contains(DATA_MARKER_OPEN))
            .unwrap_or(false);
        asserts_false && carries_marker
    });
    if !has_data_assert {
        return Err(ValidationError::MissingDataAssert);
    }

    Ok(())
}

/// A validated legacy script is one self-contained Data transaction.
pub(super) fn prepare(source: &str, options: &BenchmarkOptions) -> Vec<Transaction> {
    vec![Transaction {
        action: options
            .actions
            .first()
            .cloned()
            .unwrap_or_else(|| "1".to_string()),
        code: source.to_string(),
        kind: TransactionKind::Data,
    }]
}
