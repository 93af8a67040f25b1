//! Standard-dialect preparation: bootstrap prefix and marker injection
//!
//! Standard scripts are measured as one or more `start()`/`stop()`-wrapped
//! sections. The framework bootstrap defining the markers is prefixed to
//! every transaction; missing markers are injected without ever duplicating
//! ones already present.

use crate::types::{Transaction, TransactionKind};

use super::{next_call, contains_call, BenchmarkOptions};

/// Marker opening a measured section.
pub const START_MARKER: &str = "start";
/// Marker closing a measured section and emitting its payload.
pub const STOP_MARKER: &str = "stop";

/// Framework code prefixed to every standard-dialect transaction. `stop()`
/// smuggles the collected limits back through an assert-false message.
pub const BOOTSTRAP: &str = r#"LimitsProbe __probe = new LimitsProbe();
void start() {
    __probe.open(captureLimits());
}
void stop() {
    __probe.close(captureLimits());
    System.assert(false, '-_' + Json.serialize(__probe.report()) + '_-');
}
"#;

pub(super) fn prepare(source: &str, options: &BenchmarkOptions) -> Vec<Transaction> {
    let mut transactions = Vec::new();

    if let Some(setup) = &options.setup {
        transactions.push(Transaction {
            action: "setup".to_string(),
            code: format!("{}\n{}", BOOTSTRAP, setup),
            kind: TransactionKind::Execute,
        });
    }

    for (index, section) in split_sections(source).iter().enumerate() {
        transactions.push(Transaction {
            action: options
                .actions
                .get(index)
                .cloned()
                .unwrap_or_else(|| (index + 1).to_string()),
            code: format!("{}\n{}", BOOTSTRAP, normalize_section(section)),
            kind: TransactionKind::Data,
        });
    }

    transactions
}

/// Split a script into measured sections. A split point falls after the
/// statement terminator of each `stop(...)` call; a trailing unmarked chunk
/// becomes its own section, normalized like any other.
fn split_sections(source: &str) -> Vec<String> {
    let mut sections = Vec::new();
    let mut at = 0;

    while let Some(stop_at) = next_call(source, STOP_MARKER, at) {
        let after = match source[stop_at..].find(';') {
            Some(i) => stop_at + i + 1,
            None => source.len(),
        };
        sections.push(source[at..after].to_string());
        at = after;
    }

    let rest = &source[at..];
    if !rest.trim().is_empty() {
        sections.push(rest.to_string());
    }

    if sections.is_empty() {
        sections.push(source.to_string());
    }
    sections
}

/// Inject whichever markers a section lacks. Present markers are never
/// duplicated.
fn normalize_section(section: &str) -> String {
    let has_start = contains_call(section, START_MARKER);
    let has_stop = contains_call(section, STOP_MARKER);

    let mut code = String::new();
    if !has_start {
        code.push_str("start();\n");
    }
    code.push_str(section.trim());
    if !has_stop {
        code.push_str("\nstop();");
    }
    code
}
