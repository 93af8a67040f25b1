//! Transaction runner: sequential execution with deterministic abort rules
//!
//! Data-type failures are soft and isolable per transaction; Execute-type
//! failures are hard aborts, since Execute steps are prerequisites whose
//! failure invalidates everything after them.

use tracing::{debug, warn};

use crate::remote::RemoteExecutor;
use crate::types::{BenchmarkResult, ErrorResult, Transaction, TransactionKind};

use super::{AbortPolicy, Benchmark, Dialect};

impl Benchmark {
    /// Execute the prepared transactions strictly in order, suspending on
    /// each remote call. Results and errors are cleared at the start of
    /// every run and reaccumulated; the transaction list is prepared once
    /// and reused. Per-transaction failures never propagate out of here:
    /// callers always receive the completed results/errors pair.
    pub async fn run(&mut self, executor: &dyn RemoteExecutor) {
        self.prepare();
        self.results.clear();
        self.errors.clear();

        let debug_options = self.options.debug.clone();
        let transactions = self.transactions.clone();

        for transaction in &transactions {
            debug!(
                action = %transaction.action,
                kind = ?transaction.kind,
                "executing transaction"
            );

            let response = match executor.execute(&transaction.code, &debug_options).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(action = %transaction.action, error = %e, "remote execution failed");
                    self.record_error(transaction, e.to_string());
                    if self.aborts(transaction.kind) {
                        break;
                    }
                    continue;
                }
            };

            match transaction.kind {
                TransactionKind::Execute => {
                    if let Err(e) = self.decoder.ensure_success(&response) {
                        self.record_error(transaction, e.to_string());
                        break;
                    }
                }
                TransactionKind::Data => {
                    let decoded = match self.dialect {
                        Dialect::Legacy => self
                            .decoder
                            .decode_limits(&response)
                            .map(|limits| (None, None, limits)),
                        Dialect::Standard => self
                            .decoder
                            .decode_report(&response)
                            .map(|report| (report.name, report.action, report.limits)),
                    };

                    match decoded {
                        Ok((name, action, limits)) => {
                            if let Some(name) = name {
                                // override applies to this and all subsequent reporting
                                self.name = name;
                            }
                            self.results.push(BenchmarkResult {
                                name: self.name.clone(),
                                action: action.unwrap_or_else(|| transaction.action.clone()),
                                limits,
                            });
                        }
                        Err(e) => {
                            self.record_error(transaction, e.to_string());
                            if self.aborts(TransactionKind::Data) {
                                break;
                            }
                        }
                    }
                }
            }
        }

        debug!(
            results = self.results.len(),
            errors = self.errors.len(),
            "benchmark run finished"
        );
    }

    fn record_error(&mut self, transaction: &Transaction, error: String) {
        self.errors.push(ErrorResult {
            name: self.name.clone(),
            action: transaction.action.clone(),
            error,
        });
    }

    fn aborts(&self, kind: TransactionKind) -> bool {
        match kind {
            TransactionKind::Execute => true,
            TransactionKind::Data => self.abort_policy == AbortPolicy::StopOnFirstError,
        }
    }
}
