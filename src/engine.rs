//! Aggregator/dispatcher: runs the selected analyzer set concurrently,
//! tolerates partial failure, escalates at most once, and assembles the
//! final report.
//!
//! Each analyzer invocation is an independent task with its own timeout;
//! the engine suspends only while collecting round results. A global
//! deadline bounds the whole call; on expiry the report is finalized
//! from whatever succeeded so far and flagged as partial.

use crate::analyzers::{Analyzer, AnalyzerRegistry};
use crate::config::EngineConfig;
use crate::core::{Finding, SignalSet, Subject};
use crate::errors::{EngineError, Result};
use crate::gate;
use crate::ladder::Ladder;
use crate::report::{AnalyzerFailure, EscalationDecision, FailureReason, Report};
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{timeout, timeout_at, Instant};

/// Report producer bound to one registry and one configuration.
///
/// The registry is read-only after construction, so a single engine is
/// safely shared across concurrent `produce_report` calls.
#[derive(Debug)]
pub struct Engine {
    registry: Arc<AnalyzerRegistry>,
    config: EngineConfig,
}

impl Engine {
    /// Validates the configuration up front; bad knobs never reach a
    /// dispatch.
    pub fn new(registry: Arc<AnalyzerRegistry>, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { registry, config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Produce a report for one subject.
    ///
    /// Fails only on configuration errors (all surfaced before any
    /// analyzer runs) or when zero analyzers succeed across both rounds.
    /// Individual analyzer failures are recorded in the report instead.
    pub async fn produce_report(
        &self,
        subject: &Subject,
        signals: &SignalSet,
        ladder: &Ladder,
    ) -> Result<Report> {
        let level = ladder.select_level(signals);
        let initial_ids = ladder.analyzers_for(level);
        let initial = self.registry.resolve(&initial_ids)?;

        // Resolve the supplementary set before dispatching anything so a
        // bad escalation reference fails fast like any other
        // configuration error. Analyzers already in the first round are
        // never re-run.
        let supplementary_ids: Vec<String> = match &self.config.escalation {
            Some(esc) => esc
                .analyzers
                .iter()
                .filter(|id| !initial_ids.contains(id))
                .cloned()
                .collect(),
            None => Vec::new(),
        };
        let supplementary = self.registry.resolve(&supplementary_ids)?;

        debug!(
            "subject '{}': level {} '{}', dispatching {} analyzers",
            subject.id,
            level.rank,
            level.name,
            initial.len()
        );

        let subject = Arc::new(subject.clone());
        let deadline = Instant::now() + self.config.global_deadline();

        let mut findings = Vec::new();
        let mut succeeded = Vec::new();
        let mut failed = Vec::new();

        let mut deadline_exceeded = self
            .run_round(
                initial,
                &subject,
                deadline,
                &mut findings,
                &mut succeeded,
                &mut failed,
            )
            .await;

        // At most one escalation round, ever.
        let escalation = match &self.config.escalation {
            None => EscalationDecision::skipped("no escalation rule configured"),
            Some(esc) if !esc.trigger.eval(signals) => {
                EscalationDecision::skipped("escalation trigger not satisfied")
            }
            Some(_) if deadline_exceeded => {
                EscalationDecision::skipped("deadline expired before the escalation round")
            }
            Some(_) if supplementary.is_empty() => EscalationDecision::skipped(
                "all supplementary analyzers already ran in the first round",
            ),
            Some(_) => {
                debug!(
                    "subject '{}': escalating with {} supplementary analyzers",
                    subject.id,
                    supplementary.len()
                );
                deadline_exceeded = self
                    .run_round(
                        supplementary,
                        &subject,
                        deadline,
                        &mut findings,
                        &mut succeeded,
                        &mut failed,
                    )
                    .await;
                EscalationDecision::triggered("escalation trigger satisfied")
            }
        };

        if succeeded.is_empty() {
            return Err(EngineError::NoAnalyzersSucceeded {
                attempted: failed.len(),
            });
        }

        let gated = gate::gate(findings, self.config.confidence_threshold)?;
        Ok(Report::assemble(
            level,
            gated,
            succeeded,
            failed,
            escalation,
            deadline_exceeded,
        ))
    }

    /// Convenience wrapper for synchronous embedders; builds a
    /// current-thread runtime per call.
    pub fn produce_report_blocking(
        &self,
        subject: &Subject,
        signals: &SignalSet,
        ladder: &Ladder,
    ) -> Result<Report> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(|e| EngineError::Configuration(format!("failed to start runtime: {e}")))?;
        runtime.block_on(self.produce_report(subject, signals, ladder))
    }

    /// Dispatch one round of analyzers and collect results first-come
    /// first-served. Collected results are folded back in dispatch order
    /// so the outcome is independent of completion timing. Returns true
    /// when the global deadline expired while results were still
    /// outstanding.
    async fn run_round(
        &self,
        analyzers: Vec<(String, Arc<dyn Analyzer>)>,
        subject: &Arc<Subject>,
        deadline: Instant,
        findings: &mut Vec<Finding>,
        succeeded: &mut Vec<String>,
        failed: &mut Vec<AnalyzerFailure>,
    ) -> bool {
        if analyzers.is_empty() {
            return false;
        }

        let per_call = self.config.analyzer_timeout();
        let semaphore = self
            .config
            .max_concurrency
            .map(|n| Arc::new(Semaphore::new(n)));

        let dispatch_order: Vec<String> = analyzers.iter().map(|(id, _)| id.clone()).collect();
        let mut tasks: JoinSet<(String, std::result::Result<Vec<Finding>, FailureReason>)> =
            JoinSet::new();

        for (id, analyzer) in analyzers {
            let subject = Arc::clone(subject);
            let semaphore = semaphore.clone();
            tasks.spawn(async move {
                let _permit = match semaphore {
                    Some(s) => s.acquire_owned().await.ok(),
                    None => None,
                };
                // The per-call clock starts once a concurrency slot is
                // held, so a bounded round does not time out analyzers
                // that merely waited their turn.
                let handle = tokio::task::spawn_blocking(move || analyzer.run(&subject));
                let outcome = match timeout(per_call, handle).await {
                    // Timed out: drop the handle and abandon the blocking
                    // call. Cancellation is best-effort; blocking work
                    // cannot be forcibly stopped.
                    Err(_) => Err(FailureReason::Timeout),
                    Ok(Err(join_error)) => Err(FailureReason::Panicked {
                        detail: join_error.to_string(),
                    }),
                    Ok(Ok(Err(error))) => Err(FailureReason::Failed {
                        detail: error.message,
                    }),
                    Ok(Ok(Ok(produced))) => Ok(produced),
                };
                (id, outcome)
            });
        }

        let mut completed: HashMap<String, std::result::Result<Vec<Finding>, FailureReason>> =
            HashMap::new();
        let mut deadline_hit = false;

        loop {
            match timeout_at(deadline, tasks.join_next()).await {
                Err(_) => {
                    tasks.abort_all();
                    deadline_hit = true;
                    break;
                }
                Ok(None) => break,
                Ok(Some(Ok((id, outcome)))) => {
                    if let Err(reason) = &outcome {
                        warn!("analyzer '{id}' {reason}");
                    }
                    completed.insert(id, outcome);
                }
                Ok(Some(Err(join_error))) => {
                    // The wrapper task itself was cancelled or panicked;
                    // attribution is lost but the engine must not crash.
                    warn!("analyzer task join error: {join_error}");
                }
            }
        }

        for id in dispatch_order {
            match completed.remove(&id) {
                Some(Ok(produced)) => {
                    findings.extend(produced.into_iter().map(|f| f.with_source(id.clone())));
                    succeeded.push(id);
                }
                Some(Err(reason)) => {
                    failed.push(AnalyzerFailure::new(id, reason));
                }
                None => {
                    let reason = if deadline_hit {
                        FailureReason::DeadlineExceeded
                    } else {
                        FailureReason::Panicked {
                            detail: "analyzer task aborted".to_string(),
                        }
                    };
                    warn!("analyzer '{id}' abandoned: {reason}");
                    failed.push(AnalyzerFailure::new(id, reason));
                }
            }
        }

        deadline_hit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_rejects_invalid_config() {
        let registry = Arc::new(AnalyzerRegistry::new());
        let config = EngineConfig {
            confidence_threshold: 2.0,
            ..EngineConfig::default()
        };
        let err = Engine::new(registry, config).unwrap_err();
        assert_eq!(err, EngineError::InvalidThreshold(2.0));
    }
}
