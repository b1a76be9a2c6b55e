//! Scan coordinator.
//!
//! A scan session takes one TLD list and one base domain through
//! `Idle → Loading → Running → Draining → Completed`. While running, a fixed
//! pool of workers drains a shared [`WorkQueue`]; each worker does the
//! registry lookup, classifies the text, resolves active domains and writes
//! findings through the shared [`ResultSink`], then paces itself before
//! taking the next candidate.
//!
//! Cancellation is cooperative. Workers check the token before dequeuing and
//! before writing; pacing sleeps and in-flight lookups are interrupted (the
//! child process is killed), but a log write that has started always
//! finishes. A cancelled session ends in `Cancelled` without an end marker.

use crate::classifier::{Classification, MarkerClassifier, ResponseClassifier};
use crate::error::{LookupStage, ScanError};
use crate::lookup::{LookupGateway, SystemGateway};
use crate::pacing::{Pacing, RandomPacing};
use crate::queue::WorkQueue;
use crate::sink::ResultSink;
use crate::types::{
    DomainCandidate, FindingRecord, ScanConfig, ScanEvent, ScanReport, SessionState, Verdict,
};
use crate::utils::{expand_candidates, read_tld_list};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// In-memory state of one queue-drain pass.
#[derive(Debug)]
struct ScanSession {
    base_domain: String,
    tlds_file: PathBuf,
    workers: usize,
    queue: WorkQueue,
    cancel: CancellationToken,
    state: Mutex<SessionState>,
}

impl ScanSession {
    fn new(base_domain: &str, tlds_file: &Path, workers: usize, cancel: CancellationToken) -> Self {
        Self {
            base_domain: base_domain.to_string(),
            tlds_file: tlds_file.to_path_buf(),
            workers,
            queue: WorkQueue::new(),
            cancel,
            state: Mutex::new(SessionState::Idle),
        }
    }

    #[cfg(test)]
    fn state(&self) -> SessionState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move to `next` if the state machine allows it. Returns whether it moved.
    fn transition(&self, next: SessionState) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.can_transition_to(next) {
            debug!(base_domain = %self.base_domain, from = %*state, to = %next, "session state");
            *state = next;
            true
        } else {
            false
        }
    }
}

/// Outcome of checking a single candidate, before anything is written.
#[derive(Debug, Clone)]
pub struct CandidateCheck {
    pub verdict: Verdict,
    /// Present for active domains only
    pub record: Option<FindingRecord>,
}

/// Per-session counters shared by the workers.
#[derive(Debug, Default)]
struct Tally {
    processed: AtomicUsize,
    abandoned: AtomicUsize,
    available: AtomicUsize,
    active_with_address: AtomicUsize,
    active_without_address: AtomicUsize,
    indeterminate: AtomicUsize,
    lookup_errors: AtomicUsize,
}

impl Tally {
    fn count(&self, verdict: &Verdict) {
        self.processed.fetch_add(1, Ordering::Relaxed);
        let counter = match verdict {
            Verdict::Available => &self.available,
            Verdict::ActiveWithAddress { .. } => &self.active_with_address,
            Verdict::ActiveWithoutAddress => &self.active_without_address,
            Verdict::Indeterminate => &self.indeterminate,
            Verdict::LookupError { .. } => &self.lookup_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn abandon(&self, count: usize) {
        self.abandoned.fetch_add(count, Ordering::Relaxed);
    }
}

/// Drives scan sessions.
///
/// # Example
///
/// ```rust,no_run
/// use tld_scan_lib::{CancellationToken, ScanConfig, Scanner};
/// use std::path::Path;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let scanner = Scanner::new(ScanConfig::default());
///     let cancel = CancellationToken::new();
///     let report = scanner
///         .scan_file(
///             "example",
///             Path::new("tlds_single_dot.txt"),
///             Path::new("example_tlds_results.log"),
///             &cancel,
///         )
///         .await?;
///     println!("{} findings written to {}", report.recorded(), report.log_path.display());
///     Ok(())
/// }
/// ```
pub struct Scanner<G: LookupGateway = SystemGateway> {
    config: ScanConfig,
    gateway: Arc<G>,
    classifier: Arc<dyn ResponseClassifier>,
    pacing: Arc<dyn Pacing>,
    events: Option<UnboundedSender<ScanEvent>>,
}

impl Scanner<SystemGateway> {
    /// Scanner using the system `whois`/`dig`, the built-in markers and
    /// random pacing, all taken from `config`.
    pub fn new(config: ScanConfig) -> Self {
        let gateway = SystemGateway::from_config(&config);
        Self::with_gateway(config, gateway)
    }
}

impl<G: LookupGateway> Scanner<G> {
    /// Scanner with a custom lookup gateway.
    pub fn with_gateway(config: ScanConfig, gateway: G) -> Self {
        let pacing = RandomPacing::new(config.min_delay, config.max_delay);
        Self {
            config,
            gateway: Arc::new(gateway),
            classifier: Arc::new(MarkerClassifier::new()),
            pacing: Arc::new(pacing),
            events: None,
        }
    }

    /// Replace the response classifier.
    pub fn with_classifier<C: ResponseClassifier + 'static>(mut self, classifier: C) -> Self {
        self.classifier = Arc::new(classifier);
        self
    }

    /// Replace the pacing policy.
    pub fn with_pacing<P: Pacing + 'static>(mut self, pacing: P) -> Self {
        self.pacing = Arc::new(pacing);
        self
    }

    /// Stream progress events to `events` while sessions run.
    pub fn with_events(mut self, events: UnboundedSender<ScanEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Run the lookup and classification pipeline for one candidate.
    ///
    /// Nothing is written; the caller decides what to do with the record.
    pub async fn check_candidate(&self, candidate: &DomainCandidate) -> CandidateCheck {
        evaluate(self.gateway.as_ref(), self.classifier.as_ref(), candidate).await
    }

    /// Scan every entry of `tlds_file` against `base_domain`, appending
    /// findings to `log_path`.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::ConfigError` if the TLD list does not exist (no
    /// workers are started) and `ScanError::FileError` if the list or the log
    /// cannot be read or written. Per-candidate lookup failures are not
    /// errors; they show up in the report and the event stream.
    pub async fn scan_file(
        &self,
        base_domain: &str,
        tlds_file: &Path,
        log_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<ScanReport, ScanError> {
        let started = Instant::now();
        let session = Arc::new(ScanSession::new(
            base_domain,
            tlds_file,
            self.config.max_workers,
            cancel.clone(),
        ));
        let sink = Arc::new(ResultSink::new(log_path));

        session.transition(SessionState::Loading);
        let candidates = match self.load(&session, &sink).await {
            Ok(count) => count,
            Err(e) => {
                session.transition(SessionState::Idle);
                return Err(e);
            }
        };

        info!(
            base_domain,
            tlds_file = %tlds_file.display(),
            candidates,
            workers = session.workers,
            "starting verification"
        );
        self.emit(ScanEvent::Started {
            base_domain: base_domain.to_string(),
            tlds_file: tlds_file.to_path_buf(),
            candidates,
        });

        session.transition(SessionState::Running);
        if session.queue.is_empty() {
            session.transition(SessionState::Draining);
        }

        let tally = Arc::new(Tally::default());
        let handles: Vec<_> = (0..session.workers)
            .map(|id| {
                let worker = Worker {
                    id,
                    gateway: Arc::clone(&self.gateway),
                    classifier: Arc::clone(&self.classifier),
                    pacing: Arc::clone(&self.pacing),
                    session: Arc::clone(&session),
                    sink: Arc::clone(&sink),
                    tally: Arc::clone(&tally),
                    events: self.events.clone(),
                };
                tokio::spawn(worker.run())
            })
            .collect();

        for joined in futures::future::join_all(handles).await {
            if let Err(e) = joined {
                error!(error = %e, "scan worker terminated abnormally");
            }
        }

        let final_state = if cancel.is_cancelled() {
            tally.abandon(session.queue.clear());
            session.transition(SessionState::Cancelled);
            info!(base_domain, "verification cancelled");
            SessionState::Cancelled
        } else {
            // A worker that died abnormally may have left items behind.
            let leftover = session.queue.clear();
            if leftover > 0 {
                warn!(leftover, "candidates left unprocessed");
                tally.abandon(leftover);
            }
            session.transition(SessionState::Draining);
            sink.session_completed(base_domain).await?;
            session.transition(SessionState::Completed);
            info!(base_domain, log = %log_path.display(), "verification completed");
            SessionState::Completed
        };

        Ok(ScanReport {
            base_domain: base_domain.to_string(),
            tlds_file: tlds_file.to_path_buf(),
            log_path: log_path.to_path_buf(),
            state: final_state,
            candidates,
            processed: tally.processed.load(Ordering::Relaxed),
            abandoned: tally.abandoned.load(Ordering::Relaxed),
            available: tally.available.load(Ordering::Relaxed),
            active_with_address: tally.active_with_address.load(Ordering::Relaxed),
            active_without_address: tally.active_without_address.load(Ordering::Relaxed),
            indeterminate: tally.indeterminate.load(Ordering::Relaxed),
            lookup_errors: tally.lookup_errors.load(Ordering::Relaxed),
            elapsed_secs: started.elapsed().as_secs_f64(),
        })
    }

    /// Loading phase: read the list, fill the queue, write the start marker.
    async fn load(&self, session: &ScanSession, sink: &ResultSink) -> Result<usize, ScanError> {
        let tlds = read_tld_list(&session.tlds_file).await?;
        let candidates = expand_candidates(&session.base_domain, &tlds);
        let count = candidates.len();
        for candidate in candidates {
            session.queue.enqueue(candidate);
        }
        sink.session_started(&session.base_domain).await?;
        Ok(count)
    }

    fn emit(&self, event: ScanEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }
}

struct Worker<G> {
    id: usize,
    gateway: Arc<G>,
    classifier: Arc<dyn ResponseClassifier>,
    pacing: Arc<dyn Pacing>,
    session: Arc<ScanSession>,
    sink: Arc<ResultSink>,
    tally: Arc<Tally>,
    events: Option<UnboundedSender<ScanEvent>>,
}

impl<G: LookupGateway> Worker<G> {
    async fn run(self) {
        let cancel = self.session.cancel.clone();
        let mut attempt: u64 = 0;

        loop {
            if cancel.is_cancelled() {
                break;
            }

            let Some(candidate) = self.session.queue.dequeue() else {
                self.session.transition(SessionState::Draining);
                break;
            };
            if self.session.queue.is_empty() {
                self.session.transition(SessionState::Draining);
            }
            attempt += 1;

            let check = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(worker = self.id, domain = %candidate, "lookup interrupted by cancellation");
                    self.tally.abandon(1);
                    break;
                }
                check = evaluate(self.gateway.as_ref(), self.classifier.as_ref(), &candidate) => check,
            };

            if let Some(record) = &check.record {
                if cancel.is_cancelled() {
                    self.tally.abandon(1);
                    break;
                }
                if let Err(e) = self.sink.append(record).await {
                    error!(domain = %candidate, error = %e, "failed to record finding");
                }
            }

            self.tally.count(&check.verdict);
            if let Some(events) = &self.events {
                let _ = events.send(ScanEvent::Checked {
                    domain: candidate,
                    outcome: check.verdict,
                });
            }

            if self.session.queue.is_empty() {
                continue;
            }
            let delay = self.pacing.delay(attempt);
            if !delay.is_zero() {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }

        debug!(worker = self.id, attempts = attempt, "worker finished");
    }
}

/// Registry lookup, classification, and resolution for active domains.
async fn evaluate<G: LookupGateway>(
    gateway: &G,
    classifier: &dyn ResponseClassifier,
    candidate: &DomainCandidate,
) -> CandidateCheck {
    let domain = candidate.as_str();

    let raw = match gateway.registry_lookup(domain).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!(domain, error = %e, "registry lookup failed");
            return lookup_error(LookupStage::Registry, e);
        }
    };

    match classifier.classify(&raw) {
        Classification::Available => CandidateCheck {
            verdict: Verdict::Available,
            record: None,
        },
        Classification::Indeterminate => {
            debug!(domain, "registry output matched no markers");
            CandidateCheck {
                verdict: Verdict::Indeterminate,
                record: None,
            }
        }
        Classification::Active => match gateway.resolve_address(domain).await {
            Ok(address) => {
                let record = FindingRecord::active(candidate.clone(), address, raw);
                CandidateCheck {
                    verdict: record.verdict.clone(),
                    record: Some(record),
                }
            }
            Err(e) => {
                warn!(domain, error = %e, "address resolution failed");
                lookup_error(LookupStage::Resolution, e)
            }
        },
    }
}

fn lookup_error(stage: LookupStage, err: ScanError) -> CandidateCheck {
    CandidateCheck {
        verdict: Verdict::LookupError {
            stage: err.lookup_stage().unwrap_or(stage),
            message: err.to_string(),
        },
        record: None,
    }
}
