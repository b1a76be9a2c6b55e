//! Core data types for TLD scanning.
//!
//! This module defines the values that flow through a scan: candidates built
//! from TLD-list lines, verdicts, durable findings, session state, the scan
//! configuration, and the report handed back to the caller.

use crate::error::LookupStage;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// A fully qualified domain to check: base name plus TLD suffix.
///
/// `DomainCandidate::new("example", ".com")` is `example.com`. A suffix given
/// without its leading dot (`"com"`) is treated the same as `".com"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DomainCandidate(String);

impl DomainCandidate {
    /// Combine a base name with one TLD-list entry.
    pub fn new(base_domain: &str, tld: &str) -> Self {
        let tld = tld.trim();
        if tld.starts_with('.') {
            Self(format!("{}{}", base_domain, tld))
        } else {
            Self(format!("{}.{}", base_domain, tld))
        }
    }

    /// The full domain name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DomainCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DomainCandidate {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Classification of one candidate after its lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    /// Registry output matched an availability marker
    Available,

    /// Registry output looked active and `dig` returned an answer
    ActiveWithAddress { address: String },

    /// Registry output looked active but `dig` returned nothing
    ActiveWithoutAddress,

    /// Registry output matched neither pattern family
    Indeterminate,

    /// One of the external lookups failed
    LookupError { stage: LookupStage, message: String },
}

impl Verdict {
    /// Whether this verdict produces a Finding Record in the log.
    pub fn is_recorded(&self) -> bool {
        matches!(
            self,
            Verdict::ActiveWithAddress { .. } | Verdict::ActiveWithoutAddress
        )
    }

    /// Resolved address, if any.
    pub fn address(&self) -> Option<&str> {
        match self {
            Verdict::ActiveWithAddress { address } => Some(address),
            _ => None,
        }
    }
}

/// A durable finding: one active domain and the registry text behind it.
#[derive(Debug, Clone)]
pub struct FindingRecord {
    pub domain: DomainCandidate,
    pub verdict: Verdict,
    /// Registry output exactly as the tool printed it
    pub raw_registry_text: String,
    pub timestamp: DateTime<Local>,
}

impl FindingRecord {
    /// Build a record for an active domain; `address` is the `dig +short` answer.
    pub fn active(domain: DomainCandidate, address: Option<String>, raw_registry_text: String) -> Self {
        let verdict = match address {
            Some(address) => Verdict::ActiveWithAddress { address },
            None => Verdict::ActiveWithoutAddress,
        };
        Self {
            domain,
            verdict,
            raw_registry_text,
            timestamp: Local::now(),
        }
    }

    /// Reason text written after the arrow in the log entry.
    pub fn reason(&self) -> String {
        match self.verdict.address() {
            Some(address) => format!("IP found: {}", address),
            None => "Active without IP".to_string(),
        }
    }
}

/// Lifecycle of one scan session.
///
/// `Idle → Loading → Running → Draining → Completed`, with `Cancelled`
/// reachable from `Running` and `Draining`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Loading,
    Running,
    Draining,
    Completed,
    Cancelled,
}

impl SessionState {
    /// Whether `next` is a legal successor of `self`.
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Idle, Loading)
                | (Loading, Idle)
                | (Loading, Running)
                | (Running, Draining)
                | (Running, Cancelled)
                | (Draining, Completed)
                | (Draining, Cancelled)
        )
    }

    /// Completed and Cancelled are terminal.
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Cancelled)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Loading => "loading",
            SessionState::Running => "running",
            SessionState::Draining => "draining",
            SessionState::Completed => "completed",
            SessionState::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Configuration options for a scan.
///
/// Defaults mirror the behaviour users expect from the interactive tool:
/// five workers, a 1-3 second random pause between lookups, and the system
/// `whois` and `dig` binaries.
#[derive(Debug, Clone, Serialize)]
pub struct ScanConfig {
    /// Number of concurrent workers
    /// Default: 5, Range: 1-100
    pub max_workers: usize,

    /// Lower bound of the per-worker pause between candidates
    /// Default: 1 second
    #[serde(skip)]
    pub min_delay: Duration,

    /// Upper bound of the per-worker pause between candidates
    /// Default: 3 seconds
    #[serde(skip)]
    pub max_delay: Duration,

    /// Limit for each individual whois or dig invocation
    /// Default: 30 seconds
    #[serde(skip)]
    pub lookup_timeout: Duration,

    /// Registry lookup binary
    pub whois_command: String,

    /// Address resolution binary
    pub dig_command: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_workers: 5,
            min_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(3),
            lookup_timeout: Duration::from_secs(30),
            whois_command: "whois".to_string(),
            dig_command: "dig".to_string(),
        }
    }
}

impl ScanConfig {
    /// Set the worker count, capped to 1-100.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.max_workers = workers.clamp(1, 100);
        self
    }

    /// Set the pacing window. Bounds given in the wrong order are swapped.
    pub fn with_pacing(mut self, min_delay: Duration, max_delay: Duration) -> Self {
        if min_delay <= max_delay {
            self.min_delay = min_delay;
            self.max_delay = max_delay;
        } else {
            self.min_delay = max_delay;
            self.max_delay = min_delay;
        }
        self
    }

    /// Set the per-lookup timeout.
    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    /// Use a different registry lookup binary.
    pub fn with_whois_command<S: Into<String>>(mut self, command: S) -> Self {
        self.whois_command = command.into();
        self
    }

    /// Use a different resolution binary.
    pub fn with_dig_command<S: Into<String>>(mut self, command: S) -> Self {
        self.dig_command = command.into();
        self
    }
}

/// Summary of one finished (or cancelled) scan session.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub base_domain: String,
    pub tlds_file: PathBuf,
    pub log_path: PathBuf,
    pub state: SessionState,
    /// Candidates loaded from the TLD list
    pub candidates: usize,
    /// Candidates a worker finished with
    pub processed: usize,
    /// Candidates left behind because the scan was cancelled
    pub abandoned: usize,
    pub available: usize,
    pub active_with_address: usize,
    pub active_without_address: usize,
    pub indeterminate: usize,
    pub lookup_errors: usize,
    pub elapsed_secs: f64,
}

impl ScanReport {
    /// Number of Finding Records written during the session.
    pub fn recorded(&self) -> usize {
        self.active_with_address + self.active_without_address
    }

    pub fn was_cancelled(&self) -> bool {
        self.state == SessionState::Cancelled
    }
}

/// Progress notifications streamed while a session runs.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScanEvent {
    /// The TLD list was loaded and workers are about to start
    Started {
        base_domain: String,
        tlds_file: PathBuf,
        candidates: usize,
    },

    /// A worker finished one candidate
    Checked {
        domain: DomainCandidate,
        outcome: Verdict,
    },
}
