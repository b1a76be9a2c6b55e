//! # TLD Scan Library
//!
//! Concurrent availability scanning of one base name across a list of
//! top-level domains, driven by the system `whois` and `dig` tools.
//!
//! Every `<base><tld>` candidate is looked up in the registry, classified as
//! available, active or undetermined from the raw text, and, when active,
//! resolved to an address. Active findings are appended to a results log;
//! everything else is reported through [`ScanEvent`]s and the final
//! [`ScanReport`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tld_scan_lib::{CancellationToken, ScanConfig, Scanner};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let scanner = Scanner::new(ScanConfig::default().with_workers(8));
//!     scanner.gateway().preflight()?;
//!
//!     let report = scanner
//!         .scan_file(
//!             "example",
//!             Path::new("tlds_single_dot.txt"),
//!             Path::new("example_tlds_results.log"),
//!             &CancellationToken::new(),
//!         )
//!         .await?;
//!
//!     println!("{} of {} candidates are taken", report.recorded(), report.candidates);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Worker pool**: a fixed number of tokio tasks drain a shared queue
//! - **Pacing**: randomized delay between a worker's lookups
//! - **Cancellation**: in-flight lookups stop promptly, the log stays well-formed
//! - **Configurable**: TOML files, `TS_*` environment variables, extra markers

// Re-export main public API types and functions
// This makes them available as tld_scan_lib::TypeName
pub use classifier::{
    Classification, MarkerClassifier, MarkerRule, MatchScope, ResponseClassifier, RuleEffect,
};
pub use config::{
    load_env_config, validate_pacing, validate_workers, ClassifierConfig, ConfigManager,
    DefaultsConfig, EnvConfig, FileConfig, DEFAULT_MULTI_TLDS_FILE, DEFAULT_TLDS_FILE,
};
pub use error::{LookupStage, ScanError};
pub use lookup::{
    check_required_commands, find_command, DigClient, LookupGateway, SystemGateway, WhoisClient,
};
pub use pacing::{NoPacing, Pacing, RandomPacing};
pub use queue::WorkQueue;
pub use scanner::{CandidateCheck, Scanner};
pub use sink::ResultSink;
pub use types::{
    DomainCandidate, FindingRecord, ScanConfig, ScanEvent, ScanReport, SessionState, Verdict,
};
pub use utils::{
    expand_candidates, parse_tld_list, read_tld_list, results_log_name, validate_base_domain,
};

pub use config::parse_duration_string;
pub use tokio_util::sync::CancellationToken;

// Internal modules - these are not part of the public API
mod classifier;
mod config;
mod error;
mod lookup;
mod pacing;
mod queue;
mod scanner;
mod sink;
mod types;
mod utils;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, ScanError>;

// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
