//! Registry lookups through the system `whois` command.
//!
//! WHOIS output is unstructured text that differs per registry, so this
//! client does no parsing at all: it returns stdout verbatim and leaves the
//! interpretation to the classifier.

use super::run_tool;
use crate::error::{LookupStage, ScanError};
use std::time::Duration;

/// WHOIS client that runs `<command> <domain>`.
#[derive(Debug, Clone)]
pub struct WhoisClient {
    /// Binary to invoke
    command: String,
    /// Timeout for each WHOIS invocation
    timeout: Duration,
}

impl WhoisClient {
    /// Create a client for the system `whois` with a 30 second timeout.
    pub fn new() -> Self {
        Self::with_command("whois", Duration::from_secs(30))
    }

    /// Create a client that runs a different binary.
    pub fn with_command<S: Into<String>>(command: S, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            timeout,
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Query the registry for `domain`.
    ///
    /// # Returns
    ///
    /// The tool's standard output, unmodified.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::LookupFailure` if the command cannot be started or
    /// exits non-zero, and `ScanError::Timeout` if it runs past the timeout.
    pub async fn lookup(&self, domain: &str) -> Result<String, ScanError> {
        run_tool(LookupStage::Registry, &self.command, &[domain], domain, self.timeout).await
    }
}

impl Default for WhoisClient {
    fn default() -> Self {
        Self::new()
    }
}
