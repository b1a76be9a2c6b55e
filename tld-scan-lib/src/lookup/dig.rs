//! Address resolution through `dig +short`.

use super::run_tool;
use crate::error::{LookupStage, ScanError};
use std::time::Duration;

/// Resolver client that runs `<command> +short <domain>`.
#[derive(Debug, Clone)]
pub struct DigClient {
    command: String,
    timeout: Duration,
}

impl DigClient {
    pub fn new() -> Self {
        Self::with_command("dig", Duration::from_secs(30))
    }

    pub fn with_command<S: Into<String>>(command: S, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            timeout,
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Resolve `domain` in terse form.
    ///
    /// The answer is the trimmed stdout, which may span several lines when a
    /// name has several records or a CNAME chain. Empty output is `Ok(None)`:
    /// the resolver answered, there just is no address.
    pub async fn resolve(&self, domain: &str) -> Result<Option<String>, ScanError> {
        let stdout = run_tool(
            LookupStage::Resolution,
            &self.command,
            &["+short", domain],
            domain,
            self.timeout,
        )
        .await?;

        let answer = stdout.trim();
        if answer.is_empty() {
            Ok(None)
        } else {
            Ok(Some(answer.to_string()))
        }
    }
}

impl Default for DigClient {
    fn default() -> Self {
        Self::new()
    }
}
