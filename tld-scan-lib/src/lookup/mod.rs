//! External lookup gateway.
//!
//! The scanner never talks to registries or resolvers itself. It shells out
//! to `whois` for registration data and to `dig +short` for addresses, and
//! hands the raw text back to the classifier.

/// Registry lookups via the system `whois` command
pub mod whois;

/// Address resolution via the system `dig` command
pub mod dig;

pub use dig::DigClient;
pub use whois::WhoisClient;

use crate::error::{LookupStage, ScanError};
use crate::types::ScanConfig;
use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// The two lookups a worker performs for each candidate.
///
/// Neither call retries; a failure is reported once and the candidate is
/// skipped. Futures returned here may be dropped at any time (timeout or
/// cancellation) and must clean up after themselves.
pub trait LookupGateway: Send + Sync + 'static {
    /// Raw registry output for `domain`.
    fn registry_lookup(&self, domain: &str) -> impl Future<Output = Result<String, ScanError>> + Send;

    /// Address answer for `domain`. `Ok(None)` means the lookup succeeded but
    /// returned nothing.
    fn resolve_address(
        &self,
        domain: &str,
    ) -> impl Future<Output = Result<Option<String>, ScanError>> + Send;
}

/// Gateway backed by the system `whois` and `dig` binaries.
#[derive(Debug, Clone)]
pub struct SystemGateway {
    whois: WhoisClient,
    dig: DigClient,
}

impl SystemGateway {
    pub fn new(whois: WhoisClient, dig: DigClient) -> Self {
        Self { whois, dig }
    }

    /// Build both clients from the scan configuration.
    pub fn from_config(config: &ScanConfig) -> Self {
        Self {
            whois: WhoisClient::with_command(&config.whois_command, config.lookup_timeout),
            dig: DigClient::with_command(&config.dig_command, config.lookup_timeout),
        }
    }

    /// Verify both binaries are installed.
    pub fn preflight(&self) -> Result<(), ScanError> {
        check_required_commands(&[self.whois.command(), self.dig.command()])
    }
}

impl Default for SystemGateway {
    fn default() -> Self {
        Self::from_config(&ScanConfig::default())
    }
}

impl LookupGateway for SystemGateway {
    async fn registry_lookup(&self, domain: &str) -> Result<String, ScanError> {
        self.whois.lookup(domain).await
    }

    async fn resolve_address(&self, domain: &str) -> Result<Option<String>, ScanError> {
        self.dig.resolve(domain).await
    }
}

/// Fail with `DependencyMissing` for the first tool that is not installed.
pub fn check_required_commands(tools: &[&str]) -> Result<(), ScanError> {
    for tool in tools {
        if find_command(tool).is_none() {
            return Err(ScanError::dependency_missing(*tool));
        }
    }
    Ok(())
}

/// Locate an executable on `PATH`.
///
/// Names containing a path separator are checked as given.
pub fn find_command(tool: &str) -> Option<PathBuf> {
    let tool = tool.trim();
    if tool.is_empty() {
        return None;
    }
    which::which(tool).ok()
}

/// Run `program args...` with a deadline and return its stdout.
///
/// A non-zero exit, a spawn failure and an expired deadline are all reported
/// as errors for `stage`. The child is killed if this future is dropped.
pub(crate) async fn run_tool(
    stage: LookupStage,
    program: &str,
    args: &[&str],
    domain: &str,
    timeout: Duration,
) -> Result<String, ScanError> {
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!(%stage, program, ?args, "spawning lookup");

    let output = match tokio::time::timeout(timeout, command.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            return Err(ScanError::lookup(
                stage,
                domain,
                format!("Failed to execute {} command: {}", program, e),
            ))
        }
        Err(_) => return Err(ScanError::timeout(stage, domain, timeout)),
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        let message = if stderr.is_empty() {
            format!("{} exited with {}", program, output.status)
        } else {
            format!("{} exited with {}: {}", program, output.status, stderr)
        };
        return Err(ScanError::lookup(stage, domain, message));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
