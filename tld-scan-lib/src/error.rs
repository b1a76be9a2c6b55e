//! Error handling for TLD scanning operations.
//!
//! This module defines the error type shared by every layer of the scanner,
//! from the pre-flight dependency check down to a single failed `dig` call.

use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Which external lookup produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupStage {
    /// Registry query (`whois <domain>`)
    Registry,
    /// Address resolution (`dig +short <domain>`)
    Resolution,
}

impl fmt::Display for LookupStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupStage::Registry => write!(f, "WHOIS"),
            LookupStage::Resolution => write!(f, "DIG"),
        }
    }
}

/// Main error type for scanning operations.
///
/// Per-candidate failures (`LookupFailure`, `Timeout`) never abort a scan; the
/// coordinator turns them into a [`crate::Verdict::LookupError`] and moves on.
/// `DependencyMissing` and `ConfigError` abort at a coarser granularity.
#[derive(Debug, Clone)]
pub enum ScanError {
    /// A required external tool is not on the system path
    DependencyMissing { tool: String },

    /// Invalid settings or a missing TLD list
    ConfigError { message: String },

    /// The base domain entered by the user is not usable
    InvalidDomain { domain: String, reason: String },

    /// File I/O errors (TLD list, results log)
    FileError { path: String, message: String },

    /// An external lookup could not be run or exited non-zero
    LookupFailure {
        stage: LookupStage,
        domain: String,
        message: String,
    },

    /// An external lookup exceeded the per-call timeout
    Timeout {
        stage: LookupStage,
        domain: String,
        duration: Duration,
    },

    /// Generic internal errors that don't fit other categories
    Internal { message: String },
}

impl ScanError {
    /// Create a new dependency error.
    pub fn dependency_missing<T: Into<String>>(tool: T) -> Self {
        Self::DependencyMissing { tool: tool.into() }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new invalid domain error.
    pub fn invalid_domain<D: Into<String>, R: Into<String>>(domain: D, reason: R) -> Self {
        Self::InvalidDomain {
            domain: domain.into(),
            reason: reason.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new lookup failure.
    pub fn lookup<D: Into<String>, M: Into<String>>(stage: LookupStage, domain: D, message: M) -> Self {
        Self::LookupFailure {
            stage,
            domain: domain.into(),
            message: message.into(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout<D: Into<String>>(stage: LookupStage, domain: D, duration: Duration) -> Self {
        Self::Timeout {
            stage,
            domain: domain.into(),
            duration,
        }
    }

    /// Lookup stage for per-candidate errors, `None` for everything else.
    pub fn lookup_stage(&self) -> Option<LookupStage> {
        match self {
            Self::LookupFailure { stage, .. } | Self::Timeout { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Whether this error ends the whole run rather than one session or candidate.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::DependencyMissing { .. })
    }

    /// Process exit status the CLI uses when this error ends the run.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::DependencyMissing { .. } => 3,
            _ => 1,
        }
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DependencyMissing { tool } => {
                write!(f, "Command '{}' is not installed", tool)
            }
            Self::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            Self::InvalidDomain { domain, reason } => {
                write!(f, "Invalid domain '{}': {}", domain, reason)
            }
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
            Self::LookupFailure {
                stage,
                domain,
                message,
            } => {
                write!(f, "{} error for '{}': {}", stage, domain, message)
            }
            Self::Timeout {
                stage,
                domain,
                duration,
            } => {
                write!(f, "{} lookup for '{}' timed out after {:?}", stage, domain, duration)
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for ScanError {}

impl From<std::io::Error> for ScanError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal {
            message: format!("I/O error: {}", err),
        }
    }
}

impl From<toml::de::Error> for ScanError {
    fn from(err: toml::de::Error) -> Self {
        Self::ConfigError {
            message: format!("Failed to parse TOML configuration: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ScanError::dependency_missing("dig").exit_code(), 3);
        assert_eq!(ScanError::config("no list").exit_code(), 1);
        assert!(ScanError::dependency_missing("whois").is_fatal());
        assert!(!ScanError::config("no list").is_fatal());
    }

    #[test]
    fn test_lookup_stage() {
        let err = ScanError::lookup(LookupStage::Resolution, "example.com", "exit status 9");
        assert_eq!(err.lookup_stage(), Some(LookupStage::Resolution));
        assert_eq!(
            err.to_string(),
            "DIG error for 'example.com': exit status 9"
        );

        let err = ScanError::timeout(LookupStage::Registry, "example.com", Duration::from_secs(2));
        assert_eq!(err.lookup_stage(), Some(LookupStage::Registry));
        assert!(ScanError::config("no list").lookup_stage().is_none());
    }

    #[test]
    fn test_io_error_is_internal() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = ScanError::from(io);
        assert!(matches!(err, ScanError::Internal { .. }));
        assert!(err.to_string().contains("I/O error: denied"), "{}", err);
        assert_eq!(err.exit_code(), 1);
    }
}
