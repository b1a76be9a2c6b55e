//! Utility functions for base-domain validation and TLD list handling.

use crate::error::ScanError;
use crate::types::DomainCandidate;
use std::path::{Path, PathBuf};

/// Validate and normalise a base domain entered by the user.
///
/// The base is the label TLD suffixes are appended to, so it may not contain
/// dots. Surrounding whitespace is removed and the result lowercased.
///
/// # Returns
///
/// The cleaned base name, or `ScanError::InvalidDomain`.
pub fn validate_base_domain(domain: &str) -> Result<String, ScanError> {
    let domain = domain.trim();

    if domain.is_empty() {
        return Err(ScanError::invalid_domain(
            domain,
            "Domain name cannot be empty",
        ));
    }

    if domain.contains('.') {
        return Err(ScanError::invalid_domain(
            domain,
            "Enter the name without a TLD (e.g. 'amazon', not 'amazon.com')",
        ));
    }

    if !is_valid_base_name(domain) {
        return Err(ScanError::invalid_domain(
            domain,
            "Only letters, digits and inner hyphens are allowed (max 63 characters)",
        ));
    }

    Ok(domain.to_lowercase())
}

/// Validate that a base domain name (without TLD) is acceptable.
pub(crate) fn is_valid_base_name(domain: &str) -> bool {
    if domain.is_empty() || domain.len() > 63 {
        return false;
    }

    // Cannot start or end with hyphen
    if domain.starts_with('-') || domain.ends_with('-') {
        return false;
    }

    // Only allow alphanumeric and hyphens
    domain.chars().all(|c| c.is_alphanumeric() || c == '-')
}

/// Conventional results log name for a base domain: `<base>_tlds_results.log`.
pub fn results_log_name(base_domain: &str) -> PathBuf {
    PathBuf::from(format!("{}_tlds_results.log", base_domain))
}

/// Parse TLD list content: one suffix per line, blank lines ignored.
///
/// Entries are trimmed but otherwise kept as written, duplicates included.
pub fn parse_tld_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read a TLD list file.
///
/// # Errors
///
/// `ScanError::ConfigError` if the file does not exist, `ScanError::FileError`
/// if it exists but cannot be read as UTF-8 text.
pub async fn read_tld_list(path: &Path) -> Result<Vec<String>, ScanError> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Err(ScanError::config(format!(
            "File {} does not exist.",
            path.display()
        )));
    }

    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        ScanError::file_error(
            path.to_string_lossy(),
            format!("Failed to read TLD list: {}", e),
        )
    })?;

    Ok(parse_tld_list(&content))
}

/// Combine a base domain with every TLD entry, preserving order and duplicates.
pub fn expand_candidates(base_domain: &str, tlds: &[String]) -> Vec<DomainCandidate> {
    tlds.iter()
        .map(|tld| DomainCandidate::new(base_domain, tld))
        .collect()
}
