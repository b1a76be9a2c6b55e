//! Configuration file parsing and management.
//!
//! Settings come from four layers. Highest precedence first:
//!
//! 1. Command-line flags (applied by the CLI)
//! 2. `TS_*` environment variables ([`load_env_config`])
//! 3. TOML configuration files ([`ConfigManager`])
//! 4. Built-in defaults ([`ScanConfig::default`])

use crate::classifier::MarkerClassifier;
use crate::error::ScanError;
use crate::types::ScanConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Default single-level TLD list, relative to the working directory.
pub const DEFAULT_TLDS_FILE: &str = "tlds_single_dot.txt";

/// Default multi-level TLD list, relative to the working directory.
pub const DEFAULT_MULTI_TLDS_FILE: &str = "tlds_multiple_dots.txt";

/// Configuration loaded from TOML files.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Default values for CLI options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    /// Extra classifier markers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classifier: Option<ClassifierConfig>,
}

/// Default configuration values that map to CLI options.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DefaultsConfig {
    /// Number of concurrent workers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,

    /// Lower pacing bound (e.g. "1s", "500ms")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_delay: Option<String>,

    /// Upper pacing bound
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_delay: Option<String>,

    /// Per-lookup timeout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub whois_command: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dig_command: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tlds_file: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub multi_tlds_file: Option<PathBuf>,
}

/// Markers appended to the built-in classifier tables.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClassifierConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_markers: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_markers: Option<Vec<String>>,
}

impl FileConfig {
    /// Apply the `[defaults]` section on top of `config`.
    ///
    /// Values are assumed validated (see [`ConfigManager::load_file`]);
    /// unparsable durations are skipped.
    pub fn apply_to(&self, mut config: ScanConfig) -> ScanConfig {
        let Some(defaults) = &self.defaults else {
            return config;
        };

        if let Some(workers) = defaults.workers {
            config = config.with_workers(workers);
        }
        let min = defaults
            .min_delay
            .as_deref()
            .and_then(parse_duration_string)
            .unwrap_or(config.min_delay);
        let max = defaults
            .max_delay
            .as_deref()
            .and_then(parse_duration_string)
            .unwrap_or(config.max_delay);
        config = config.with_pacing(min, max);
        if let Some(timeout) = defaults.timeout.as_deref().and_then(parse_duration_string) {
            config = config.with_lookup_timeout(timeout);
        }
        if let Some(whois) = &defaults.whois_command {
            config = config.with_whois_command(whois.as_str());
        }
        if let Some(dig) = &defaults.dig_command {
            config = config.with_dig_command(dig.as_str());
        }
        config
    }

    /// Single-level TLD list path from the file, if set.
    pub fn tlds_file(&self) -> Option<&Path> {
        self.defaults.as_ref()?.tlds_file.as_deref()
    }

    /// Multi-level TLD list path from the file, if set.
    pub fn multi_tlds_file(&self) -> Option<&Path> {
        self.defaults.as_ref()?.multi_tlds_file.as_deref()
    }

    /// Built-in classifier extended with the `[classifier]` markers.
    pub fn build_classifier(&self) -> MarkerClassifier {
        let mut classifier = MarkerClassifier::new();
        let Some(extra) = &self.classifier else {
            return classifier;
        };

        for marker in extra.available_markers.iter().flatten() {
            classifier = classifier.with_available_marker(marker);
        }
        for marker in extra.active_markers.iter().flatten() {
            classifier = classifier.with_active_marker(marker);
        }
        classifier
    }
}

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    /// Whether to report which files were picked up
    pub verbose: bool,
}

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// `ScanError::FileError` if the file is missing or unreadable,
    /// `ScanError::ConfigError` if it is not valid TOML or fails validation.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, ScanError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ScanError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            ScanError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content)?;
        self.validate_config(&config)?;

        debug!(path = %path.display(), "loaded configuration file");
        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// Every file found is loaded; later files override earlier ones key by
    /// key. A file that fails to parse is reported and skipped.
    pub fn discover_and_load(&self) -> Result<FileConfig, ScanError> {
        let mut merged_config = FileConfig::default();
        let mut loaded_files = Vec::new();

        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        for path in candidates.into_iter().flatten() {
            match self.load_file(&path) {
                Ok(config) => {
                    merged_config = self.merge_configs(merged_config, config);
                    loaded_files.push(path);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "ignoring configuration file"),
            }
        }

        if self.verbose && loaded_files.len() > 1 {
            for (i, path) in loaded_files.iter().enumerate() {
                let role = if i == loaded_files.len() - 1 {
                    "highest precedence"
                } else {
                    "overridden where keys repeat"
                };
                debug!(path = %path.display(), role, "configuration layer");
            }
        }

        Ok(merged_config)
    }

    /// `./tld-scan.toml` in the working directory.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        let path = Path::new("./tld-scan.toml");
        path.exists().then(|| path.to_path_buf())
    }

    /// `~/.tld-scan.toml`.
    fn get_global_config_path(&self) -> Option<PathBuf> {
        let path = Path::new(&env::var_os("HOME")?).join(".tld-scan.toml");
        path.exists().then_some(path)
    }

    /// Follows the XDG Base Directory Specification.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("tld-scan").join("config.toml");
        path.exists().then_some(path)
    }

    /// Merge two configurations. Values from `higher` win.
    fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            defaults: match (lower.defaults, higher.defaults) {
                (Some(lower), Some(higher)) => Some(DefaultsConfig {
                    workers: higher.workers.or(lower.workers),
                    min_delay: higher.min_delay.or(lower.min_delay),
                    max_delay: higher.max_delay.or(lower.max_delay),
                    timeout: higher.timeout.or(lower.timeout),
                    whois_command: higher.whois_command.or(lower.whois_command),
                    dig_command: higher.dig_command.or(lower.dig_command),
                    tlds_file: higher.tlds_file.or(lower.tlds_file),
                    multi_tlds_file: higher.multi_tlds_file.or(lower.multi_tlds_file),
                }),
                (lower, higher) => higher.or(lower),
            },
            classifier: match (lower.classifier, higher.classifier) {
                // Markers accumulate across layers
                (Some(mut lower), Some(higher)) => {
                    extend_markers(&mut lower.available_markers, higher.available_markers);
                    extend_markers(&mut lower.active_markers, higher.active_markers);
                    Some(lower)
                }
                (lower, higher) => higher.or(lower),
            },
        }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), ScanError> {
        if let Some(defaults) = &config.defaults {
            if let Some(workers) = defaults.workers {
                validate_workers(workers)?;
            }

            let min = defaults
                .min_delay
                .as_deref()
                .map(|v| parse_duration_setting("min_delay", v))
                .transpose()?;
            let max = defaults
                .max_delay
                .as_deref()
                .map(|v| parse_duration_setting("max_delay", v))
                .transpose()?;
            if let (Some(min), Some(max)) = (min, max) {
                validate_pacing(min, max)?;
            }

            if let Some(timeout) = &defaults.timeout {
                let timeout = parse_duration_setting("timeout", timeout)?;
                if timeout.is_zero() {
                    return Err(ScanError::config("timeout must be greater than zero"));
                }
            }

            for (key, value) in [
                ("whois_command", &defaults.whois_command),
                ("dig_command", &defaults.dig_command),
            ] {
                if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                    return Err(ScanError::config(format!("{} cannot be empty", key)));
                }
            }
        }

        if let Some(classifier) = &config.classifier {
            let markers = classifier
                .available_markers
                .iter()
                .chain(classifier.active_markers.iter())
                .flatten();
            for marker in markers {
                if marker.trim().is_empty() {
                    return Err(ScanError::config("Classifier markers cannot be empty"));
                }
            }
        }

        Ok(())
    }
}

fn extend_markers(lower: &mut Option<Vec<String>>, higher: Option<Vec<String>>) {
    if let Some(higher) = higher {
        lower.get_or_insert_with(Vec::new).extend(higher);
    }
}

/// Worker count must be between 1 and 100.
pub fn validate_workers(workers: usize) -> Result<(), ScanError> {
    if workers == 0 || workers > 100 {
        return Err(ScanError::config("Workers must be between 1 and 100"));
    }
    Ok(())
}

/// The pacing lower bound may not exceed the upper bound.
pub fn validate_pacing(min: Duration, max: Duration) -> Result<(), ScanError> {
    if min > max {
        return Err(ScanError::config(format!(
            "min_delay ({:?}) cannot be greater than max_delay ({:?})",
            min, max
        )));
    }
    Ok(())
}

fn parse_duration_setting(key: &str, value: &str) -> Result<Duration, ScanError> {
    parse_duration_string(value).ok_or_else(|| {
        ScanError::config(format!(
            "Invalid {} '{}'. Use a format like '500ms', '2s', '1m'",
            key, value
        ))
    })
}

/// Environment variable configuration that mirrors CLI options.
///
/// This represents configuration values that can be set via `TS_*`
/// environment variables.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub workers: Option<usize>,
    pub min_delay: Option<Duration>,
    pub max_delay: Option<Duration>,
    pub timeout: Option<Duration>,
    pub whois_command: Option<String>,
    pub dig_command: Option<String>,
    pub tlds_file: Option<PathBuf>,
    pub multi_tlds_file: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

/// Load configuration from the process environment.
///
/// Invalid values are logged as warnings and ignored.
pub fn load_env_config() -> EnvConfig {
    EnvConfig::from_lookup(|key| env::var(key).ok())
}

impl EnvConfig {
    /// Parse `TS_*` values through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut env_config = EnvConfig::default();

        if let Some(val) = lookup("TS_WORKERS") {
            match val.trim().parse::<usize>() {
                Ok(workers) if validate_workers(workers).is_ok() => {
                    debug!(workers, "using TS_WORKERS");
                    env_config.workers = Some(workers);
                }
                _ => warn!(value = %val, "invalid TS_WORKERS, must be 1-100"),
            }
        }

        env_config.min_delay = duration_var(&lookup, "TS_MIN_DELAY");
        env_config.max_delay = duration_var(&lookup, "TS_MAX_DELAY");
        env_config.timeout = duration_var(&lookup, "TS_TIMEOUT").filter(|t| !t.is_zero());

        env_config.whois_command = string_var(&lookup, "TS_WHOIS");
        env_config.dig_command = string_var(&lookup, "TS_DIG");
        env_config.tlds_file = string_var(&lookup, "TS_TLDS_FILE").map(PathBuf::from);
        env_config.multi_tlds_file = string_var(&lookup, "TS_MULTI_TLDS_FILE").map(PathBuf::from);
        env_config.config = string_var(&lookup, "TS_CONFIG").map(PathBuf::from);

        env_config
    }

    /// Apply the environment layer on top of `config`.
    pub fn apply_to(&self, mut config: ScanConfig) -> ScanConfig {
        if let Some(workers) = self.workers {
            config = config.with_workers(workers);
        }
        let min = self.min_delay.unwrap_or(config.min_delay);
        let max = self.max_delay.unwrap_or(config.max_delay);
        config = config.with_pacing(min, max);
        if let Some(timeout) = self.timeout {
            config = config.with_lookup_timeout(timeout);
        }
        if let Some(whois) = &self.whois_command {
            config = config.with_whois_command(whois.as_str());
        }
        if let Some(dig) = &self.dig_command {
            config = config.with_dig_command(dig.as_str());
        }
        config
    }
}

fn string_var<F: Fn(&str) -> Option<String>>(lookup: &F, key: &str) -> Option<String> {
    let value = lookup(key)?;
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    debug!(key, value, "using environment override");
    Some(value.to_string())
}

fn duration_var<F: Fn(&str) -> Option<String>>(lookup: &F, key: &str) -> Option<Duration> {
    let value = lookup(key)?;
    match parse_duration_string(&value) {
        Some(duration) => {
            debug!(key, ?duration, "using environment override");
            Some(duration)
        }
        None => {
            warn!(key, value = %value, "invalid duration, use a format like '500ms', '2s', '1m'");
            None
        }
    }
}

/// Parse a duration like "500ms", "2s", "1m", or bare seconds ("3").
///
/// # Returns
///
/// The duration, or `None` if the string is not understood.
pub fn parse_duration_string(value: &str) -> Option<Duration> {
    let value = value.trim().to_lowercase();

    if let Some(ms) = value.strip_suffix("ms") {
        ms.trim().parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = value.strip_suffix('s') {
        secs.trim().parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = value.strip_suffix('m') {
        mins.trim()
            .parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        value.parse::<u64>().ok().map(Duration::from_secs)
    }
}
