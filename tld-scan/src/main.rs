//! TLD Scan CLI Application
//!
//! Interactive front end to tld-scan-lib: asks for a base name, checks it
//! against the single-level TLD list, then optionally against the
//! multi-level list, echoing every outcome as it arrives.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tld_scan_lib::{
    load_env_config, parse_duration_string, results_log_name, validate_base_domain,
    validate_pacing, validate_workers, CancellationToken, ConfigManager, FileConfig,
    MarkerClassifier, ScanConfig, ScanError, ScanReport, Scanner, SystemGateway,
    DEFAULT_MULTI_TLDS_FILE, DEFAULT_TLDS_FILE,
};
use tracing::{debug, warn};

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

const DOMAIN_PROMPT: &str = "👉 Enter the target domain name (e.g., amazon): ";
const MULTI_PROMPT: &str = "\nWould you also like to check multiple TLDs? (Y/N) ";

/// CLI arguments for tld-scan
#[derive(Parser, Debug)]
#[command(name = "tld-scan")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Check which TLDs of a domain name are registered, using whois and dig")]
#[command(
    long_about = "Check which TLDs of a domain name are registered, using whois and dig.\n\nEvery active domain is appended to <name>_tlds_results.log together with its raw WHOIS record."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Base domain name without TLD (prompted for when omitted)
    #[arg(value_name = "DOMAIN", help_heading = "Domain Selection")]
    pub domain: Option<String>,

    /// Single-level TLD list (default: tlds_single_dot.txt)
    #[arg(long = "tlds", value_name = "FILE", help_heading = "Domain Selection")]
    pub tlds: Option<PathBuf>,

    /// Multi-level TLD list (default: tlds_multiple_dots.txt)
    #[arg(long = "multi-tlds", value_name = "FILE", help_heading = "Domain Selection")]
    pub multi_tlds: Option<PathBuf>,

    /// Also check the multi-level list without asking
    #[arg(long = "multi", conflicts_with = "no_multi", help_heading = "Domain Selection")]
    pub multi: bool,

    /// Skip the multi-level list without asking
    #[arg(long = "no-multi", help_heading = "Domain Selection")]
    pub no_multi: bool,

    /// Print session reports as JSON instead of styled output
    #[arg(short = 'j', long = "json", help_heading = "Output Format")]
    pub json: bool,

    /// Concurrent workers (default: 5, max: 100)
    #[arg(short = 'c', long = "workers", value_name = "N", help_heading = "Performance")]
    pub workers: Option<usize>,

    /// Minimum pause between a worker's lookups (e.g. "1s", "500ms")
    #[arg(long = "min-delay", value_name = "DURATION", help_heading = "Performance")]
    pub min_delay: Option<String>,

    /// Maximum pause between a worker's lookups
    #[arg(long = "max-delay", value_name = "DURATION", help_heading = "Performance")]
    pub max_delay: Option<String>,

    /// Timeout for each whois or dig call (default: 30s)
    #[arg(long = "timeout", value_name = "DURATION", help_heading = "Performance")]
    pub timeout: Option<String>,

    /// whois binary to run
    #[arg(long = "whois", value_name = "COMMAND", help_heading = "Tools")]
    pub whois: Option<String>,

    /// dig binary to run
    #[arg(long = "dig", value_name = "COMMAND", help_heading = "Tools")]
    pub dig: Option<String>,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,
}

/// Everything a run needs once all configuration layers are merged.
#[derive(Debug, Clone)]
struct Settings {
    scan: ScanConfig,
    classifier: MarkerClassifier,
    tlds_file: PathBuf,
    multi_tlds_file: PathBuf,
}

/// How a prompt ended.
enum Answer {
    Line(String),
    EndOfInput,
    Interrupted,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    let code = match run_scan(args).await {
        Ok(code) => code,
        Err(e) => {
            ui::print_error(&e.to_string());
            e.downcast_ref::<ScanError>()
                .map(ScanError::exit_code)
                .unwrap_or(1)
        }
    };

    // Exit here rather than returning: a prompt blocked on stdin would
    // otherwise keep the runtime from shutting down after Ctrl-C.
    process::exit(code);
}

/// Install the stderr tracing subscriber. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "error" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Validate command line arguments
fn validate_args(args: &Args) -> Result<(), String> {
    if let Some(workers) = args.workers {
        validate_workers(workers).map_err(|e| e.to_string())?;
    }

    let min = parse_duration_arg("--min-delay", args.min_delay.as_deref())?;
    let max = parse_duration_arg("--max-delay", args.max_delay.as_deref())?;
    if let (Some(min), Some(max)) = (min, max) {
        validate_pacing(min, max).map_err(|e| e.to_string())?;
    }

    if let Some(timeout) = parse_duration_arg("--timeout", args.timeout.as_deref())? {
        if timeout.is_zero() {
            return Err("--timeout must be greater than zero".to_string());
        }
    }

    if let Some(domain) = &args.domain {
        validate_base_domain(domain).map_err(|e| e.to_string())?;
    }

    Ok(())
}

fn parse_duration_arg(flag: &str, value: Option<&str>) -> Result<Option<Duration>, String> {
    match value {
        None => Ok(None),
        Some(value) => parse_duration_string(value).map(Some).ok_or_else(|| {
            format!(
                "Invalid {} '{}'. Use a format like '500ms', '2s', '1m'",
                flag, value
            )
        }),
    }
}

/// Drive one interactive run. Returns the process exit code.
async fn run_scan(args: Args) -> Result<i32, Box<dyn std::error::Error>> {
    let settings = build_settings(&args)?;
    debug!(config = ?settings.scan, "resolved configuration");

    let gateway = SystemGateway::from_config(&settings.scan);
    gateway.preflight()?;

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    let input = match &args.domain {
        Some(domain) => domain.clone(),
        None => match prompt(DOMAIN_PROMPT, &cancel).await? {
            Answer::Line(line) => line,
            Answer::EndOfInput => String::new(),
            Answer::Interrupted => {
                ui::print_interrupted();
                return Ok(0);
            }
        },
    };
    if input.trim().is_empty() {
        ui::print_error("No domain entered. Exiting program.");
        return Ok(0);
    }
    let base_domain = validate_base_domain(&input)?;
    let log_path = results_log_name(&base_domain);

    let mut reports = Vec::new();
    let mut failed = false;

    let session = run_session(
        &args,
        &settings,
        &gateway,
        &base_domain,
        &settings.tlds_file,
        &log_path,
        &cancel,
    );
    match session.await {
        Ok(report) if report.was_cancelled() => {
            return finish_interrupted(&args, &reports, report)
        }
        Ok(report) => reports.push(report),
        Err(e) => {
            ui::print_error(&e.to_string());
            failed = true;
        }
    }

    let check_multi = if args.multi {
        true
    } else if args.no_multi {
        false
    } else {
        loop {
            match prompt(MULTI_PROMPT, &cancel).await? {
                Answer::Line(answer) => match ui::parse_yes_no(&answer) {
                    Some(choice) => break choice,
                    None => ui::print_warning("Invalid response. Please enter 'Y' or 'N'."),
                },
                Answer::EndOfInput => break false,
                Answer::Interrupted => {
                    ui::print_interrupted();
                    return Ok(0);
                }
            }
        }
    };

    if check_multi {
        let session = run_session(
            &args,
            &settings,
            &gateway,
            &base_domain,
            &settings.multi_tlds_file,
            &log_path,
            &cancel,
        );
        match session.await {
            Ok(report) if report.was_cancelled() => {
                return finish_interrupted(&args, &reports, report)
            }
            Ok(report) => reports.push(report),
            Err(e) => {
                ui::print_error(&e.to_string());
                failed = true;
            }
        }
    } else if !args.json {
        ui::print_script_completed(&log_path);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        ui::print_summary(&reports);
    }

    Ok(exit_code(failed))
}

fn exit_code(failed: bool) -> i32 {
    if failed {
        1
    } else {
        0
    }
}

/// A cancelled session ends the run with status 0.
fn finish_interrupted(
    args: &Args,
    reports: &[ScanReport],
    cancelled: ScanReport,
) -> Result<i32, Box<dyn std::error::Error>> {
    ui::print_interrupted();
    if args.json {
        let mut all = reports.to_vec();
        all.push(cancelled);
        println!("{}", serde_json::to_string_pretty(&all)?);
    }
    Ok(0)
}

/// Scan one TLD list, echoing events while it runs.
async fn run_session(
    args: &Args,
    settings: &Settings,
    gateway: &SystemGateway,
    base_domain: &str,
    tlds_file: &Path,
    log_path: &Path,
    cancel: &CancellationToken,
) -> Result<ScanReport, ScanError> {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let scanner = Scanner::with_gateway(settings.scan.clone(), gateway.clone())
        .with_classifier(settings.classifier.clone())
        .with_events(tx);

    let printer = (!args.json).then(|| tokio::spawn(ui::echo_events(rx, args.verbose)));

    let result = scanner.scan_file(base_domain, tlds_file, log_path, cancel).await;

    // Dropping the scanner closes the channel so the printer can drain and stop.
    drop(scanner);
    if let Some(printer) = printer {
        let _ = printer.await;
    }

    let report = result?;
    if !report.was_cancelled() && !args.json {
        ui::print_session_complete(log_path);
    }
    Ok(report)
}

/// Ask a question without blocking the runtime; Ctrl-C abandons the prompt.
async fn prompt(
    question: &str,
    cancel: &CancellationToken,
) -> Result<Answer, Box<dyn std::error::Error>> {
    let question = question.to_string();
    let read = tokio::task::spawn_blocking(move || ui::ask(&question));

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Ok(Answer::Interrupted),
        answer = read => Ok(match answer?? {
            Some(line) => Answer::Line(line),
            None => Answer::EndOfInput,
        }),
    }
}

/// Build the effective settings: CLI > `TS_*` environment > config file > defaults.
fn build_settings(args: &Args) -> Result<Settings, Box<dyn std::error::Error>> {
    let config_manager = ConfigManager::new(args.verbose);
    let env_config = load_env_config();

    // Step 1: config file, explicit or discovered
    let file_config = if let Some(path) = args.config.as_ref().or(env_config.config.as_ref()) {
        debug!(path = %path.display(), "using explicit config file");
        config_manager.load_file(path)?
    } else {
        config_manager.discover_and_load().unwrap_or_else(|e| {
            warn!(error = %e, "config discovery failed, using defaults");
            FileConfig::default()
        })
    };
    let mut scan = file_config.apply_to(ScanConfig::default());

    // Step 2: environment variables (TS_*)
    scan = env_config.apply_to(scan);

    // Step 3: CLI arguments (highest precedence)
    scan = apply_cli_args_to_config(scan, args);

    let tlds_file = args
        .tlds
        .clone()
        .or(env_config.tlds_file)
        .or_else(|| file_config.tlds_file().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_TLDS_FILE));
    let multi_tlds_file = args
        .multi_tlds
        .clone()
        .or(env_config.multi_tlds_file)
        .or_else(|| file_config.multi_tlds_file().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_MULTI_TLDS_FILE));

    Ok(Settings {
        scan,
        classifier: file_config.build_classifier(),
        tlds_file,
        multi_tlds_file,
    })
}

/// Apply CLI arguments to config. Only flags the user actually passed override
/// environment and file values.
fn apply_cli_args_to_config(mut config: ScanConfig, args: &Args) -> ScanConfig {
    if let Some(workers) = args.workers {
        config = config.with_workers(workers);
    }

    let min = args.min_delay.as_deref().and_then(parse_duration_string);
    let max = args.max_delay.as_deref().and_then(parse_duration_string);
    if min.is_some() || max.is_some() {
        let min = min.unwrap_or(config.min_delay);
        let max = max.unwrap_or(config.max_delay);
        config = config.with_pacing(min, max);
    }

    if let Some(timeout) = args.timeout.as_deref().and_then(parse_duration_string) {
        config = config.with_lookup_timeout(timeout);
    }
    if let Some(whois) = &args.whois {
        config = config.with_whois_command(whois.as_str());
    }
    if let Some(dig) = &args.dig {
        config = config.with_dig_command(dig.as_str());
    }
    config
}
