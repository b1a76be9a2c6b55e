//! Console display logic for the tld-scan CLI.
//!
//! Result lines, banners, prompts and the end-of-run summary. Prompts and
//! diagnostics go to stderr so `--json` output on stdout stays parseable.

use console::{pad_str, style, Alignment, Term};
use std::io::{self, BufRead};
use std::path::Path;
use tld_scan_lib::{LookupStage, ScanEvent, ScanReport, Verdict};
use tokio::sync::mpsc::UnboundedReceiver;

// ── Events ───────────────────────────────────────────────────────────────────

/// Echo scan events until the scanner drops its sender.
pub async fn echo_events(mut events: UnboundedReceiver<ScanEvent>, verbose: bool) {
    while let Some(event) = events.recv().await {
        match event {
            ScanEvent::Started { tlds_file, .. } => print_session_start(&tlds_file),
            ScanEvent::Checked { domain, outcome } => {
                if let Some(line) = format_outcome(domain.as_str(), &outcome, verbose) {
                    println!("{}", line);
                }
            }
        }
    }
}

/// One console line per outcome. Undetermined results are only shown when
/// `verbose` is set.
pub fn format_outcome(domain: &str, outcome: &Verdict, verbose: bool) -> Option<String> {
    let line = match outcome {
        Verdict::Available => format!(
            "{} {} -> {}",
            style("🔗").blue(),
            domain,
            style("✅ Available").green()
        ),
        Verdict::ActiveWithAddress { address } => format!(
            "{} {} -> {}{} IP: {}",
            style("🔗").red(),
            domain,
            style("⛔ ").red(),
            style("✨").yellow(),
            style(address.replace('\n', ", ")).red()
        ),
        Verdict::ActiveWithoutAddress => format!(
            "{} {} -> {} {}",
            style("🔗").red(),
            domain,
            style("⛔").red(),
            style("⚠️ No associated IP").yellow()
        ),
        Verdict::Indeterminate if verbose => format!(
            "{} {} -> {}",
            style("🔗").blue(),
            domain,
            style("❔ No conclusive markers").dim()
        ),
        Verdict::Indeterminate => return None,
        Verdict::LookupError { stage, .. } => {
            let label = match stage {
                LookupStage::Registry => "⚠️ WHOIS Error",
                LookupStage::Resolution => "⚠️ DIG error",
            };
            format!("{} {} -> {}", style("🔗").blue(), domain, style(label).yellow())
        }
    };
    Some(line)
}

// ── Banners ──────────────────────────────────────────────────────────────────

pub fn print_session_start(tlds_file: &Path) {
    println!(
        "{}",
        style(format!(
            "\n🔎 Starting TLD verification from {}...\n",
            tlds_file.display()
        ))
        .blue()
    );
}

pub fn print_session_complete(log_path: &Path) {
    println!(
        "{}",
        style(format!(
            "\n✅ Verification complete. Results saved in: {}\n",
            log_path.display()
        ))
        .green()
    );
}

pub fn print_script_completed(log_path: &Path) {
    println!(
        "{}",
        style(format!("✅ Script completed. Results saved in: {}", log_path.display())).green()
    );
}

pub fn print_interrupted() {
    eprintln!("{}", style("\n⏹️ User interruption. Clean exit.").red());
}

pub fn print_error(message: &str) {
    eprintln!("{}", style(format!("⛔ {}", message)).red());
}

pub fn print_warning(message: &str) {
    eprintln!("{}", style(format!("⚠️ {}", message)).yellow());
}

// ── Prompts ──────────────────────────────────────────────────────────────────

/// Show `question` on stderr and read one line from stdin.
///
/// Returns `None` at end of input.
pub fn ask(question: &str) -> io::Result<Option<String>> {
    let term = Term::stderr();
    term.write_str(question)?;
    term.flush()?;

    let mut input = String::new();
    let read = io::stdin().lock().read_line(&mut input)?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim().to_string()))
}

/// `Some(true)` for y/yes, `Some(false)` for n/no, `None` otherwise.
pub fn parse_yes_no(answer: &str) -> Option<bool> {
    match answer.trim().to_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

// ── Summary ──────────────────────────────────────────────────────────────────

/// Print a short per-session tally.
pub fn print_summary(reports: &[ScanReport]) {
    if reports.is_empty() {
        return;
    }

    println!("{}", style("Summary").bold());
    for report in reports {
        println!("{}", format_summary_line(report));
    }
    println!();
}

pub fn format_summary_line(report: &ScanReport) -> String {
    let list = report.tlds_file.display().to_string();
    let mut parts = vec![
        format!("{} checked", report.processed),
        format!("{} available", report.available),
        format!(
            "{} active ({} with IP)",
            report.recorded(),
            report.active_with_address
        ),
    ];
    if report.indeterminate > 0 {
        parts.push(format!("{} inconclusive", report.indeterminate));
    }
    if report.lookup_errors > 0 {
        parts.push(format!("{} errors", report.lookup_errors));
    }
    if report.abandoned > 0 {
        parts.push(format!("{} skipped", report.abandoned));
    }

    format!(
        "  {}  {}  {}",
        pad_str(&list, 26, Alignment::Left, Some("..")),
        parts.join(", "),
        style(format!("in {:.1}s", report.elapsed_secs)).dim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tld_scan_lib::SessionState;

    fn plain(s: &str) -> String {
        console::strip_ansi_codes(s).into_owned()
    }

    #[test]
    fn test_format_outcome_lines() {
        let available = format_outcome("example.zz", &Verdict::Available, false).unwrap();
        assert_eq!(plain(&available), "🔗 example.zz -> ✅ Available");

        let active = Verdict::ActiveWithAddress {
            address: "93.184.216.34".to_string(),
        };
        let line = plain(&format_outcome("example.com", &active, false).unwrap());
        assert!(line.ends_with("IP: 93.184.216.34"), "{}", line);

        let line = plain(&format_outcome("example.net", &Verdict::ActiveWithoutAddress, false).unwrap());
        assert!(line.contains("No associated IP"));

        let whois = Verdict::LookupError {
            stage: LookupStage::Registry,
            message: "boom".to_string(),
        };
        assert!(plain(&format_outcome("example.io", &whois, false).unwrap()).contains("WHOIS Error"));

        let dig = Verdict::LookupError {
            stage: LookupStage::Resolution,
            message: "boom".to_string(),
        };
        assert!(plain(&format_outcome("example.io", &dig, false).unwrap()).contains("DIG error"));
    }

    #[test]
    fn test_indeterminate_only_when_verbose() {
        assert!(format_outcome("example.org", &Verdict::Indeterminate, false).is_none());
        assert!(format_outcome("example.org", &Verdict::Indeterminate, true).is_some());
    }

    #[test]
    fn test_multiline_address_is_joined() {
        let active = Verdict::ActiveWithAddress {
            address: "alias.example.net.\n192.0.2.7".to_string(),
        };
        let line = plain(&format_outcome("example.com", &active, false).unwrap());
        assert!(line.ends_with("IP: alias.example.net., 192.0.2.7"), "{}", line);
    }

    #[test]
    fn test_parse_yes_no() {
        assert_eq!(parse_yes_no("Y"), Some(true));
        assert_eq!(parse_yes_no(" yes "), Some(true));
        assert_eq!(parse_yes_no("n"), Some(false));
        assert_eq!(parse_yes_no("No"), Some(false));
        assert_eq!(parse_yes_no("maybe"), None);
        assert_eq!(parse_yes_no(""), None);
    }

    #[test]
    fn test_summary_line() {
        let report = ScanReport {
            base_domain: "example".to_string(),
            tlds_file: PathBuf::from("tlds_single_dot.txt"),
            log_path: PathBuf::from("example_tlds_results.log"),
            state: SessionState::Completed,
            candidates: 10,
            processed: 10,
            abandoned: 0,
            available: 6,
            active_with_address: 2,
            active_without_address: 1,
            indeterminate: 0,
            lookup_errors: 1,
            elapsed_secs: 12.34,
        };
        let line = plain(&format_summary_line(&report));
        assert!(line.contains("10 checked, 6 available, 3 active (2 with IP), 1 errors"));
        assert!(!line.contains("skipped"));
        assert!(line.ends_with("in 12.3s"));
    }
}
