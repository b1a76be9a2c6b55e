// tld-scan/tests/cli_integration.rs

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::{Output, Stdio};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

const FAKE_WHOIS: &str = r#"#!/bin/sh
case "$1" in
  *.com) printf 'Domain: %s\nStatus: active\n' "$1" ;;
  *.net|*.co.uk) printf 'Domain: %s\n' "$1" ;;
  *) printf 'No match for "%s".\n' "$1" ;;
esac
"#;

const SLOW_WHOIS: &str = r#"#!/bin/sh
/bin/sleep 0.3
printf 'Domain: %s\nStatus: active\n' "$1"
"#;

const FAKE_DIG: &str = r#"#!/bin/sh
case "$2" in
  *.com) echo 93.184.216.34 ;;
esac
"#;

/// Working directory with TLD lists and a private `bin/` holding stand-in
/// `whois` and `dig` scripts.
struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        fs::create_dir(dir.path().join("bin")).unwrap();
        Self { dir }
    }

    fn with_tools(self) -> Self {
        self.install("whois", FAKE_WHOIS);
        self.install("dig", FAKE_DIG);
        self
    }

    fn with_file(self, name: &str, content: &str) -> Self {
        fs::write(self.path().join(name), content).unwrap();
        self
    }

    #[cfg(unix)]
    fn install(&self, name: &str, script: &str) {
        use std::os::unix::fs::PermissionsExt;
        let path = self.path().join("bin").join(name);
        fs::write(&path, script).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[cfg(not(unix))]
    fn install(&self, _name: &str, _script: &str) {}

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn read(&self, name: &str) -> String {
        fs::read_to_string(self.path().join(name)).unwrap()
    }

    /// `tld-scan` confined to the sandbox: cwd, PATH, HOME and XDG dirs.
    fn command(&self) -> Command {
        Command::from_std(self.process())
    }

    /// Same as [`Sandbox::command`], as a plain process for signal tests.
    fn process(&self) -> std::process::Command {
        let mut cmd = std::process::Command::new(assert_cmd::cargo::cargo_bin("tld-scan"));
        cmd.current_dir(self.path())
            .env("PATH", self.path().join("bin"))
            .env("HOME", self.path())
            .env("XDG_CONFIG_HOME", self.path().join("config"))
            .env_remove("RUST_LOG")
            .args(["--min-delay", "0", "--max-delay", "0"]);
        cmd
    }
}

/// Send SIGINT to `child` after `delay` and collect its output.
///
/// Stdin, when piped, stays open until the process has exited so the
/// interrupt is not mistaken for end of input.
#[cfg(unix)]
fn interrupt_after(mut child: std::process::Child, delay: Duration) -> Output {
    let stdin = child.stdin.take();
    thread::sleep(delay);

    let status = std::process::Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());

    let output = child.wait_with_output().unwrap();
    drop(stdin);
    output
}

#[test]
fn test_help_shows_flags() {
    let mut cmd = Command::cargo_bin("tld-scan").unwrap();
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--multi"))
        .stdout(predicate::str::contains("--workers"))
        .stdout(predicate::str::contains("--min-delay"))
        .stdout(predicate::str::contains("--config"));
}

#[test]
fn test_invalid_workers() {
    let mut cmd = Command::cargo_bin("tld-scan").unwrap();
    cmd.args(["example", "--workers", "0"]);

    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("between 1 and 100"));
}

#[test]
fn test_domain_with_tld_is_rejected() {
    let mut cmd = Command::cargo_bin("tld-scan").unwrap();
    cmd.arg("amazon.com");

    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("without a TLD"));
}

#[test]
fn test_multi_flags_conflict() {
    let mut cmd = Command::cargo_bin("tld-scan").unwrap();
    cmd.args(["example", "--multi", "--no-multi"]);

    cmd.assert().failure();
}

#[test]
fn test_missing_dependency_exits_3() {
    let sandbox = Sandbox::new().with_file("tlds_single_dot.txt", ".com\n");

    sandbox
        .command()
        .args(["example", "--no-multi"])
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("Command 'whois' is not installed"));

    assert!(!sandbox.path().join("example_tlds_results.log").exists());
}

#[cfg(unix)]
#[test]
fn test_full_scan_writes_active_domains() {
    let sandbox = Sandbox::new()
        .with_tools()
        .with_file("tlds_single_dot.txt", ".com\n\n.net\n.zz\n");

    sandbox
        .command()
        .args(["example", "--no-multi", "--workers", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Starting TLD verification from tlds_single_dot.txt"))
        .stdout(predicate::str::contains("example.zz -> ✅ Available"))
        .stdout(predicate::str::contains("IP: 93.184.216.34"))
        .stdout(predicate::str::contains("No associated IP"))
        .stdout(predicate::str::contains(
            "Script completed. Results saved in: example_tlds_results.log",
        ));

    let log = sandbox.read("example_tlds_results.log");
    assert!(log.contains("Starting verification for example"));
    assert!(log.contains("example.com -> IP found: 93.184.216.34\nWHOIS:\nDomain: example.com\nStatus: active\n"));
    assert!(log.contains("example.net -> Active without IP\nWHOIS:\nDomain: example.net\n"));
    assert!(!log.contains("example.zz"));
    assert!(log.trim_end().ends_with("Verification completed for example"));
}

#[cfg(unix)]
#[test]
fn test_interactive_prompts() {
    let sandbox = Sandbox::new()
        .with_tools()
        .with_file("tlds_single_dot.txt", ".zz\n")
        .with_file("tlds_multiple_dots.txt", ".co.uk\n");

    sandbox
        .command()
        .write_stdin("Example\nmaybe\ny\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("Enter the target domain name"))
        .stderr(predicate::str::contains("Invalid response. Please enter 'Y' or 'N'."))
        .stdout(predicate::str::contains("Starting TLD verification from tlds_multiple_dots.txt"))
        .stdout(predicate::str::contains("example.co.uk"));

    let log = sandbox.read("example_tlds_results.log");
    assert!(log.contains("example.co.uk -> Active without IP"));
    assert_eq!(log.matches("Starting verification for example").count(), 2);
    assert_eq!(log.matches("Verification completed for example").count(), 2);
}

#[cfg(unix)]
#[test]
fn test_empty_domain_exits_cleanly() {
    let sandbox = Sandbox::new().with_tools();

    sandbox
        .command()
        .write_stdin("\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("No domain entered"));
}

#[cfg(unix)]
#[test]
fn test_missing_tld_list_is_reported() {
    let sandbox = Sandbox::new().with_tools();

    sandbox
        .command()
        .args(["example", "--no-multi"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("File tlds_single_dot.txt does not exist."));

    assert!(!sandbox.path().join("example_tlds_results.log").exists());
}

#[cfg(unix)]
#[test]
fn test_json_output() {
    let sandbox = Sandbox::new()
        .with_tools()
        .with_file("singles.txt", ".com\n.zz\n");

    let output = sandbox
        .command()
        .args(["example", "--tlds", "singles.txt", "--no-multi", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let reports: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let report = &reports[0];
    assert_eq!(report["base_domain"], "example");
    assert_eq!(report["state"], "completed");
    assert_eq!(report["candidates"], 2);
    assert_eq!(report["available"], 1);
    assert_eq!(report["active_with_address"], 1);
}

#[cfg(unix)]
#[test]
fn test_config_file_and_env_layers() {
    let sandbox = Sandbox::new()
        .with_tools()
        .with_file("from-config.txt", ".zz\n")
        .with_file("from-env.txt", ".com\n")
        .with_file(
            "tld-scan.toml",
            "[defaults]\ntlds_file = \"from-config.txt\"\nworkers = 3\n",
        );

    // Local config file picks the list
    sandbox
        .command()
        .args(["example", "--no-multi"])
        .assert()
        .success()
        .stdout(predicate::str::contains("from-config.txt"));

    // Environment beats the config file
    sandbox
        .command()
        .env("TS_TLDS_FILE", "from-env.txt")
        .args(["example", "--no-multi"])
        .assert()
        .success()
        .stdout(predicate::str::contains("from-env.txt"))
        .stdout(predicate::str::contains("example.com"));
}

#[cfg(unix)]
#[test]
fn test_interrupt_mid_scan_exits_cleanly() {
    let sandbox = Sandbox::new()
        .with_tools()
        .with_file("tlds_single_dot.txt", &".com\n".repeat(40));
    sandbox.install("whois", SLOW_WHOIS);

    let child = sandbox
        .process()
        .args(["example", "--no-multi", "--workers", "2"])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    let output = interrupt_after(child, Duration::from_millis(1200));

    assert_eq!(output.status.code(), Some(0));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("User interruption"), "{}", stderr);

    let log = sandbox.read("example_tlds_results.log");
    let entries = log.matches(" -> ").count();
    assert!(entries > 0 && entries < 40, "{} entries", entries);
    assert_eq!(log.matches("WHOIS:\n").count(), entries);
    let first = log.lines().next().unwrap_or_default();
    assert!(first.ends_with(" - Starting verification for example"), "{}", first);
    assert!(!log.contains("Verification completed"));
}

#[cfg(unix)]
#[test]
fn test_interrupt_at_multi_prompt_exits_cleanly() {
    // First list is missing, so the run would otherwise end with status 1
    let sandbox = Sandbox::new().with_tools();

    let child = sandbox
        .process()
        .arg("example")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    let output = interrupt_after(child, Duration::from_millis(1000));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("File tlds_single_dot.txt does not exist."), "{}", stderr);
    assert!(stderr.contains("User interruption"), "{}", stderr);
    assert_eq!(output.status.code(), Some(0));
}
