use pagebeacon_core::Database;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

struct CliTestEnv {
    _temp_dir: TempDir,
    home: PathBuf,
    xdg_data: PathBuf,
    xdg_config: PathBuf,
    xdg_state: PathBuf,
    log: PathBuf,
}

impl CliTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let home = base.join("home");
        let xdg_data = base.join("xdg-data");
        let xdg_config = base.join("xdg-config");
        let xdg_state = base.join("xdg-state");

        fs::create_dir_all(&home).expect("failed to create HOME");
        fs::create_dir_all(&xdg_data).expect("failed to create XDG_DATA_HOME");
        fs::create_dir_all(&xdg_config).expect("failed to create XDG_CONFIG_HOME");
        fs::create_dir_all(&xdg_state).expect("failed to create XDG_STATE_HOME");

        let log = seed_beacon_log(&base);

        Self {
            _temp_dir: temp_dir,
            home,
            xdg_data,
            xdg_config,
            xdg_state,
            log,
        }
    }

    fn db_path(&self) -> PathBuf {
        self.xdg_data.join("pagebeacon/events.db")
    }

    fn log_arg(&self) -> String {
        self.log.to_string_lossy().into_owned()
    }
}

fn seed_beacon_log(base: &Path) -> PathBuf {
    let source = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../pagebeacon-core/tests/fixtures/analytics.log");
    let target = base.join("logs/analytics.log");

    fs::create_dir_all(target.parent().expect("missing fixture parent"))
        .expect("failed to create log directory");
    fs::copy(source, &target).expect("failed to copy beacon log fixture");
    target
}

fn run_bin(env: &CliTestEnv, args: &[&str]) -> Output {
    let bin_path = PathBuf::from(assert_cmd::cargo::cargo_bin!("pagebeacon"));

    Command::new(bin_path)
        .args(args)
        .env("HOME", &env.home)
        .env("XDG_DATA_HOME", &env.xdg_data)
        .env("XDG_CONFIG_HOME", &env.xdg_config)
        .env("XDG_STATE_HOME", &env.xdg_state)
        .output()
        .unwrap_or_else(|e| panic!("failed to execute pagebeacon: {e}"))
}

fn assert_success(args: &[&str], output: &Output) {
    if output.status.success() {
        return;
    }

    let rendered_args = args
        .iter()
        .map(|arg| OsString::from(arg).to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    panic!(
        "pagebeacon {rendered_args} failed\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
        output.status, stdout, stderr
    );
}

#[test]
fn import_stores_fixture_events_in_db() {
    let env = CliTestEnv::new();
    let log = env.log_arg();
    let args = ["import", log.as_str()];

    let output = run_bin(&env, &args);
    assert_success(&args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Import complete:"));
    assert!(
        stdout.contains("Line 6: malformed line"),
        "expected per-line errors in stdout, got:\n{stdout}"
    );
    assert!(stdout.contains("Line 9: invalid JSON"));

    let db_path = env.db_path();
    assert!(
        db_path.exists(),
        "database file should exist at {}",
        db_path.display()
    );

    let db = Database::open(&db_path).expect("failed to open db");
    db.migrate().expect("failed to migrate db");
    assert_eq!(db.count_events().expect("failed to count events"), 14);
}

#[test]
fn import_json_reports_counts() {
    let env = CliTestEnv::new();
    let log = env.log_arg();
    let args = ["--format", "json", "import", log.as_str()];

    let output = run_bin(&env, &args);
    assert_success(&args, &output);

    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("import output should be JSON");
    assert_eq!(json["report"]["successful"], 14);
    assert_eq!(json["report"]["failed"], 2);
    assert_eq!(json["report"]["errors"][0]["line_number"], 6);
}

#[test]
fn sessions_json_lists_reconstructed_sessions() {
    let env = CliTestEnv::new();
    let log = env.log_arg();
    let args = ["sessions", log.as_str(), "--format", "json"];

    let output = run_bin(&env, &args);
    assert_success(&args, &output);

    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("sessions output should be JSON");
    let sessions = json.as_array().expect("sessions should be an array");
    assert_eq!(sessions.len(), 5);
    assert_eq!(sessions[0]["session_id"], "sess_a");

    let bounces = sessions
        .iter()
        .filter(|s| s["is_bounce"] == serde_json::Value::Bool(true))
        .count();
    assert_eq!(bounces, 2);
}

#[test]
fn alerts_reports_high_error_rate() {
    let env = CliTestEnv::new();
    let log = env.log_arg();
    let args = ["alerts", log.as_str(), "--now", "2024-03-10T12:00:00Z"];

    let output = run_bin(&env, &args);
    assert_success(&args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Subject: Analytics Alerts - 12:00"));
    assert!(
        stdout.contains("[error] High error rate: 33.3% of sessions had errors"),
        "expected error-rate alert, got:\n{stdout}"
    );
    assert!(!stdout.contains("Traffic spike"));
}

#[test]
fn alerts_quiet_window_prints_nothing_triggered() {
    let env = CliTestEnv::new();
    let log = env.log_arg();
    let args = ["alerts", log.as_str(), "--now", "2024-03-11T12:00:00Z"];

    let output = run_bin(&env, &args);
    assert_success(&args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No alerts triggered"));
}

#[test]
fn report_prints_overview_and_daily_payload() {
    let env = CliTestEnv::new();
    let log = env.log_arg();
    let args = ["report", log.as_str(), "--now", "2024-03-10T23:00:00Z"];

    let output = run_bin(&env, &args);
    assert_success(&args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Overview (generated 2024-03-10 23:00:00 UTC)"));
    assert!(stdout.contains("Subject: Daily Analytics Report - 2024-03-10"));
    assert!(stdout.contains("- Total Sessions: 5"));
    assert!(stdout.contains("- Most Used Browser: Chrome"));
}

#[test]
fn performance_prints_per_page_table() {
    let env = CliTestEnv::new();
    let log = env.log_arg();
    let args = ["performance", log.as_str()];

    let output = run_bin(&env, &args);
    assert_success(&args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Load time (all pages)"));
    assert!(stdout.contains("mean 1450ms"));
    assert!(stdout.contains("Page loads"));
}

#[test]
fn import_tolerates_invalid_utf8_lines() {
    let env = CliTestEnv::new();
    let mut bytes = fs::read(&env.log).expect("failed to read seeded log");
    bytes.extend_from_slice(
        b"[2024-03-10 11:55:00] {\"action\":\"PAGE_LOAD\",\"location\":\"/caf\xe9\"}\n",
    );
    bytes.extend_from_slice(b"\xff\xfe not a beacon\n");
    fs::write(&env.log, bytes).expect("failed to write mixed-encoding log");

    let log = env.log_arg();
    let args = ["--format", "json", "import", log.as_str()];

    let output = run_bin(&env, &args);
    assert_success(&args, &output);

    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("import output should be JSON");
    assert_eq!(json["report"]["successful"], 15);
    assert_eq!(json["report"]["failed"], 3);
    assert_eq!(json["report"]["errors"][2]["line_number"], 19);

    let db = Database::open(&env.db_path()).expect("failed to open db");
    assert_eq!(db.count_events().expect("failed to count events"), 15);
}

#[test]
fn missing_log_file_fails() {
    let env = CliTestEnv::new();
    let args = ["sessions", "/definitely/not/here.log"];

    let output = run_bin(&env, &args);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("failed to read"),
        "expected read error in stderr, got:\n{stderr}"
    );
}
