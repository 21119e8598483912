use healthwatch::application::run_session::{EXIT_CLEAN, EXIT_FAILED};
use tokio::process::Command;

async fn run_binary(dir: &std::path::Path, vars: &[(&str, &str)]) -> Option<i32> {
    let output = Command::new(env!("CARGO_BIN_EXE_healthwatch"))
        .env_clear()
        .env("RUST_LOG", "off")
        .envs(vars.iter().copied())
        .current_dir(dir)
        .output()
        .await
        .expect("failed to run healthwatch binary");
    output.status.code()
}

#[tokio::test]
async fn missing_configuration_exits_as_failed() {
    let dir = tempfile::tempdir().unwrap();
    let code = run_binary(dir.path(), &[]).await;
    assert_eq!(code, Some(i32::from(EXIT_FAILED)));
}

#[tokio::test]
async fn unreadable_rules_file_exits_as_failed() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing-rules.json");
    let code = run_binary(
        dir.path(),
        &[
            ("MONITOR_BASE_URL", "http://127.0.0.1:9"),
            ("MONITOR_RULES_PATH", missing.to_str().unwrap()),
        ],
    )
    .await;
    assert_eq!(code, Some(i32::from(EXIT_FAILED)));
}

#[tokio::test]
async fn invalid_session_settings_exit_as_failed() {
    let dir = tempfile::tempdir().unwrap();
    let code = run_binary(
        dir.path(),
        &[
            ("MONITOR_BASE_URL", "http://127.0.0.1:9"),
            ("MONITOR_INTERVAL_SECONDS", "0"),
        ],
    )
    .await;
    assert_eq!(code, Some(i32::from(EXIT_FAILED)));
}

#[tokio::test]
async fn zero_duration_run_exits_clean() {
    let dir = tempfile::tempdir().unwrap();
    let reports = dir.path().join("reports");
    let code = run_binary(
        dir.path(),
        &[
            ("MONITOR_BASE_URL", "http://127.0.0.1:9"),
            ("MONITOR_DURATION_SECONDS", "0"),
            ("MONITOR_REPORT_DIR", reports.to_str().unwrap()),
        ],
    )
    .await;
    assert_eq!(code, Some(i32::from(EXIT_CLEAN)));
    assert_eq!(std::fs::read_dir(&reports).unwrap().count(), 1);
}
