use std::process::Command;
use tempfile::TempDir;

fn run_rally(temp_path: &std::path::Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_rally"))
        .args(args)
        .current_dir(temp_path)
        .env_remove("RALLY_TELEGRAM_BOT_TOKEN")
        .env_remove("TELEGRAM_APITOKEN")
        .output()
        .expect("execute rally")
}

#[test]
fn test_inspect_reports_exact_round_trip() {
    let temp_dir = TempDir::new().expect("temp dir");
    let record = "🎉 Сбор: Футбол\n📅 Дата: суббота\n🔢 Лимит: 2\n👤 Инициатор: @host\n\n\
                  ✍️ Записались:\n1) @a\n2)\n\n✏️ Карандашом:";
    std::fs::write(temp_dir.path().join("rally.txt"), record).expect("write record");

    let output = run_rally(temp_dir.path(), &["inspect", "rally.txt"]);

    assert!(
        output.status.success(),
        "inspect failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"name\": \"Футбол\""), "stdout: {stdout}");
    assert!(stdout.contains("round trip: exact"), "stdout: {stdout}");
}

#[test]
fn test_inspect_rejects_non_rally_text() {
    let temp_dir = TempDir::new().expect("temp dir");
    std::fs::write(temp_dir.path().join("note.txt"), "hello").expect("write note");

    let output = run_rally(temp_dir.path(), &["inspect", "note.txt"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not a rally record"), "stderr: {stderr}");
}

#[test]
fn test_run_without_token_fails_fast() {
    let temp_dir = TempDir::new().expect("temp dir");

    let output = run_rally(temp_dir.path(), &["run"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("bot token not found"), "stderr: {stderr}");
}

#[test]
fn test_invalid_config_is_reported() {
    let temp_dir = TempDir::new().expect("temp dir");
    std::fs::write(temp_dir.path().join("rally.yml"), "queue_capacity: 0\n").expect("write config");

    let output = run_rally(temp_dir.path(), &["run"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("rally.yml"), "stderr: {stderr}");
}
