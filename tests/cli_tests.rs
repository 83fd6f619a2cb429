//! Integration tests for the mosmetro binary
//!
//! These tests run the built binary and check the exit-code contract:
//! 0 when online, 1 for a failed login, 2 for an unknown network and
//! 3 for an unusable configuration.

use std::io::Write;
use std::process::{Command, Output};
use tempfile::NamedTempFile;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

const MOSMETRO_BINARY: &str = env!("CARGO_BIN_EXE_mosmetro");

fn run_mosmetro(args: &[&str]) -> Output {
    Command::new(MOSMETRO_BINARY)
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("JOURNAL_STREAM")
        .env_remove("MOSMETRO_HTTP_PROBE")
        .env_remove("MOSMETRO_HTTPS_PROBE")
        .env_remove("MOSMETRO_TIMEOUT")
        .env_remove("MOSMETRO_USER_AGENTS")
        .output()
        .expect("failed to run mosmetro binary")
}

fn probe_args(mock_server: &MockServer) -> Vec<String> {
    vec![
        "--http-probe".to_string(),
        format!("{}/generate_204", mock_server.uri()),
        "--https-probe".to_string(),
        format!("{}/secure/generate_204", mock_server.uri()),
        "--timeout".to_string(),
        "5".to_string(),
    ]
}

#[test]
fn test_help_describes_tool() {
    let output = run_mosmetro(&["--help"]);

    assert!(output.status.success(), "help should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("captive portals"));
    assert!(stdout.contains("--user-agents"));
}

#[test]
fn test_invalid_probe_endpoint_is_setup_failure() {
    let output = run_mosmetro(&["--http-probe", "ftp://example.com/generate_204"]);

    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unsupported probe endpoint scheme"));
}

#[test]
fn test_invalid_resolve_flag_is_rejected() {
    let output = run_mosmetro(&["--resolve", "portal.wi-fi.ru"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("HOST=IP"));
}

#[test]
fn test_unreachable_probe_is_wrong_network() {
    let output = run_mosmetro(&[
        "--http-probe",
        "http://127.0.0.1:59996/generate_204",
        "--timeout",
        "1",
    ]);

    assert_eq!(output.status.code(), Some(2));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Wrong network"));
}

#[tokio::test]
async fn test_already_connected_exits_zero() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/generate_204"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/secure/generate_204"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let mut agents = NamedTempFile::new().unwrap();
    agents.write_all(br#"["MosMetroCli/1.0"]"#).unwrap();

    let mut args = probe_args(&mock_server);
    args.push("--user-agents".to_string());
    args.push(agents.path().display().to_string());
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let output = run_mosmetro(&args);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Already connected"));
}

#[tokio::test]
async fn test_unknown_portal_exits_with_wrong_network() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/generate_204"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", "https://hotspot.example.com/"),
        )
        .mount(&mock_server)
        .await;

    let args = probe_args(&mock_server);
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let output = run_mosmetro(&args);

    assert_eq!(output.status.code(), Some(2));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Wrong network"));
}
