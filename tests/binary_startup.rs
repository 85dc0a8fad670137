use std::fs;
use std::process::Command;

use tempfile::TempDir;

fn pdfdeck(dir: &TempDir, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_pdfdeck"))
        .current_dir(dir.path())
        .args(args)
        .output()
        .unwrap()
}

#[test]
fn malformed_config_is_logged_before_falling_back() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("broken.yaml");
    fs::write(&config, "plugins: [not, a, map]\n").unwrap();

    let output = pdfdeck(
        &dir,
        &["--config", config.to_str().unwrap(), "--list-commands"],
    );
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("zoomIn"));

    let log = fs::read_to_string(dir.path().join("pdfdeck.log")).unwrap();
    assert!(log.contains("failed to parse"), "{log}");
    assert!(log.contains("broken.yaml"), "{log}");
}

#[test]
fn missing_config_is_logged() {
    let dir = TempDir::new().unwrap();
    let output = pdfdeck(&dir, &["--config", "nowhere.yaml", "--list-commands"]);
    assert!(output.status.success());

    let log = fs::read_to_string(dir.path().join("pdfdeck.log")).unwrap();
    assert!(log.contains("failed to read nowhere.yaml"), "{log}");
}

#[test]
fn debug_lines_need_the_log_flag() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("empty.yaml");
    fs::write(&config, "{}\n").unwrap();
    let config = config.to_str().unwrap();

    pdfdeck(&dir, &["--config", config, "--list-commands"]);
    let quiet = fs::read_to_string(dir.path().join("pdfdeck.log")).unwrap();
    assert!(!quiet.contains("Loaded configuration"), "{quiet}");

    pdfdeck(&dir, &["--config", config, "--log", "--list-commands"]);
    let verbose = fs::read_to_string(dir.path().join("pdfdeck.log")).unwrap();
    assert!(verbose.contains("Loaded configuration"), "{verbose}");
}
