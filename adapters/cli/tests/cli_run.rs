use std::process::Command;

fn shadow_defend() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_shadow-defend"));
    let _ = command.env("RUST_LOG", "off");
    command
}

#[test]
fn bundled_scenario_prints_json_summary() {
    let output = shadow_defend()
        .args(["--auto-start", "--json", "--ticks", "20000"])
        .output()
        .expect("failed to run shadow-defend");

    assert!(output.status.success(), "shadow-defend should succeed");
    let summary: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is a JSON summary");
    assert!(summary["defenses_placed"].as_u64().unwrap_or(0) > 0);
    assert!(summary["waves_completed"].as_u64().unwrap_or(0) >= 3);
    assert!(summary["status"].is_string());
}

#[test]
fn missing_scenario_file_fails() {
    let output = shadow_defend()
        .arg("does/not/exist.toml")
        .output()
        .expect("failed to run shadow-defend");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to load scenario"), "{stderr}");
}
