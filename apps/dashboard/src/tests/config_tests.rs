use super::*;

use std::{
    env,
    time::{SystemTime, UNIX_EPOCH},
};

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let pairs: HashMap<String, String> = pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    move |key| pairs.get(key).cloned()
}

#[test]
fn defaults_match_reference_deployment() {
    let settings = Settings::default();
    assert_eq!(settings.server_url, "http://localhost:8080");
    assert_eq!((settings.grid_width, settings.grid_height), (20, 20));
    assert_eq!(settings.poll_interval_ms, 500);
    assert_eq!(settings.default_heuristic, "MANHATTAN");
    assert_eq!(settings.default_strategy, "IN_ORDER");
    assert_eq!(settings.snapshot_dir, None);
    assert!(settings.validate().is_ok());
}

#[test]
fn file_values_accept_strings_and_integers() {
    let mut settings = Settings::default();
    apply_file(
        &mut settings,
        r#"
server_url = "http://dispatch.local:9000"
grid_width = 30
grid_height = "25"
poll_interval_ms = "fast"
snapshot_dir = "./frames"
unknown_key = "ignored"
"#,
    );

    assert_eq!(settings.server_url, "http://dispatch.local:9000");
    assert_eq!(settings.grid_width, 30);
    assert_eq!(settings.grid_height, 25);
    assert_eq!(settings.poll_interval_ms, 500);
    assert_eq!(settings.snapshot_dir, Some(PathBuf::from("./frames")));
}

#[test]
fn malformed_file_is_ignored() {
    let mut settings = Settings::default();
    apply_file(&mut settings, "server_url = [");
    assert_eq!(settings, Settings::default());
}

#[test]
fn environment_overrides_file() {
    let mut settings = Settings::default();
    apply_file(
        &mut settings,
        "server_url = \"http://from-file:1\"\ngrid_width = 12\ndefault_strategy = \"NEAREST\"",
    );
    apply_env(
        &mut settings,
        env_from(&[
            ("DASHBOARD_SERVER_URL", "http://legacy:2"),
            ("APP__SERVER_URL", "http://from-env:3"),
            ("APP__GRID_WIDTH", "40"),
            ("APP__POLL_INTERVAL_MS", "not-a-number"),
            ("RUST_LOG", "dashboard_core=debug"),
        ]),
    );

    assert_eq!(settings.server_url, "http://from-env:3");
    assert_eq!(settings.grid_width, 40);
    assert_eq!(settings.poll_interval_ms, 500);
    assert_eq!(settings.default_strategy, "NEAREST");
    assert_eq!(settings.log_filter, "dashboard_core=debug");
}

#[test]
fn zero_grid_is_rejected() {
    let settings = Settings {
        grid_height: 0,
        ..Settings::default()
    };
    let err = settings.validate().expect_err("must fail");
    assert!(err.to_string().contains("20x0"));
}

#[test]
fn load_settings_reads_file_from_disk() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = env::temp_dir().join(format!("dispatch_dashboard_config_{suffix}"));
    fs::create_dir_all(&temp_root).expect("temp root");
    let path = temp_root.join("dashboard.toml");
    fs::write(&path, "default_heuristic = \"EUCLIDEAN\"\n").expect("write config");

    let settings = load_settings(&path);
    assert_eq!(settings.default_heuristic, "EUCLIDEAN");

    let missing = load_settings(&temp_root.join("absent.toml"));
    assert_eq!(missing.default_heuristic, Settings::default().default_heuristic);

    fs::remove_dir_all(temp_root).expect("cleanup");
}
