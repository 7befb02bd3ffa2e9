use std::{collections::HashMap, fs, path::Path, path::PathBuf};

use anyhow::bail;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub server_url: String,
    pub grid_width: u32,
    pub grid_height: u32,
    pub poll_interval_ms: u64,
    pub default_heuristic: String,
    pub default_strategy: String,
    pub snapshot_dir: Option<PathBuf>,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8080".into(),
            grid_width: 20,
            grid_height: 20,
            poll_interval_ms: 500,
            default_heuristic: "MANHATTAN".into(),
            default_strategy: "IN_ORDER".into(),
            snapshot_dir: None,
            log_filter: "info".into(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.grid_width == 0 || self.grid_height == 0 {
            bail!(
                "grid dimensions must be positive (got {}x{})",
                self.grid_width,
                self.grid_height
            );
        }
        if self.poll_interval_ms == 0 {
            bail!("poll_interval_ms must be positive");
        }
        Ok(())
    }
}

/// Defaults, then the toml file if it exists, then the environment.
pub fn load_settings(path: &Path) -> Settings {
    let mut settings = Settings::default();
    if let Ok(raw) = fs::read_to_string(path) {
        apply_file(&mut settings, &raw);
    }
    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings
}

/// Applies a flat `key = value` table. Unknown keys and unparseable values are ignored.
pub fn apply_file(settings: &mut Settings, raw: &str) {
    let Ok(file_cfg) = toml::from_str::<HashMap<String, toml::Value>>(raw) else {
        return;
    };
    let file_cfg: HashMap<String, String> = file_cfg
        .into_iter()
        .filter_map(|(key, value)| scalar_text(value).map(|text| (key, text)))
        .collect();

    if let Some(v) = file_cfg.get("server_url") {
        settings.server_url = v.clone();
    }
    if let Some(v) = file_cfg.get("grid_width") {
        set_parsed(&mut settings.grid_width, v);
    }
    if let Some(v) = file_cfg.get("grid_height") {
        set_parsed(&mut settings.grid_height, v);
    }
    if let Some(v) = file_cfg.get("poll_interval_ms") {
        set_parsed(&mut settings.poll_interval_ms, v);
    }
    if let Some(v) = file_cfg.get("default_heuristic") {
        settings.default_heuristic = v.clone();
    }
    if let Some(v) = file_cfg.get("default_strategy") {
        settings.default_strategy = v.clone();
    }
    if let Some(v) = file_cfg.get("snapshot_dir") {
        settings.snapshot_dir = Some(PathBuf::from(v));
    }
    if let Some(v) = file_cfg.get("log_filter") {
        settings.log_filter = v.clone();
    }
}

pub fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("DASHBOARD_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = lookup("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Some(v) = lookup("APP__GRID_WIDTH") {
        set_parsed(&mut settings.grid_width, &v);
    }
    if let Some(v) = lookup("APP__GRID_HEIGHT") {
        set_parsed(&mut settings.grid_height, &v);
    }
    if let Some(v) = lookup("APP__POLL_INTERVAL_MS") {
        set_parsed(&mut settings.poll_interval_ms, &v);
    }

    if let Some(v) = lookup("APP__DEFAULT_HEURISTIC") {
        settings.default_heuristic = v;
    }
    if let Some(v) = lookup("APP__DEFAULT_STRATEGY") {
        settings.default_strategy = v;
    }
    if let Some(v) = lookup("APP__SNAPSHOT_DIR") {
        settings.snapshot_dir = Some(PathBuf::from(v));
    }

    if let Some(v) = lookup("RUST_LOG") {
        settings.log_filter = v;
    }
}

fn scalar_text(value: toml::Value) -> Option<String> {
    match value {
        toml::Value::String(text) => Some(text),
        toml::Value::Integer(number) => Some(number.to_string()),
        _ => None,
    }
}

fn set_parsed<T: std::str::FromStr>(slot: &mut T, raw: &str) {
    if let Ok(parsed) = raw.trim().parse::<T>() {
        *slot = parsed;
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
