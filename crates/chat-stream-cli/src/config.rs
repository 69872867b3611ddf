use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;
use chat_stream::{ClientConfig, HistoryEntry};

use crate::cli::Cli;

/// Loads `.env` from the crate directory, then from the working directory.
pub fn init() {
    let _ = dotenvy::from_path(Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/.env")));
    dotenvy::dotenv().ok();
}

pub fn client_config(cli: &Cli) -> ClientConfig {
    let mut config = ClientConfig::new(cli.base_url.clone());
    if let Some(model) = cli.model.as_deref().filter(|m| !m.trim().is_empty()) {
        config = config.model(model);
    }
    if let Some(api_key) = cli.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
        config = config.api_key(api_key);
    }
    if let Some(secs) = cli.timeout_secs {
        config = config.timeout(Duration::from_secs(secs));
    }
    config
}

/// Reads a stored conversation. A missing flag means an empty history.
pub fn load_history(path: Option<&Path>) -> anyhow::Result<Vec<HistoryEntry>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read history file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse history file {}", path.display()))
}
