use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

static INIT: OnceCell<()> = OnceCell::new();

/// Where log records go.
#[derive(Debug, PartialEq, Eq)]
enum LogSink {
    Stderr,
    JsonFile { dir: PathBuf, file_name: String },
}

#[derive(Debug, PartialEq, Eq)]
struct LogSettings {
    enabled: bool,
    level: Option<String>,
    sink: LogSink,
}

impl LogSettings {
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let enabled = lookup("CHAT_STREAM_OBSERVABILITY_ENABLED")
            .map(|value| {
                !matches!(
                    value.trim().to_ascii_lowercase().as_str(),
                    "0" | "false" | "no" | "off"
                )
            })
            .unwrap_or(true);
        let level = lookup("CHAT_STREAM_LOG_LEVEL").filter(|l| !l.trim().is_empty());
        let sink = lookup("CHAT_STREAM_JSON_LOG_PATH")
            .and_then(|raw| json_file_sink(Path::new(&raw)))
            .unwrap_or(LogSink::Stderr);
        Self {
            enabled,
            level,
            sink,
        }
    }

    fn filter(&self) -> EnvFilter {
        self.level
            .as_deref()
            .and_then(|level| EnvFilter::try_new(level).ok())
            .or_else(|| EnvFilter::try_from_default_env().ok())
            .unwrap_or_else(|| EnvFilter::new("warn"))
    }
}

// A path with no file name (`/`, `..`) falls back to stderr.
fn json_file_sink(path: &Path) -> Option<LogSink> {
    let file_name = path.file_name()?.to_str()?.to_owned();
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    Some(LogSink::JsonFile { dir, file_name })
}

/// Initializes logging once per process.
///
/// - `CHAT_STREAM_OBSERVABILITY_ENABLED`: `0`/`false`/`no`/`off` disables it.
/// - `CHAT_STREAM_LOG_LEVEL`: filter override, then `RUST_LOG`, then `warn`.
/// - `CHAT_STREAM_JSON_LOG_PATH`: JSON lines to this file instead of stderr.
///
/// Stdout is left to the reply.
pub fn init_observability() {
    INIT.get_or_init(|| {
        let settings = LogSettings::from_lookup(|key| std::env::var(key).ok());
        if !settings.enabled {
            return;
        }
        let registry = tracing_subscriber::registry().with(settings.filter());
        match settings.sink {
            LogSink::Stderr => {
                let layer = tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr);
                let _ = registry.with(layer).try_init();
            }
            LogSink::JsonFile { dir, file_name } => {
                let _ = std::fs::create_dir_all(&dir);
                let layer = tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(tracing_appender::rolling::never(dir, file_name));
                let _ = registry.with(layer).try_init();
            }
        }
    });
}
