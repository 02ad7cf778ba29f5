use anyhow::Result;
use std::fs::OpenOptions;
use std::path::Path;
use tracing::Level;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use wallpaper_core::tracing::{InstrumentationConfig, init_tracing};

const LOG_FILE_NAME: &str = "wallpaper-admin.log";

/// Initialize logging for the CLI
pub fn init_logging(log_level: Level, data_dir: &Path, no_file_log: bool) -> Result<()> {
    if no_file_log {
        init_tracing(&InstrumentationConfig {
            log_level: filter_directives(log_level),
            ..InstrumentationConfig::from_env()
        })
    } else {
        init_file_logging(log_level, data_dir)
    }
}

fn filter_directives(level: Level) -> String {
    let level = level.as_str().to_lowercase();
    format!("wallpaper_admin={level},wallpaper_http={level},wallpaper_core={level},wallpaper={level}")
}

fn init_file_logging(level: Level, data_dir: &Path) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| filter_directives(level).into());

    std::fs::create_dir_all(data_dir)?;
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(data_dir.join(LOG_FILE_NAME))?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::sync::Mutex::new(log_file))
                .with_ansi(false),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()?;

    Ok(())
}
