use std::fs;
use std::path::PathBuf;

use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{RelayError, RelayResult};
use crate::modules::config::get_data_dir;

pub fn get_log_dir() -> RelayResult<PathBuf> {
    let data_dir = get_data_dir()?;
    let log_dir = data_dir.join("logs");

    if !log_dir.exists() {
        fs::create_dir_all(&log_dir)
            .map_err(|e| RelayError::Config(format!("failed to create log directory: {}", e)))?;
    }

    Ok(log_dir)
}

/// Initialize logger system
///
/// Console output goes to stderr: stdout is the protocol channel and must
/// carry nothing but response lines.
pub fn init_logger() {
    // Capture log macro logs
    let _ = tracing_log::LogTracer::init();

    let log_dir = match get_log_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("failed to initialize log directory: {}", e);
            return;
        }
    };

    // 1. File appender (daily rolling logs)
    let file_appender = tracing_appender::rolling::daily(log_dir, "relay.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // 2. Console output layer (stderr)
    let console_layer = fmt::Layer::new()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true);

    // 3. File output layer (disable ANSI formatting)
    let file_layer = fmt::Layer::new()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_level(true);

    // 4. Filter layer (default to INFO and above)
    let filter_layer = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // 5. Initialize global subscriber (use try_init to avoid crash on re-initialization)
    let _ = tracing_subscriber::registry()
        .with(filter_layer)
        .with(console_layer)
        .with(file_layer)
        .try_init();

    // Leak _guard to ensure its lifetime lasts until program exit
    std::mem::forget(_guard);

    info!("logger initialized (stderr + file persistence)");
}
