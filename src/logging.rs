use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_DIR: &str = "logs";
const LOG_FILE: &str = "basket.log";

/// Env var overriding the default filter, e.g. `BASKET_LOG=basket_tui=debug`.
pub const LOG_ENV: &str = "BASKET_LOG";

fn filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Routes tracing output to `logs/basket.log`, rolled daily.
///
/// The terminal belongs to the TUI, so nothing is written to stdout. Keep the
/// returned guard alive for the life of the process or buffered lines are lost.
pub fn initialize_logging() -> WorkerGuard {
    if let Err(e) = std::fs::create_dir_all(LOG_DIR) {
        eprintln!("Could not create {LOG_DIR}/: {e}");
    }

    let file_appender = tracing_appender::rolling::daily(LOG_DIR, LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter())
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(false),
        )
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "basket-tui starting");
    guard
}
