use std::env;
use std::io::{self, IsTerminal};
use tracing::debug;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Stdout logging always; file logging only when `LOG_FILE_PATH` is set,
/// since the log names every destroyed path.
pub fn init_logger(verbose: bool) -> Option<WorkerGuard> {
    let filter = if verbose {
        "debug".to_string()
    } else {
        env::var("TRACING_LEVEL").unwrap_or_else(|_| "info".to_string())
    };
    let filter_layer = EnvFilter::new(filter);

    let (file_layer, guard) = match env::var("LOG_FILE_PATH") {
        Ok(log_file_path) => {
            let file_appender = tracing_appender::rolling::never("./", log_file_path);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer().with_writer(non_blocking).with_ansi(false);
            (Some(layer), Some(guard))
        }
        Err(_) => (None, None),
    };
    let file_logging = file_layer.is_some();

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(io::stdout)
                .pretty()
                .with_file(false)
                .without_time()
                .with_ansi(io::stdout().is_terminal()),
        )
        .with(file_layer)
        .with(filter_layer)
        .init();

    debug!("Tracing configured (file logging: {})", file_logging);

    guard
}
