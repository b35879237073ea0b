use std::fs;
use std::path::Path;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes the logging system with both console and file output.
pub fn init_logging(log_dir: &Path) {
    let _ = fs::create_dir_all(log_dir);

    // Daily rotated JSON log file
    let file_appender = tracing_appender::rolling::daily(log_dir, "roster.log");
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer().json().with_writer(non_blocking_writer);

    // Console logs go to stderr so exported documents on stdout stay clean
    let console_layer = fmt::layer().with_writer(std::io::stderr);

    let filter = EnvFilter::from_default_env().add_directive(
        "preschool_roster=info"
            .parse()
            .expect("static directive is valid"),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    // Keep the writer alive for the life of the process so logs are flushed
    std::mem::forget(guard);
}
