use std::io;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;
use tracing_appender::rolling;

pub fn configure_logging(quiet: bool) {
    // Quiet mode only silences progress on stdout; the file log keeps
    // everything so a failed run can still be diagnosed.
    let stdout_filter = if quiet {
        "warn,sqlx=off"
    } else {
        "info,web_request=info,db_query=warn,sqlx=off"
    };

    let stdout_log = fmt::layer()
        .with_writer(io::stdout)
        .with_filter(EnvFilter::new(stdout_filter));

    let file_appender = rolling::daily("logs", "import.log");
    let file_log = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_filter(EnvFilter::new("info,web_request=debug,db_query=debug,sqlx=warn"));

    tracing_subscriber::Registry::default()
        .with(stdout_log)
        .with(file_log)
        .init();
}
