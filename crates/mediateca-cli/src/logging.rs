use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use mediateca_core::config::LoggingConfig;

const DEFAULT_FILTER: &str = "mediateca=info,mediateca_core=info";

/// Install the global subscriber: stderr always, plus a daily log file when
/// `log_dir` is configured. Keep the returned guard alive until exit.
pub fn init(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let console = fmt::layer().with_writer(std::io::stderr).with_filter(filter());

    let (file, guard) = match config.log_dir.as_deref() {
        Some(dir) => {
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, "mediateca.log"));
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(filter());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry().with(console).with(file).init();
    guard
}
