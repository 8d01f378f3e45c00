use log::*;

pub use log::LevelFilter::*;

/// Where formatted log lines end up. The host decides (console, file, nothing).
pub type LogSink = Box<dyn Fn(&str) + Send + Sync>;

/// Installs the global logger. Calling this twice keeps the first logger and
/// reports the failure through the sink.
pub fn setup_logging(verbosity: LevelFilter, sink: LogSink) {
    let sink = std::sync::Arc::new(sink);
    let failure_sink = sink.clone();

    let result = fern::Dispatch::new()
        .level(verbosity)
        .format(|out, message, record| out.finish(format_args!("({}) {}: {}", record.level(), record.target(), message)))
        .chain(fern::Output::call(move |record| sink(&format!("{}", record.args()))))
        .apply();

    if let Err(err) = result {
        failure_sink(&format!("(WARN) logging: logger already installed: {}", err));
    }
}

/// Logs to stderr; used by hosts that provide no sink of their own.
pub fn stderr_sink() -> LogSink {
    Box::new(|line| eprintln!("{}", line))
}

pub fn log_level_from_str(value: &str) -> LevelFilter {
    value.parse().unwrap_or_else(|_| {
        warn!("Unknown log level '{}', falling back to info", value);
        Info
    })
}
