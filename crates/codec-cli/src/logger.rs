use log::{Level, LevelFilter, Log, Metadata, Record};

/// Writes `level: message` lines to stderr.
#[derive(Debug)]
pub struct StderrLogger {
    level: LevelFilter,
}

impl StderrLogger {
    /// Creates a logger that passes records at or above `level`.
    #[must_use]
    pub const fn new(level: LevelFilter) -> Self {
        Self { level }
    }
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let label = match record.level() {
            Level::Error => "error",
            Level::Warn => "warning",
            Level::Info => "info",
            Level::Debug => "debug",
            Level::Trace => "trace",
        };
        eprintln!("{label}: {}", record.args());
    }

    fn flush(&self) {}
}

static QUIET: StderrLogger = StderrLogger::new(LevelFilter::Warn);
static VERBOSE: StderrLogger = StderrLogger::new(LevelFilter::Debug);

/// Installs the stderr logger: `warn` by default, `debug` when `verbose`.
///
/// Calling it again has no effect.
pub fn init(verbose: bool) {
    let (logger, level) = if verbose {
        (&VERBOSE, LevelFilter::Debug)
    } else {
        (&QUIET, LevelFilter::Warn)
    };
    if log::set_logger(logger).is_ok() {
        log::set_max_level(level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_below_level() {
        let logger = StderrLogger::new(LevelFilter::Warn);
        let warn = Metadata::builder().level(Level::Warn).build();
        let debug = Metadata::builder().level(Level::Debug).build();
        assert!(logger.enabled(&warn));
        assert!(!logger.enabled(&debug));
    }
}
