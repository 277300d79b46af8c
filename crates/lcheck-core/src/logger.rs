//! Stderr logger for the command-line front end.
//!
//! Records are printed as `[elapsed LEVEL target] message`. Records whose
//! target lies outside the `lcheck` crates are capped at `warn` so that
//! dependency chatter does not drown the pipeline's own stage summaries.

use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{Level, LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

const OWN_TARGET_PREFIX: &str = "lcheck";

struct StageLogger {
    level: LevelFilter,
    started: Instant,
}

impl StageLogger {
    fn limit_for(&self, target: &str) -> LevelFilter {
        if target.starts_with(OWN_TARGET_PREFIX) {
            self.level
        } else {
            self.level.min(LevelFilter::Warn)
        }
    }
}

impl Log for StageLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.limit_for(metadata.target())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let elapsed = self.started.elapsed().as_secs_f64();
        let target = record
            .target()
            .rsplit("::")
            .next()
            .unwrap_or(record.target());
        let mut stderr = std::io::stderr().lock();
        let _ = match record.level() {
            Level::Error | Level::Warn => writeln!(
                stderr,
                "[{elapsed:8.3}s {:>5} {target}] {}",
                record.level(),
                record.args()
            ),
            _ => writeln!(
                stderr,
                "[{elapsed:8.3}s {:>5}] {}",
                record.level(),
                record.args()
            ),
        };
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<StageLogger> = OnceLock::new();

/// Install the stderr logger with the given level for `lcheck` targets.
///
/// Only the first call installs the logger; later calls return `Ok(())`
/// without changing the level.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_some() {
        return Ok(());
    }
    let logger = LOGGER.get_or_init(|| StageLogger {
        level,
        started: Instant::now(),
    });
    log::set_logger(logger)?;
    log::set_max_level(level);
    Ok(())
}

/// Install a `tracing` subscriber reading its filter from `RUST_LOG`.
///
/// Without `RUST_LOG`, `lcheck` targets log at `default_level` and everything
/// else at `warn`. Span close events are emitted so each instrumented stage
/// reports its duration. With `json = true` events are flattened JSON lines.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool, default_level: LevelFilter) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{OWN_TARGET_PREFIX}={default_level},warn")));
    let builder = fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr);
    if json {
        let _ = builder.json().flatten_event(true).finish().try_init();
    } else {
        let _ = builder
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init();
    }
}
