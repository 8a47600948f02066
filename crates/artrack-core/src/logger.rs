//! Stderr logging for the recorder binaries.
//!
//! Lines look like `[  12.034s  INFO record::session] recording started ...`:
//! seconds since install, level, and the emitting module with the `artrack_`
//! crate prefix dropped. Records from other crates are only shown at
//! `warn` and above.

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

const OWN_PREFIX: &str = "artrack";

/// Level applied to targets outside this workspace.
const FOREIGN_LEVEL: Level = Level::Warn;

struct StderrLogger {
    level: LevelFilter,
    started: Instant,
}

fn is_own(target: &str) -> bool {
    target.starts_with(OWN_PREFIX)
}

fn short_target(target: &str) -> &str {
    target
        .strip_prefix("artrack_")
        .or_else(|| target.strip_prefix(OWN_PREFIX).map(|t| t.trim_start_matches("::")))
        .filter(|t| !t.is_empty())
        .unwrap_or(target)
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
            && (is_own(metadata.target()) || metadata.level() <= FOREIGN_LEVEL)
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let secs = self.started.elapsed().as_secs_f64();
        let mut err = std::io::stderr().lock();
        let _ = writeln!(
            err,
            "[{secs:8.3}s {:>5} {}] {}",
            record.level(),
            short_target(record.target()),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<StderrLogger> = OnceLock::new();

/// Install the stderr logger. Later calls keep the first level.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_some() {
        return Ok(());
    }
    let logger = LOGGER.get_or_init(|| StderrLogger {
        level,
        started: Instant::now(),
    });
    log::set_logger(logger)?;
    log::set_max_level(level);
    Ok(())
}

/// Default `EnvFilter` directives: this workspace at `info`, everything else
/// at `warn`.
#[cfg(feature = "tracing")]
fn default_directives() -> String {
    ["artrack", "artrack_core", "artrack_record", "artrack_grid"]
        .iter()
        .fold(String::from("warn"), |acc, krate| format!("{acc},{krate}=info"))
}

/// Install a `tracing-subscriber` fmt subscriber on stderr, JSON or
/// uptime-stamped text. `RUST_LOG` overrides the default filter.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives()));
    let builder = fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr);
    let _ = if json {
        builder.json().flatten_event(true).finish().try_init()
    } else {
        builder
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init()
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_lose_crate_prefix() {
        assert_eq!(short_target("artrack_record::session"), "record::session");
        assert_eq!(short_target("artrack::station"), "station");
        assert_eq!(short_target("artrack"), "artrack");
        assert_eq!(short_target("hyper::client"), "hyper::client");
    }

    #[test]
    fn foreign_targets_need_warn() {
        let logger = StderrLogger {
            level: LevelFilter::Debug,
            started: Instant::now(),
        };
        let meta = |level, target| Metadata::builder().level(level).target(target).build();
        assert!(logger.enabled(&meta(Level::Debug, "artrack_grid::io")));
        assert!(!logger.enabled(&meta(Level::Info, "serde_json")));
        assert!(logger.enabled(&meta(Level::Warn, "serde_json")));
        assert!(!logger.enabled(&meta(Level::Trace, "artrack_grid::io")));
    }
}
