//! Logger initialisation
//!
//! Sets up a `fern` dispatch writing to the console and to the session's log file.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::{ColoredString, Colorize};
use log::{self, info};
use thiserror::Error;

// Internal imports
use crate::session;

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Lowest level written to the session log file.
const FILE_LEVEL: LevelFilter = LevelFilter::Debug;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Expected a log level of at least `INFO`, found `{0}`")]
    InvalidMinLogLevel(log::LevelFilter),

    #[error("Error initialising the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("An error occured while setting up the logger: {0}")]
    FernInitError(log::SetLoggerError),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution.
///
/// Messages at `min_level` and above go to stdout with coloured level tags. The session's log
/// file always receives everything down to `Debug`, without colour codes. Each line is stamped
/// with the number of seconds elapsed since the session epoch.
///
/// # Notes
///
/// - `min_level` must be at least `log::Level::Info`, so that the build and publish summaries are
///   never filtered out.
///
/// # Safety
///
/// - This function must only be called once to prevent corrupting logs.
pub fn logger_init(
    min_level: self::LevelFilter,
    session: &session::Session,
) -> Result<(), LoggerInitError> {
    if min_level < log::Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level));
    }

    let log_file =
        fern::log_file(session.log_file_path.clone()).map_err(LoggerInitError::LogFileInitError)?;

    let console = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{:10.6} {}] {}",
                session::get_elapsed_seconds(),
                level_tag(record.level()).colored(),
                message
            ))
        })
        .level(min_level)
        .chain(std::io::stdout());

    // The file also records the target, which tells segments and stages apart at debug level
    let file = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{:10.6} {}] {}: {}",
                session::get_elapsed_seconds(),
                level_tag(record.level()).plain(),
                record.target(),
                message
            ))
        })
        .level(FILE_LEVEL.max(min_level))
        .chain(log_file);

    fern::Dispatch::new()
        .level_for("zmq", LevelFilter::Info)
        .chain(console)
        .chain(file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised");
    info!("    Session epoch: {}", session::get_epoch());
    info!("    Console log level: {:?}", min_level);
    info!("    File log level: {:?}", FILE_LEVEL.max(min_level));
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn level_tag(level: log::Level) -> LevelTag {
    LevelTag(level)
}

/// A short three letter level tag.
struct LevelTag(log::Level);

impl LevelTag {
    fn plain(&self) -> &'static str {
        match self.0 {
            log::Level::Trace => "TRC",
            log::Level::Debug => "DBG",
            log::Level::Info => "INF",
            log::Level::Warn => "WRN",
            log::Level::Error => "ERR",
        }
    }

    fn colored(&self) -> ColoredString {
        let tag = self.plain();

        match self.0 {
            log::Level::Trace => tag.dimmed().italic(),
            log::Level::Debug => tag.dimmed(),
            log::Level::Info => tag.normal(),
            log::Level::Warn => tag.yellow(),
            log::Level::Error => tag.red().bold(),
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_level_tags() {
        assert_eq!(level_tag(log::Level::Warn).plain(), "WRN");
        assert_eq!(level_tag(log::Level::Debug).plain(), "DBG");
        assert!(level_tag(log::Level::Error).colored().to_string().contains("ERR"));
    }
}
