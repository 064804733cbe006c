//! Logging to the console and, for runs with an output folder, to log files.
//!
//! Warnings and errors are written to stderr and everything else to stdout. Console output is
//! coloured by level when the stream is a terminal.
use anyhow::{Result, anyhow, bail};
use chrono::Local;
use fern::colors::{Color, ColoredLevelConfig};
use fern::{Dispatch, FormatCallback};
use log::{LevelFilter, Metadata, Record};
use std::env;
use std::fmt::{Arguments, Display};
use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::path::Path;
use std::sync::OnceLock;

static LOGGER_INIT: OnceLock<()> = OnceLock::new();

/// The log level used when neither `LNGOPT_LOG_LEVEL` nor `settings.toml` gives one
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// The environment variable which overrides the configured log level
pub const LOG_LEVEL_ENV_VAR: &str = "LNGOPT_LOG_LEVEL";

/// Log file for messages below warning level
const LOG_INFO_FILE_NAME: &str = "lngopt_info.log";

/// Log file for warnings and errors
const LOG_ERROR_FILE_NAME: &str = "lngopt_error.log";

/// Whether the program logger has been initialised
pub fn is_logger_initialised() -> bool {
    LOGGER_INIT.get().is_some()
}

/// Set up the program logger, optionally also logging to files in `log_dir`.
///
/// `LNGOPT_LOG_LEVEL` takes precedence over `log_level_from_settings`, and [`DEFAULT_LOG_LEVEL`]
/// is used if neither is given. Levels are `off`, `error`, `warn`, `info`, `debug` and `trace`.
///
/// Fails if the level is unknown, a log file cannot be created or a logger is already set.
pub fn init(log_level_from_settings: Option<&str>, log_dir: Option<&Path>) -> Result<()> {
    let level = parse_level_filter(&configured_level(log_level_from_settings))?;

    let mut dispatch = console_dispatch(level);
    if let Some(log_dir) = log_dir {
        dispatch = dispatch.chain(file_dispatch(log_dir, level)?);
    }

    dispatch
        .apply()
        .map_err(|_| anyhow!("Logger already initialised"))?;
    LOGGER_INIT.get_or_init(|| ());

    Ok(())
}

fn configured_level(log_level_from_settings: Option<&str>) -> String {
    env::var(LOG_LEVEL_ENV_VAR).unwrap_or_else(|_| {
        log_level_from_settings
            .unwrap_or(DEFAULT_LOG_LEVEL)
            .to_string()
    })
}

/// Route warnings and errors to stderr and everything else to stdout
fn console_dispatch(level: LevelFilter) -> Dispatch {
    let colours = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::Magenta);
    let stdout_colour = std::io::stdout().is_terminal();
    let stderr_colour = std::io::stderr().is_terminal();

    let stdout = Dispatch::new()
        .filter(is_below_warning)
        .level(level)
        .format(move |out, message, record| {
            write_log_colour(out, message, record, stdout_colour.then_some(&colours));
        })
        .chain(std::io::stdout());
    let stderr = Dispatch::new()
        .level(level.min(LevelFilter::Warn))
        .format(move |out, message, record| {
            write_log_colour(out, message, record, stderr_colour.then_some(&colours));
        })
        .chain(std::io::stderr());

    Dispatch::new().chain(stdout).chain(stderr)
}

/// Write uncoloured copies of log messages to `log_dir`.
///
/// The info log records at least `info` whatever the console level is. The error log always
/// records warnings and errors.
fn file_dispatch(log_dir: &Path, level: LevelFilter) -> Result<Dispatch> {
    let create = |file_name: &str| {
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(log_dir.join(file_name))
    };

    Ok(Dispatch::new()
        .format(write_log_plain)
        .chain(
            Dispatch::new()
                .filter(is_below_warning)
                .level(level.max(LevelFilter::Info))
                .chain(create(LOG_INFO_FILE_NAME)?),
        )
        .chain(
            Dispatch::new()
                .level(LevelFilter::Warn)
                .chain(create(LOG_ERROR_FILE_NAME)?),
        ))
}

fn is_below_warning(metadata: &Metadata) -> bool {
    metadata.level() > LevelFilter::Warn
}

/// Convert a log level name (case insensitive) into a [`LevelFilter`]
fn parse_level_filter(level: &str) -> Result<LevelFilter> {
    let filter = match level.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        unknown => bail!("Unknown log level: {unknown}"),
    };

    Ok(filter)
}

/// Format a message as `[time level target] message`
fn write_log<T: Display>(out: FormatCallback, level: T, target: &str, message: &Arguments) {
    let timestamp = Local::now().format("%H:%M:%S");

    out.finish(format_args!("[{timestamp} {level} {target}] {message}"));
}

fn write_log_plain(out: FormatCallback, message: &Arguments, record: &Record) {
    write_log(out, record.level(), record.target(), message);
}

fn write_log_colour(
    out: FormatCallback,
    message: &Arguments,
    record: &Record,
    colours: Option<&ColoredLevelConfig>,
) {
    match colours {
        Some(colours) => {
            write_log(out, colours.color(record.level()), record.target(), message);
        }
        None => write_log_plain(out, message, record),
    }
}
