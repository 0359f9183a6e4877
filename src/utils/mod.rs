//! Utilities: logging with a level that can be raised after start-up.
//!
//! Key items:
//!   init_logging / derive_level / set_log_level
//!   level_from_env
//!
//! The library itself only emits `tracing` events; installing a subscriber
//! is left to the binary (or to a script's `main`).

/// Logging helpers.
pub mod logging {
    use std::sync::OnceLock;

    use tracing_subscriber::filter::LevelFilter;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{Registry, fmt, reload};

    #[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
    pub enum LogLevel {
        Error = 0,
        Info = 1,
        Debug = 2,
        Trace = 3,
    }

    impl LogLevel {
        pub fn as_str(&self) -> &'static str {
            match self {
                LogLevel::Error => "ERROR",
                LogLevel::Info => "INFO",
                LogLevel::Debug => "DEBUG",
                LogLevel::Trace => "TRACE",
            }
        }

        /// Case-insensitive name lookup (`error`, `info`, `debug`, `trace`).
        pub fn from_name(name: &str) -> Option<Self> {
            match name.trim().to_ascii_lowercase().as_str() {
                "error" => Some(LogLevel::Error),
                "info" => Some(LogLevel::Info),
                "debug" => Some(LogLevel::Debug),
                "trace" => Some(LogLevel::Trace),
                _ => None,
            }
        }

        fn filter(&self) -> LevelFilter {
            match self {
                LogLevel::Error => LevelFilter::ERROR,
                LogLevel::Info => LevelFilter::INFO,
                LogLevel::Debug => LevelFilter::DEBUG,
                LogLevel::Trace => LevelFilter::TRACE,
            }
        }
    }

    static RELOAD: OnceLock<reload::Handle<LevelFilter, Registry>> = OnceLock::new();

    /// Install a stderr subscriber at `level`. Later calls only change the level.
    pub fn init_logging(level: LogLevel) {
        if RELOAD.get().is_some() {
            set_log_level(level);
            return;
        }
        let (filter, handle) = reload::Layer::new(level.filter());
        let installed = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init()
            .is_ok();
        if installed {
            let _ = RELOAD.set(handle);
        }
    }

    pub fn set_log_level(level: LogLevel) {
        if let Some(handle) = RELOAD.get() {
            let _ = handle.modify(|f| *f = level.filter());
        }
    }

    pub fn derive_level(verbose: u8, quiet: bool) -> LogLevel {
        if quiet {
            return LogLevel::Error;
        }
        match verbose {
            0 => LogLevel::Info,
            1 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }

    /// Level named by environment variable `key`, if set and recognised.
    pub fn level_from_env(key: &str) -> Option<LogLevel> {
        std::env::var(key).ok().and_then(|v| LogLevel::from_name(&v))
    }

}

pub use logging::{LogLevel, derive_level, init_logging, level_from_env, set_log_level};
