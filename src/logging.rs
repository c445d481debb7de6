//! Console + file logging.
//!
//! The console follows `RUST_LOG` (default `info`). The log file is
//! truncated on every start and keeps this crate's `debug` output, so a
//! session can be inspected after the window is closed.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use env_logger::{Builder, Env, Logger, Target, WriteStyle};
use log::{LevelFilter, Log, Metadata, Record};

/// Default log file, relative to the working directory.
pub const DEFAULT_LOG_PATH: &str = "tile-labeler.log";

/// Forwards every record to two independently filtered `env_logger`s.
struct SplitLogger {
    console: Logger,
    file: Option<Logger>,
}

impl SplitLogger {
    fn max_level(&self) -> LevelFilter {
        let file = self.file.as_ref().map_or(LevelFilter::Off, Logger::filter);
        self.console.filter().max(file)
    }
}

impl Log for SplitLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.console.enabled(metadata) || self.file.as_ref().is_some_and(|f| f.enabled(metadata))
    }

    fn log(&self, record: &Record) {
        // each logger applies its own filter
        self.console.log(record);
        if let Some(file) = &self.file {
            file.log(record);
        }
    }

    fn flush(&self) {
        self.console.flush();
        if let Some(file) = &self.file {
            file.flush();
        }
    }
}

fn console_builder() -> Builder {
    Builder::from_env(Env::default().default_filter_or("info"))
}

/// Debug for this crate, warnings only for the UI and graphics stack.
fn file_builder() -> Builder {
    let mut builder = Builder::new();
    builder
        .filter_level(LevelFilter::Warn)
        .filter_module(env!("CARGO_CRATE_NAME"), LevelFilter::Debug)
        .write_style(WriteStyle::Never);
    builder
}

/// Install the global logger. If `log_path` cannot be created the session
/// still logs to the console.
pub fn init(log_path: &Path) -> Result<()> {
    let (file, file_error) = match File::create(log_path) {
        Ok(f) => (Some(f), None),
        Err(e) => (None, Some(e)),
    };
    let logger = SplitLogger {
        console: console_builder().build(),
        file: file.map(|f| file_builder().target(Target::Pipe(Box::new(f))).build()),
    };
    let max_level = logger.max_level();
    log::set_boxed_logger(Box::new(logger)).context("installing the logger")?;
    log::set_max_level(max_level);

    match file_error {
        None => log::debug!("Logging to {}", log_path.display()),
        Some(e) => log::warn!("Cannot create log file {}: {e}", log_path.display()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    use log::Level;

    use super::*;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn send(logger: &SplitLogger, level: Level, target: &str, message: &str) {
        logger.log(
            &Record::builder()
                .args(format_args!("{message}"))
                .level(level)
                .target(target)
                .build(),
        );
    }

    #[test]
    fn file_gets_debug_and_console_gets_info() {
        let console = SharedBuf::default();
        let file = SharedBuf::default();
        let logger = SplitLogger {
            console: Builder::new()
                .filter_level(LevelFilter::Info)
                .target(Target::Pipe(Box::new(console.clone())))
                .build(),
            file: Some(
                file_builder()
                    .target(Target::Pipe(Box::new(file.clone())))
                    .build(),
            ),
        };
        let own = concat!(env!("CARGO_CRATE_NAME"), "::state");

        send(&logger, Level::Info, own, "Page: 2");
        send(&logger, Level::Debug, own, "column area: Float64");
        send(&logger, Level::Debug, "wgpu_core::device", "buffer mapped");
        logger.flush();

        let console = console.text();
        let file = file.text();
        assert!(console.contains("Page: 2"));
        assert!(!console.contains("column area"));
        assert!(file.contains("Page: 2"));
        assert!(file.contains("column area: Float64"));
        assert!(!file.contains("buffer mapped"));
        assert_eq!(logger.max_level(), LevelFilter::Debug);
    }

    #[test]
    fn missing_file_logger_keeps_console_level() {
        let logger = SplitLogger {
            console: Builder::new().filter_level(LevelFilter::Info).build(),
            file: None,
        };
        assert_eq!(logger.max_level(), LevelFilter::Info);
    }
}
