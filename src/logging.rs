/*
 * RecoFactors
 * Copyright (C) 2018 Sebastian Schelter
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <http://www.gnu.org/licenses/>.
 */

use std::io::Write;

use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

/// Installs a logger writing the crate's records to stderr.
pub fn init(verbosity: u32) -> Result<(), SetLoggerError> {
    log::set_boxed_logger(Box::new(StderrLogger))?;
    log::set_max_level(convert_verbosity_to_level(verbosity));
    Ok(())
}

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.target().starts_with("recofactors")
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("{} {}", convert_level_to_prefix(record.level()), record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn convert_verbosity_to_level(verbosity: u32) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn convert_level_to_prefix(level: Level) -> &'static str {
    match level {
        Level::Trace => "[T]",
        Level::Debug => "[D]",
        Level::Info => "[I]",
        Level::Warn => "[W]",
        Level::Error => "[E]",
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn verbosity_levels() {
        assert_eq!(convert_verbosity_to_level(0), LevelFilter::Warn);
        assert_eq!(convert_verbosity_to_level(2), LevelFilter::Debug);
        assert_eq!(convert_verbosity_to_level(7), LevelFilter::Trace);
    }

    #[test]
    fn logger_is_installed_once() {
        assert!(init(0).is_ok());
        assert!(init(0).is_err());
        log::warn!("logged through the installed logger");
    }
}
