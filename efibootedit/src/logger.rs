// SPDX-License-Identifier: MIT OR Apache-2.0

//! Logger writing decorated lines to stderr.
//!
//! Every line is prefixed with the level and the source location of the
//! log call, so that library messages can be told apart from the tool's
//! own output on stdout.

use core::fmt::{self, Write as _};
use std::io::{self, Write as _};

/// Global logger object
static LOGGER: Logger = Logger;

/// Set up logging. `verbosity` counts the `-v` flags.
pub fn init(verbosity: u8) {
    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    // Can only fail if already initialized.
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

/// Logging implementation which writes to stderr.
#[derive(Debug)]
struct Logger;

impl log::Log for Logger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        // The max level is already checked by the `log` macros.
        true
    }

    fn log(&self, record: &log::Record) {
        let mut text = String::new();
        let _ = DecoratedLog::write(
            &mut text,
            record.level(),
            record.args(),
            record.file().unwrap_or("<unknown file>"),
            record.line().unwrap_or(0),
        );
        // Nowhere to report a failure to write a log line.
        let _ = io::stderr().lock().write_all(text.as_bytes());
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}

/// Writer wrapper which prints a log level in front of every line of text.
///
/// `fmt::Arguments` can only be handed to a `fmt::Write` implementation, so
/// the decoration happens in the middle of that machinery, on the strings
/// the formatter sends to the writer.
struct DecoratedLog<'writer, 'a, W: fmt::Write> {
    writer: &'writer mut W,
    log_level: log::Level,
    at_line_start: bool,
    file: &'a str,
    line: u32,
}

impl<'writer, 'a, W: fmt::Write> DecoratedLog<'writer, 'a, W> {
    // Call this method to print a level-annotated log
    fn write(
        writer: &'writer mut W,
        log_level: log::Level,
        args: &fmt::Arguments,
        file: &'a str,
        line: u32,
    ) -> fmt::Result {
        let mut decorated_writer = Self {
            writer,
            log_level,
            at_line_start: true,
            file,
            line,
        };
        writeln!(decorated_writer, "{}", *args)
    }
}

impl<W: fmt::Write> fmt::Write for DecoratedLog<'_, '_, W> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let mut lines = s.lines();

        // The string may start in the middle of a line of output. Only a
        // real line start gets the prefix.
        let first = lines.next().unwrap_or("");
        if self.at_line_start {
            write!(
                self.writer,
                "[{:>5}]: {:>12}@{:03}: ",
                self.log_level, self.file, self.line
            )?;
            self.at_line_start = false;
        }
        write!(self.writer, "{first}")?;

        // Any further lines do start a line of output.
        for line in lines {
            let level = self.log_level;
            write!(self.writer, "\n{level}: {line}")?;
        }

        // `lines` swallows a trailing newline. Emit it, and prefix whatever
        // comes next.
        if let Some('\n') = s.chars().next_back() {
            writeln!(self.writer)?;
            self.at_line_start = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decorate(args: fmt::Arguments) -> String {
        let mut out = String::new();
        DecoratedLog::write(&mut out, log::Level::Info, &args, "src/boot.rs", 7).unwrap();
        out
    }

    #[test]
    fn test_single_line() {
        assert_eq!(
            decorate(format_args!("found {} boot options", 2)),
            "[ INFO]:  src/boot.rs@007: found 2 boot options\n"
        );
    }

    #[test]
    fn test_multi_line() {
        assert_eq!(
            decorate(format_args!("first\nsecond")),
            "[ INFO]:  src/boot.rs@007: first\nINFO: second\n"
        );
    }
}
