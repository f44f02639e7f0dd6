//! Logger.
//!
//! Compilation diagnostics are pushed through a [`Logger`] so that embedding code can decide
//! where they end up. The default [`StdoutLogger`] prints timestamped, colored lines; errors go
//! to the standard error stream so that operators see failed compilations even when stdout is
//! redirected.

use chrono::{Datelike, Local, Timelike};
use std::fmt::Arguments;

/// Trait used to log compilation activity.
pub trait Logger {
  /// Log some information.
  fn info(&mut self, args: Arguments);
  /// Log some debug information.
  fn debug(&mut self, args: Arguments);
  /// Log some warnings.
  fn warn(&mut self, args: Arguments);
  /// Log some errors.
  fn error(&mut self, args: Arguments);
}

/// Logger printing to the standard streams.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct StdoutLogger;

impl Logger for StdoutLogger {
  fn info(&mut self, args: Arguments) {
    println!("\x1b[90m{} \x1b[34m> {}\x1b[0m", now(), args);
  }

  fn debug(&mut self, args: Arguments) {
    println!("\x1b[90m{} \x1b[36m> {}\x1b[0m", now(), args);
  }

  fn warn(&mut self, args: Arguments) {
    println!("\x1b[90m{} \x1b[33m> {}\x1b[0m", now(), args);
  }

  fn error(&mut self, args: Arguments) {
    eprintln!("\x1b[90m{} \x1b[31m> {}\x1b[0m", now(), args);
  }
}

/// Logger dropping everything on the floor.
///
/// Handy when the caller only cares about the returned errors.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct SilentLogger;

impl Logger for SilentLogger {
  fn info(&mut self, _: Arguments) {}

  fn debug(&mut self, _: Arguments) {}

  fn warn(&mut self, _: Arguments) {}

  fn error(&mut self, _: Arguments) {}
}

pub fn now() -> String {
  let t = Local::now();

  format!("{month:0>2}/{day:0>2}/{year} {hour:0>2}:{min:0>2}:{secs:0>2}:{nsecs:0>9}",
          month = t.month(),
          day = t.day(),
          year = t.year(),
          hour = t.hour(),
          min = t.minute(),
          secs = t.second(),
          nsecs = t.nanosecond())
}

#[macro_export]
macro_rules! info {
  ($logger:expr, $s:expr $(, $r:expr)*) => {{
    use $crate::logger::Logger;
    $logger.info(format_args!($s $(, $r)*));
  }}
}

#[macro_export]
macro_rules! deb {
  ($logger:expr, $s:expr $(, $r:expr)*) => {{
    use $crate::logger::Logger;
    $logger.debug(format_args!($s $(, $r)*));
  }}
}

#[macro_export]
macro_rules! warn {
  ($logger:expr, $s:expr $(, $r:expr)*) => {{
    use $crate::logger::Logger;
    $logger.warn(format_args!($s $(, $r)*));
  }}
}

#[macro_export]
macro_rules! err {
  ($logger:expr, $s:expr $(, $r:expr)*) => {{
    use $crate::logger::Logger;
    $logger.error(format_args!($s $(, $r)*));
  }}
}
