//! Per-test progress logging.
#![allow(dead_code)]
//!
//! Writes one line per event to stderr (captured by the test harness unless
//! `--nocapture` is given). `TEST_LOG_JSON=1` switches to JSON lines and
//! `TEST_LOG_LEVEL` filters (trace, debug, info, warn, error; default info).

use std::fmt;
use std::sync::OnceLock;
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;

use super::log_capture::TestLogCapture;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Serialize)]
struct LogEntry<'a> {
    timestamp: String,
    level: LogLevel,
    test: &'a str,
    phase: Option<&'a str>,
    message: &'a str,
    elapsed_ms: u64,
}

fn min_level() -> LogLevel {
    static LEVEL: OnceLock<LogLevel> = OnceLock::new();
    *LEVEL.get_or_init(|| {
        std::env::var("TEST_LOG_LEVEL")
            .ok()
            .and_then(|s| LogLevel::parse(&s))
            .unwrap_or(LogLevel::Info)
    })
}

fn json_mode() -> bool {
    static JSON: OnceLock<bool> = OnceLock::new();
    *JSON.get_or_init(|| {
        std::env::var("TEST_LOG_JSON").is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
    })
}

/// Logger scoped to one test.
pub struct TestLogger {
    name: String,
    start: Instant,
    phase: std::cell::RefCell<Option<String>>,
}

impl TestLogger {
    #[must_use]
    pub fn new(test_name: &str) -> Self {
        let logger = Self {
            name: test_name.to_string(),
            start: Instant::now(),
            phase: std::cell::RefCell::new(None),
        };
        logger.log(LogLevel::Debug, "start");
        logger
    }

    /// Logger plus a tracing capture active for the current thread.
    #[must_use]
    pub fn with_capture(test_name: &str) -> (Self, TestLogCapture) {
        (Self::new(test_name), TestLogCapture::start())
    }

    pub fn phase(&self, phase: &str) {
        *self.phase.borrow_mut() = Some(phase.to_string());
        self.log(LogLevel::Debug, &format!("phase: {phase}"));
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    pub fn http_request(&self, method: &str, url: &str) {
        self.log(LogLevel::Debug, &format!("{method} {url}"));
    }

    pub fn command(&self, args: &[&str]) {
        self.log(LogLevel::Debug, &format!("$ flowsense {}", args.join(" ")));
    }

    pub fn finish_ok(&self) {
        self.log(LogLevel::Info, "PASS");
    }

    pub fn finish_err(&self, reason: &str) {
        self.log(LogLevel::Error, &format!("FAIL: {reason}"));
    }

    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    fn log(&self, level: LogLevel, message: &str) {
        if level < min_level() {
            return;
        }
        let phase = self.phase.borrow();
        if json_mode() {
            let entry = LogEntry {
                timestamp: Utc::now().to_rfc3339(),
                level,
                test: &self.name,
                phase: phase.as_deref(),
                message,
                elapsed_ms: self.elapsed_ms(),
            };
            if let Ok(line) = serde_json::to_string(&entry) {
                eprintln!("{line}");
            }
        } else {
            let phase = phase.as_deref().map(|p| format!("[{p}] ")).unwrap_or_default();
            eprintln!(
                "{level:<5} {} {phase}{message} ({}ms)",
                self.name,
                self.elapsed_ms()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_parsing() {
        assert_eq!(LogLevel::parse("WARNING"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("nope"), None);
        assert!(LogLevel::Trace < LogLevel::Error);
    }
}
