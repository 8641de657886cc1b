//! Line protocol spoken by the grading scripts on stdout.
//!
//! Scripts emit plain text with a handful of recognized prefixes. Each line is
//! classified independently, in this precedence order:
//!
//! 1. `[LOG:<LEVEL>] msg` — typed log entry, LEVEL one of SUCCESS/ERROR/WARNING/INFO
//! 2. `[USER] msg` — legacy marker, treated as INFO with the marker stripped
//! 3. `[DEV] msg` — developer diagnostic, hidden from user-visible logs
//! 4. a line shaped like a JSON object — structured result payload candidate
//! 5. anything else non-empty — plain INFO (legacy fallback)

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref LOG_PREFIX: Regex =
        Regex::new(r"^\[LOG:(SUCCESS|ERROR|WARNING|INFO)\]\s?(.*)$").unwrap();
    static ref BENIGN_STDERR: Vec<Regex> = vec![
        // pypdf complains about scanned pages without a CropBox
        Regex::new(r"CropBox missing from /Page").unwrap(),
        Regex::new(r"\bDeprecationWarning\b").unwrap(),
        Regex::new(r"\bFutureWarning\b").unwrap(),
        Regex::new(r"\bUserWarning\b").unwrap(),
        Regex::new(r"pkg_resources is deprecated").unwrap(),
    ];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    Success,
    Error,
    Warning,
    Info,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParsedLine {
    /// A user-visible log entry.
    Log(LogEntry),
    /// A `[DEV]` diagnostic, marker included. Forwarded to the live stream
    /// but never part of an execution's returned logs.
    Dev(String),
    /// A line shaped like a JSON object. The last candidate seen during a run
    /// is parsed at process exit; parsing is deferred so a malformed one can
    /// be downgraded rather than failing the run.
    PayloadCandidate(String),
    Blank,
}

pub fn parse_line(raw: &str) -> ParsedLine {
    let line = raw.trim_end_matches('\r');

    if let Some(caps) = LOG_PREFIX.captures(line) {
        let level = match &caps[1] {
            "SUCCESS" => LogLevel::Success,
            "ERROR" => LogLevel::Error,
            "WARNING" => LogLevel::Warning,
            _ => LogLevel::Info,
        };
        return ParsedLine::Log(LogEntry::new(level, &caps[2]));
    }

    if let Some(rest) = line.strip_prefix("[USER]") {
        return ParsedLine::Log(LogEntry::new(LogLevel::Info, rest.trim_start()));
    }

    if line.starts_with("[DEV]") {
        return ParsedLine::Dev(line.to_string());
    }

    let trimmed = line.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('{') && trimmed.ends_with('}') {
        return ParsedLine::PayloadCandidate(trimmed.to_string());
    }

    if trimmed.is_empty() {
        ParsedLine::Blank
    } else {
        ParsedLine::Log(LogEntry::new(LogLevel::Info, line))
    }
}

/// Known-harmless third-party warnings on stderr. These stay in the raw
/// capture but are kept out of operator-facing error messages.
pub fn is_benign_stderr(line: &str) -> bool {
    BENIGN_STDERR.iter().any(|re| re.is_match(line))
}
