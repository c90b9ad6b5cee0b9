//! Append-only, timestamped activity log.
//!
//! Every workflow step writes a `start` entry when it is invoked and exactly
//! one terminal entry (`success` or `error`) when it finishes. The log is
//! shared: cloning an [`ActivityLog`] yields another handle to the same
//! entries, and appends from concurrently running steps are serialized.
//!
//! Entries render as `[HH:MM] <tag> <step>[: <message>]`.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Kind of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogTag {
    /// The step was invoked.
    Start,
    /// The step completed.
    Success,
    /// The step failed, either before or after its platform call started.
    Error,
}

impl LogTag {
    /// Whether this tag ends a step.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LogTag::Start)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogTag::Start => "start",
            LogTag::Success => "success",
            LogTag::Error => "error",
        }
    }
}

impl fmt::Display for LogTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of the activity log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// When the entry was appended (local time where the offset is known).
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub tag: LogTag,
    /// Display name of the step.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl LogEntry {
    /// The display line with the tag rendered by the caller, e.g. coloured.
    pub fn format_with_tag(&self, tag: impl fmt::Display) -> String {
        let mut line = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_line(&mut line, &tag);
        line
    }

    fn write_line(&self, out: &mut impl fmt::Write, tag: &dyn fmt::Display) -> fmt::Result {
        write!(
            out,
            "[{:02}:{:02}] {} {}",
            self.timestamp.hour(),
            self.timestamp.minute(),
            tag,
            self.name
        )?;
        if let Some(message) = &self.message {
            write!(out, ": {}", message)?;
        }
        Ok(())
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_line(f, &self.tag)
    }
}

/// Source of entry timestamps.
pub type Clock = Arc<dyn Fn() -> OffsetDateTime + Send + Sync>;

fn local_now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

/// Shared handle to the activity log.
#[derive(Clone)]
pub struct ActivityLog {
    entries: Arc<Mutex<Vec<LogEntry>>>,
    clock: Clock,
}

impl fmt::Debug for ActivityLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivityLog")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityLog {
    /// Create an empty log stamped with the local wall clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(local_now))
    }

    /// Create an empty log with a custom timestamp source.
    pub fn with_clock(clock: Clock) -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LogEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an entry and return a copy of it.
    pub fn append(&self, tag: LogTag, name: &str, message: Option<String>) -> LogEntry {
        let entry = LogEntry {
            timestamp: (self.clock)(),
            tag,
            name: name.to_string(),
            message,
        };
        self.lock().push(entry.clone());
        entry
    }

    /// Snapshot of all entries in append order.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().clone()
    }

    /// Entries appended at or after position `from`.
    pub fn since(&self, from: usize) -> Vec<LogEntry> {
        self.lock().iter().skip(from).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Render every entry as one JSON object per line.
    pub fn to_json_lines(&self) -> serde_json::Result<String> {
        let entries = self.lock();
        let mut out = String::new();
        for entry in entries.iter() {
            out.push_str(&serde_json::to_string(entry)?);
            out.push('\n');
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn fixed_log() -> ActivityLog {
        ActivityLog::with_clock(Arc::new(|| datetime!(2024-03-01 09:05:42 UTC)))
    }

    #[test]
    fn test_entry_display() {
        let log = fixed_log();
        let start = log.append(LogTag::Start, "ReadBatteryLevel", None);
        assert_eq!(start.to_string(), "[09:05] start ReadBatteryLevel");

        let done = log.append(
            LogTag::Error,
            "ReadBatteryLevel",
            Some("battery service not available".into()),
        );
        assert_eq!(
            done.to_string(),
            "[09:05] error ReadBatteryLevel: battery service not available"
        );
    }

    #[test]
    fn test_format_with_custom_tag() {
        let log = fixed_log();
        let entry = log.append(LogTag::Success, "OpenSession", None);
        assert_eq!(entry.format_with_tag("<ok>"), "[09:05] <ok> OpenSession");
        assert_eq!(entry.format_with_tag(entry.tag), entry.to_string());
    }

    #[test]
    fn test_shared_handles() {
        let log = fixed_log();
        let other = log.clone();
        other.append(LogTag::Start, "OpenSession", None);
        assert_eq!(log.len(), 1);
        assert!(!log.is_empty());
        assert_eq!(log.since(1).len(), 0);
        assert_eq!(log.since(0)[0].name, "OpenSession");
    }

    #[test]
    fn test_concurrent_appends_are_all_kept() {
        let log = fixed_log();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let log = log.clone();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        log.append(LogTag::Start, &format!("step-{}", i), None);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(log.len(), 400);
    }

    #[test]
    fn test_json_lines() {
        let log = fixed_log();
        log.append(LogTag::Start, "CheckBattery", None);
        log.append(LogTag::Success, "CheckBattery", None);

        let json = log.to_json_lines().unwrap();
        let lines: Vec<&str> = json.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: LogEntry = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(parsed.tag, LogTag::Success);
        assert_eq!(parsed.name, "CheckBattery");
        assert!(parsed.message.is_none());
        assert!(lines[0].contains("\"tag\":\"start\""));
        assert!(lines[0].contains("2024-03-01T09:05:42Z"));
    }

    #[test]
    fn test_terminal_tags() {
        assert!(!LogTag::Start.is_terminal());
        assert!(LogTag::Success.is_terminal());
        assert!(LogTag::Error.is_terminal());
    }
}
