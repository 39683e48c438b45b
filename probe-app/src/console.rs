//! Operator-facing output.
//!
//! Probes never print directly; they receive a [`Reporter`] so tests can record
//! what would have been shown.

use colored::Colorize;
#[cfg(test)]
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Success,
    Warning,
    Error,
}

pub trait Reporter: Send + Sync {
    fn emit(&self, level: Level, message: &str);

    fn debug(&self, message: &str) {
        self.emit(Level::Debug, message);
    }

    fn info(&self, message: &str) {
        self.emit(Level::Info, message);
    }

    fn success(&self, message: &str) {
        self.emit(Level::Success, message);
    }

    fn warning(&self, message: &str) {
        self.emit(Level::Warning, message);
    }

    fn error(&self, message: &str) {
        self.emit(Level::Error, message);
    }

    /// Section banner, e.g. before each probe and the summary.
    fn banner(&self, title: &str) {
        let rule = "=".repeat(50);
        self.info(&rule);
        self.info(title);
        self.info(&rule);
    }
}

/// Prints colored lines to stdout. Debug lines are shown only when verbose.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleReporter {
    verbose: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Reporter for ConsoleReporter {
    fn emit(&self, level: Level, message: &str) {
        let line = match level {
            Level::Debug if !self.verbose => return,
            Level::Debug => message.dimmed(),
            Level::Info => message.blue(),
            Level::Success => message.green(),
            Level::Warning => message.yellow(),
            Level::Error => message.red(),
        };
        println!("{line}");
    }
}

/// Keeps every emitted line in memory.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingReporter {
    lines: Mutex<Vec<(Level, String)>>,
}

#[cfg(test)]
impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(Level, String)> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|(_, line)| line.contains(needle))
    }

    pub fn count_at(&self, level: Level) -> usize {
        self.lines().iter().filter(|(l, _)| *l == level).count()
    }
}

#[cfg(test)]
impl Reporter for RecordingReporter {
    fn emit(&self, level: Level, message: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push((level, message.to_string()));
        }
    }
}

/// Cut `text` to at most `max_chars` characters, appending `...` when shortened.
pub fn truncate_sample(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{Level, RecordingReporter, Reporter, truncate_sample};

    #[test]
    fn recording_reporter_keeps_levels_in_order() {
        let r = RecordingReporter::new();
        r.info("starting");
        r.warning("slow");
        r.error("boom");
        let lines = r.lines();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], (Level::Warning, "slow".to_string()));
        assert_eq!(r.count_at(Level::Error), 1);
        assert!(r.contains("boo"));
    }

    #[test]
    fn banner_wraps_title_in_rules() {
        let r = RecordingReporter::new();
        r.banner("Running probe: Completion");
        let lines = r.lines();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].1, "Running probe: Completion");
        assert!(lines[0].1.chars().all(|c| c == '='));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_sample("short", 200), "short");
        assert_eq!(truncate_sample("abcdef", 3), "abc...");
        assert_eq!(truncate_sample("量化投资策略", 2), "量化...");
    }
}
