//! The narration channel: every line a pattern program prints goes through a
//! [`Narrator`], which also keeps the transcript tests assert against.

use crate::config::{DemoConfig, Pacing};
use crate::error::{PatternError, Result};
use colored::Colorize;
use std::cell::RefCell;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

const RULE_WIDTH: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sink {
    Stdout,
    Capture,
}

#[derive(Debug)]
struct Inner {
    sink: Sink,
    pacing: Pacing,
    lines: RefCell<Vec<String>>,
}

/// Shared handle to the narration record. Clones append to the same record.
#[derive(Debug, Clone)]
pub struct Narrator {
    inner: Rc<Inner>,
}

impl Narrator {
    /// Narrator for a real run: lines go to standard output.
    pub fn new(config: &DemoConfig) -> Self {
        colored::control::set_override(config.color);
        Self::with_sink(Sink::Stdout, config.pacing)
    }

    /// Narrator for tests: nothing is printed and pauses never block.
    pub fn capture() -> Self {
        Self::with_sink(Sink::Capture, Pacing::Instant)
    }

    fn with_sink(sink: Sink, pacing: Pacing) -> Self {
        Self {
            inner: Rc::new(Inner {
                sink,
                pacing,
                lines: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn say(&self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if text.is_empty() {
            self.record(String::new(), None);
            return;
        }
        for line in text.lines() {
            self.record(line.to_string(), None);
        }
    }

    pub fn blank(&self) {
        self.say("");
    }

    pub fn title(&self, pattern: &str) {
        let line = format!("=== {pattern} Pattern Demo ===");
        let styled = line.bold().cyan().to_string();
        self.record(line, Some(styled));
    }

    pub fn section(&self, index: usize, heading: &str) {
        self.blank();
        let line = format!("{index}. {heading}:");
        let styled = line.bold().to_string();
        self.record(line, Some(styled));
        self.record("=".repeat(RULE_WIDTH), None);
    }

    pub fn checklist(&self, items: &[&str]) {
        for item in items {
            let line = format!("✓ {item}");
            let styled = format!("{} {item}", "✓".green());
            self.record(line, Some(styled));
        }
    }

    /// Legibility pause; blocks only when pacing is real-time.
    pub fn pause(&self, duration: Duration) {
        if self.inner.pacing == Pacing::RealTime {
            thread::sleep(duration);
        }
    }

    pub fn pause_ms(&self, millis: u64) {
        self.pause(Duration::from_millis(millis));
    }

    pub fn lines(&self) -> Vec<String> {
        self.inner.lines.borrow().clone()
    }

    pub fn transcript(&self) -> String {
        self.inner.lines.borrow().join("\n")
    }

    pub fn len(&self) -> usize {
        self.inner.lines.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.inner.lines.borrow().iter().any(|line| line.contains(needle))
    }

    /// Number of lines containing `needle`.
    pub fn count(&self, needle: &str) -> usize {
        self.inner
            .lines
            .borrow()
            .iter()
            .filter(|line| line.contains(needle))
            .count()
    }

    /// Index of the first line containing `needle`.
    pub fn position(&self, needle: &str) -> Option<usize> {
        self.inner
            .lines
            .borrow()
            .iter()
            .position(|line| line.contains(needle))
    }

    fn record(&self, plain: String, styled: Option<String>) {
        if self.inner.sink == Sink::Stdout {
            println!("{}", styled.as_deref().unwrap_or(&plain));
        }
        self.inner.lines.borrow_mut().push(plain);
    }
}

/// Format and narrate one line: `narrate!(out, "Balance: {}", balance)`.
#[macro_export]
macro_rules! narrate {
    ($out:expr, $($arg:tt)*) => {
        $out.say(format!($($arg)*))
    };
}

/// Turns non-fatal failures into narration so they are never silent.
pub trait Report<T> {
    /// Narrates a non-fatal error as `❌ <message>` and yields `Ok(None)`;
    /// fatal errors are returned unchanged.
    fn or_narrate(self, out: &Narrator) -> Result<Option<T>>;
}

impl<T> Report<T> for Result<T, PatternError> {
    fn or_narrate(self, out: &Narrator) -> Result<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_fatal() => Err(err),
            Err(err) => {
                tracing::debug!(kind = ?err.kind(), %err, "operation rejected");
                out.say(format!("❌ {err}"));
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_records_lines_in_order() {
        let out = Narrator::capture();
        out.say("first");
        narrate!(out, "second {}", 2);
        assert_eq!(out.lines(), vec!["first", "second 2"]);
        assert_eq!(out.position("second"), Some(1));
    }

    #[test]
    fn test_multiline_text_is_split() {
        let out = Narrator::capture();
        out.say("a\nb\nc");
        assert_eq!(out.len(), 3);
        out.blank();
        assert_eq!(out.lines().last().map(String::as_str), Some(""));
    }

    #[test]
    fn test_clones_share_the_record() {
        let out = Narrator::capture();
        let other = out.clone();
        other.say("from clone");
        assert!(out.contains("from clone"));
    }

    #[test]
    fn test_section_and_title_shapes() {
        let out = Narrator::capture();
        out.title("Observer");
        out.section(1, "News Agency");
        out.checklist(&["Loose coupling"]);
        assert_eq!(
            out.lines(),
            vec![
                "=== Observer Pattern Demo ===".to_string(),
                String::new(),
                "1. News Agency:".to_string(),
                "=".repeat(50),
                "✓ Loose coupling".to_string(),
            ]
        );
    }

    #[test]
    fn test_count_matches_lines() {
        let out = Narrator::capture();
        out.say("hit");
        out.say("miss");
        out.say("hit again");
        assert_eq!(out.count("hit"), 2);
        assert!(!out.contains("absent"));
    }

    #[test]
    fn test_report_narrates_non_fatal_errors() {
        let out = Narrator::capture();
        let rejected: Result<u32> = Err(PatternError::precondition("Insufficient funds"));
        assert!(matches!(rejected.or_narrate(&out), Ok(None)));
        assert!(out.contains("❌ Insufficient funds"));

        let accepted: Result<u32> = Ok(5);
        assert!(matches!(accepted.or_narrate(&out), Ok(Some(5))));
    }

    #[test]
    fn test_report_passes_fatal_errors_through() {
        let out = Narrator::capture();
        let fatal: Result<()> = Err(PatternError::fatal("broken"));
        assert!(fatal.or_narrate(&out).is_err());
        assert!(out.is_empty());
    }

    #[test]
    fn test_capture_pause_does_not_block() {
        let out = Narrator::capture();
        let start = std::time::Instant::now();
        out.pause(Duration::from_secs(5));
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
