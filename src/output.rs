//! Output sinks for tracker messages
//!
//! The tracker writes every user-facing line through an [`OutputSink`].
//! Lines from one flight arrive in the order the watcher decides them;
//! lines from different flights may interleave.

use console::Term;
use parking_lot::Mutex;
use tracing::warn;

/// Destination for tracker output lines
pub trait OutputSink: Send + Sync {
    fn emit(&self, line: &str);
}

/// Writes lines to stdout
#[derive(Debug, Clone)]
pub struct ConsoleSink {
    term: Term,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
        }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputSink for ConsoleSink {
    fn emit(&self, line: &str) {
        if let Err(e) = self.term.write_line(line) {
            warn!(error = %e, "Failed to write output line");
        }
    }
}

/// Keeps every line in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the lines emitted so far
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Lines that start with the given prefix, in emission order
    pub fn lines_starting_with(&self, prefix: &str) -> Vec<String> {
        self.lines
            .lock()
            .iter()
            .filter(|line| line.starts_with(prefix))
            .cloned()
            .collect()
    }
}

impl OutputSink for MemorySink {
    fn emit(&self, line: &str) {
        self.lines.lock().push(line.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_keeps_order() {
        let sink = MemorySink::new();
        sink.emit("A: first");
        sink.emit("B: other");
        sink.emit("A: second");

        assert_eq!(sink.lines().len(), 3);
        assert_eq!(sink.lines_starting_with("A:"), vec!["A: first", "A: second"]);
    }
}
