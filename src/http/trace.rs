//! Destinations for per-request traces.

use std::io::Write;
use std::sync::{Arc, Mutex};

use crate::config::TraceOutput;

/// Receives the trace of one request.
///
/// Each call carries every line of a single request so concurrent workers
/// never interleave their output.
pub trait TraceSink: Send + Sync {
    fn record(&self, lines: &[String]);
}

/// Writes trace lines to standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl TraceSink for StdoutSink {
    fn record(&self, lines: &[String]) {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        for line in lines {
            if let Err(e) = writeln!(out, "{}", line) {
                tracing::warn!(error = %e, "Failed to write request trace");
                return;
            }
        }
        let _ = out.flush();
    }
}

/// Emits each trace as one `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl TraceSink for LogSink {
    fn record(&self, lines: &[String]) {
        tracing::info!(target: "httpcap::trace", "{}", lines.join("\n"));
    }
}

/// Keeps every trace line in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all lines recorded so far.
    pub fn lines(&self) -> Vec<String> {
        match self.lines.lock() {
            Ok(lines) => lines.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl TraceSink for MemorySink {
    fn record(&self, lines: &[String]) {
        let mut guard = match self.lines.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.extend_from_slice(lines);
    }
}

/// Build the sink selected by configuration.
pub fn sink_for(output: TraceOutput) -> Arc<dyn TraceSink> {
    match output {
        TraceOutput::Stdout => Arc::new(StdoutSink),
        TraceOutput::Log => Arc::new(LogSink),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_shares_lines_between_clones() {
        let sink = MemorySink::new();
        let clone = sink.clone();
        clone.record(&["GET / HTTP/1.1".to_string(), "  host=[x]".to_string()]);
        sink.record(&["POST / HTTP/1.1".to_string()]);
        assert_eq!(
            sink.lines(),
            vec!["GET / HTTP/1.1", "  host=[x]", "POST / HTTP/1.1"]
        );
    }
}
