//! Tracing output is captured into an in-memory ring buffer that backs
//! the on-screen log pane. The buffer is an explicit handle constructed
//! at startup and passed to whoever renders it; there is no global.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::Local;
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: String,
    pub message: String,
}

impl LogEntry {
    fn new(level: Level, message: String) -> Self {
        Self {
            timestamp: Local::now().format("%H:%M:%S").to_string(),
            level: level.to_string(),
            message,
        }
    }

    pub fn format_for_display(&self) -> String {
        format!("[{}] {} {}", self.timestamp, self.level, self.message)
    }
}

/// Thread-safe bounded buffer of recent log lines. Clones share storage,
/// so background tasks and the render path see the same entries.
#[derive(Clone)]
pub struct LogRingBuffer {
    entries: Arc<Mutex<VecDeque<LogEntry>>>,
    capacity: usize,
}

impl LogRingBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    pub fn push(&self, entry: LogEntry) {
        let mut entries = self.entries.lock().unwrap();
        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// The most recent `count` entries, oldest first.
    pub fn recent(&self, count: usize) -> Vec<LogEntry> {
        let entries = self.entries.lock().unwrap();
        entries.iter().rev().take(count).rev().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}

/// `MakeWriter` that parses the subscriber's compact lines back into
/// structured entries for the ring buffer.
#[derive(Clone)]
pub struct RingBufferWriter {
    buffer: LogRingBuffer,
}

impl RingBufferWriter {
    pub fn new(buffer: LogRingBuffer) -> Self {
        Self { buffer }
    }
}

fn split_level(line: &str) -> (Level, &str) {
    for (prefix, level) in [
        ("TRACE ", Level::TRACE),
        ("DEBUG ", Level::DEBUG),
        ("INFO ", Level::INFO),
        ("WARN ", Level::WARN),
        ("ERROR ", Level::ERROR),
    ] {
        if let Some(rest) = line.strip_prefix(prefix) {
            return (level, rest.trim_start());
        }
    }
    (Level::INFO, line)
}

impl std::io::Write for RingBufferWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Ok(text) = std::str::from_utf8(buf) {
            let text = text.trim();
            if !text.is_empty() {
                let (level, message) = split_level(text);
                self.buffer.push(LogEntry::new(level, message.to_string()));
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for RingBufferWriter {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Install the tracing subscriber and hand back the buffer it writes to.
pub fn init_tracing(capacity: usize) -> LogRingBuffer {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let buffer = LogRingBuffer::new(capacity);
    let writer = RingBufferWriter::new(buffer.clone());

    let fmt_layer = fmt::layer()
        .with_writer(writer)
        .with_target(false)
        .with_level(true)
        .with_ansi(false)
        .without_time()
        .compact();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();

    tracing::info!(target: "system", "logging initialized");
    buffer
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn ring_buffer_drops_oldest_entries() {
        let buffer = LogRingBuffer::new(2);
        for i in 0..3 {
            buffer.push(LogEntry::new(Level::INFO, format!("line {i}")));
        }
        let recent = buffer.recent(10);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].message, "line 1");
        assert_eq!(recent[1].message, "line 2");
    }

    #[test]
    fn writer_extracts_the_level_prefix() {
        let buffer = LogRingBuffer::new(8);
        let mut writer = RingBufferWriter::new(buffer.clone());
        writer.write_all(b"WARN something looks off\n").unwrap();
        let recent = buffer.recent(1);
        assert_eq!(recent[0].level, "WARN");
        assert_eq!(recent[0].message, "something looks off");
    }
}
