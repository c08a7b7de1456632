//! Telemetry sinks.
//!
//! The original firmware buffers formatted lines into a small ring (`fifo.h`,
//! named in `rf.cpp`'s include list) ahead of a UART write shared with other
//! tasks; `RingSink` plays that role here. Both it and the console/log sinks
//! are guarded by a `tokio::sync::Mutex`, matching the RTOS mutex's
//! essentially-unbounded default wait policy: a full ring or a slow writer
//! suspends the RF task at an explicit await point rather than blocking it.

use crate::error::RfError;
use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::sync::Mutex;

/// Destination for formatted telemetry lines.
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    async fn write_line(&self, line: &str) -> Result<(), RfError>;
}

/// Writes every line to the `log` facade at `info` level.
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl TelemetrySink for LogSink {
    async fn write_line(&self, line: &str) -> Result<(), RfError> {
        log::info!(target: "telemetry", "{}", line.trim_end());
        Ok(())
    }
}

/// A fixed-capacity FIFO of formatted lines, standing in for `fifo.h`'s
/// console ring buffer. Oldest lines are
/// dropped once full rather than blocking the writer.
#[derive(Debug)]
pub struct RingSink {
    capacity: usize,
    lines: Mutex<VecDeque<String>>,
}

impl RingSink {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            lines: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Drain every buffered line, oldest first.
    pub async fn drain(&self) -> Vec<String> {
        let mut lines = self.lines.lock().await;
        lines.drain(..).collect()
    }

    pub async fn len(&self) -> usize {
        self.lines.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl TelemetrySink for RingSink {
    async fn write_line(&self, line: &str) -> Result<(), RfError> {
        let mut lines = self.lines.lock().await;
        if lines.len() >= self.capacity {
            lines.pop_front();
        }
        lines.push_back(line.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ring_sink_drops_oldest_when_full() {
        let sink = RingSink::new(2);
        sink.write_line("a").await.unwrap();
        sink.write_line("b").await.unwrap();
        sink.write_line("c").await.unwrap();
        let drained = sink.drain().await;
        assert_eq!(drained, vec!["b".to_string(), "c".to_string()]);
    }

    #[tokio::test]
    async fn ring_sink_reports_length() {
        let sink = RingSink::new(4);
        assert!(sink.is_empty().await);
        sink.write_line("x").await.unwrap();
        assert_eq!(sink.len().await, 1);
    }

    #[tokio::test]
    async fn log_sink_never_fails() {
        let sink = LogSink;
        assert!(sink.write_line("hello").await.is_ok());
    }
}
