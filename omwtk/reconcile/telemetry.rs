use std::{fmt, path::PathBuf, sync::Arc};

use anyhow::Result;
use serde_json::Value;
use shared_logging::{JsonLogger, LogLevel, LogRecord, LogSink, MemoryLogger};

/// Builder configuring telemetry for reconciliation runs.
pub struct ReconcileTelemetryBuilder {
    module: String,
    log_path: Option<PathBuf>,
    sink: Option<Arc<dyn LogSink>>,
    min_level: LogLevel,
}

impl ReconcileTelemetryBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            log_path: None,
            sink: None,
            min_level: LogLevel::Debug,
        }
    }

    /// Appends JSON lines to `path`.
    #[must_use]
    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// Uses an already constructed sink; takes precedence over `log_path`.
    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Drops records below `level`.
    #[must_use]
    pub const fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Finalizes the builder.
    pub fn build(self) -> Result<ReconcileTelemetry> {
        let sink = match (self.sink, self.log_path) {
            (Some(sink), _) => Some(sink),
            (None, Some(path)) => Some(Arc::new(JsonLogger::new(path)?) as Arc<dyn LogSink>),
            (None, None) => None,
        };
        Ok(ReconcileTelemetry {
            inner: Arc::new(TelemetryInner {
                module: self.module,
                sink,
                min_level: self.min_level,
            }),
        })
    }
}

/// Telemetry handle shared by the classifier and batch comparator.
#[derive(Clone)]
pub struct ReconcileTelemetry {
    inner: Arc<TelemetryInner>,
}

impl fmt::Debug for ReconcileTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReconcileTelemetry")
            .field("module", &self.inner.module)
            .field("min_level", &self.inner.min_level)
            .finish_non_exhaustive()
    }
}

struct TelemetryInner {
    module: String,
    sink: Option<Arc<dyn LogSink>>,
    min_level: LogLevel,
}

impl ReconcileTelemetry {
    /// Returns a builder for this telemetry helper.
    #[must_use]
    pub fn builder(module: impl Into<String>) -> ReconcileTelemetryBuilder {
        ReconcileTelemetryBuilder::new(module)
    }

    /// Telemetry buffering into memory, with the buffer for inspection.
    #[must_use]
    pub fn in_memory(module: impl Into<String>) -> (Self, Arc<MemoryLogger>) {
        let logger = Arc::new(MemoryLogger::new());
        let telemetry = Self {
            inner: Arc::new(TelemetryInner {
                module: module.into(),
                sink: Some(Arc::clone(&logger) as Arc<dyn LogSink>),
                min_level: LogLevel::Debug,
            }),
        };
        (telemetry, logger)
    }

    /// Logs a structured record.
    pub fn log(&self, level: LogLevel, message: &str, metadata: Value) -> Result<()> {
        if level < self.inner.min_level {
            return Ok(());
        }
        if let Some(sink) = &self.inner.sink {
            let record = LogRecord::new(&self.inner.module, level, message).with_fields(metadata);
            sink.log(&record)?;
        }
        Ok(())
    }
}
