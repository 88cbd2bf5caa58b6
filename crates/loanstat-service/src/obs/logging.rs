//! Log record formatting and subscriber setup.
//!
//! Every `tracing` event is rendered as exactly one line, either as a JSON
//! object with the fields `level`, `message`, `timestamp`, `path`, `method`
//! or as a plain text line. Request metadata arrives as explicit `path` /
//! `method` event fields (see [`log`]); events without them render `null`.
//! Any other event fields are folded into the message as `key=value`.
//!
//! The format and minimum level are chosen once at startup.

use std::fmt;
use std::fmt::Write as _;

use chrono::Utc;
use serde::Serialize;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use loanstat_core::error::{LoanstatError, Result};

use crate::context::RequestContext;

/// UTC, second precision.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable single line.
    Plain,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            LogFormat::Json
        } else {
            LogFormat::Plain
        }
    }
}

/// A single rendered log record. Built per event and dropped after writing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEvent {
    pub level: String,
    pub message: String,
    pub timestamp: String,
    pub path: Option<String>,
    pub method: Option<String>,
}

impl LogEvent {
    fn write_json(&self, w: &mut Writer<'_>) -> fmt::Result {
        let line = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        writeln!(w, "{line}")
    }

    fn write_plain(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{} {} {}", self.timestamp, self.level, self.message)?;
        if let (Some(method), Some(path)) = (&self.method, &self.path) {
            write!(w, " method={method} path={path}")?;
        }
        writeln!(w)
    }
}

/// Record level name. `WARN` is spelled out as `WARNING`.
pub fn level_name(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "ERROR",
        Level::WARN => "WARNING",
        Level::INFO => "INFO",
        Level::DEBUG => "DEBUG",
        _ => "TRACE",
    }
}

pub fn timestamp_now() -> String {
    Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

#[derive(Default)]
struct EventVisitor {
    message: Option<String>,
    path: Option<String>,
    method: Option<String>,
    extra: Vec<(&'static str, String)>,
}

impl EventVisitor {
    fn put(&mut self, field: &Field, value: String) {
        match field.name() {
            "message" => self.message = Some(value),
            "path" => self.path = Some(value),
            "method" => self.method = Some(value),
            name => self.extra.push((name, value)),
        }
    }

    fn into_event(self, level: &Level) -> LogEvent {
        let mut message = self.message.unwrap_or_default();
        for (k, v) in self.extra {
            if !message.is_empty() {
                message.push(' ');
            }
            message.push_str(k);
            message.push('=');
            message.push_str(&v);
        }
        LogEvent {
            level: level_name(level).to_string(),
            message,
            timestamp: timestamp_now(),
            path: self.path,
            method: self.method,
        }
    }
}

impl Visit for EventVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.put(field, format!("{value:?}"));
    }
}

/// Event formatter for the fmt layer. Spans are ignored; request metadata
/// travels on the event itself.
#[derive(Debug, Clone, Copy)]
pub struct RecordFormat {
    format: LogFormat,
}

impl RecordFormat {
    pub fn new(format: LogFormat) -> Self {
        Self { format }
    }
}

impl<S, N> FormatEvent<S, N> for RecordFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(&self, _ctx: &FmtContext<'_, S, N>, mut writer: Writer<'_>, event: &Event<'_>) -> fmt::Result {
        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);
        let record = visitor.into_event(event.metadata().level());
        match self.format {
            LogFormat::Json => record.write_json(&mut writer),
            LogFormat::Plain => record.write_plain(&mut writer),
        }
    }
}

/// Build a subscriber writing to `writer`. Used by [`init`] with stdout and by
/// tests with an in-memory buffer.
pub fn subscriber<W>(format: LogFormat, filter: EnvFilter, writer: W) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::registry().with(filter).with(
        tracing_subscriber::fmt::layer()
            .event_format(RecordFormat::new(format))
            .with_writer(writer),
    )
}

/// Install the process-wide subscriber. `RUST_LOG` wins over `level` when set.
pub fn init(format: LogFormat, level: Level) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));
    subscriber(format, filter, std::io::stdout)
        .try_init()
        .map_err(|e| LoanstatError::Internal(format!("logging init failed: {e}")))
}

/// Emit one log record, tagged with the request's path and method when a
/// context is given.
pub fn log(ctx: Option<&RequestContext>, level: Level, message: &str) {
    let path = ctx.map(RequestContext::path);
    let method = ctx.map(RequestContext::method);
    match level {
        Level::ERROR => tracing::error!(path, method, "{message}"),
        Level::WARN => tracing::warn!(path, method, "{message}"),
        Level::INFO => tracing::info!(path, method, "{message}"),
        Level::DEBUG => tracing::debug!(path, method, "{message}"),
        _ => tracing::trace!(path, method, "{message}"),
    }
}
