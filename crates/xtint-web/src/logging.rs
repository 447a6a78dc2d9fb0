#![forbid(unsafe_code)]

//! `tracing` layer that forwards events to the browser console.
//!
//! The layer itself is host-agnostic: it formats each event into one line
//! and hands it to a sink together with the console method matching the
//! event's level. The wasm entry point supplies a sink that calls
//! `console.error` / `console.warn` / ...; tests supply a collector.

use std::fmt::{self, Write as _};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Metadata, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};

/// Console method an event is written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleMethod {
    Error,
    Warn,
    Info,
    Debug,
}

impl ConsoleMethod {
    /// Trace and debug share `console.debug`.
    #[must_use]
    pub fn for_level(level: Level) -> Self {
        match level {
            Level::ERROR => Self::Error,
            Level::WARN => Self::Warn,
            Level::INFO => Self::Info,
            _ => Self::Debug,
        }
    }

    /// Property name on the `console` object.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}

#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl LineVisitor {
    fn push_field(&mut self, name: &str, value: fmt::Arguments<'_>) {
        let _ = write!(self.fields, " {name}={value}");
    }
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            self.push_field(field.name(), format_args!("{value}"));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            self.push_field(field.name(), format_args!("{value:?}"));
        }
    }
}

/// Render an event as `target: message key=value ...`.
fn format_event(event: &Event<'_>) -> String {
    let mut visitor = LineVisitor::default();
    event.record(&mut visitor);
    format!(
        "{}: {}{}",
        event.metadata().target(),
        visitor.message,
        visitor.fields
    )
}

/// Forwards events at or above `max_level` severity to `sink`.
pub struct ConsoleLayer<F> {
    max_level: Level,
    sink: F,
}

impl<F> ConsoleLayer<F>
where
    F: Fn(ConsoleMethod, &str) + 'static,
{
    pub fn new(max_level: Level, sink: F) -> Self {
        Self { max_level, sink }
    }
}

impl<S, F> Layer<S> for ConsoleLayer<F>
where
    S: Subscriber,
    F: Fn(ConsoleMethod, &str) + 'static,
{
    fn enabled(&self, metadata: &Metadata<'_>, _ctx: Context<'_, S>) -> bool {
        *metadata.level() <= self.max_level
    }

    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let method = ConsoleMethod::for_level(*event.metadata().level());
        (self.sink)(method, &format_event(event));
    }
}

/// Install a registry with a [`ConsoleLayer`] as the global default.
///
/// Returns `false` if a global subscriber was already set.
pub fn init<F>(max_level: Level, sink: F) -> bool
where
    F: Fn(ConsoleMethod, &str) + Send + Sync + 'static,
{
    let subscriber = tracing_subscriber::registry().with(ConsoleLayer::new(max_level, sink));
    tracing::subscriber::set_global_default(subscriber).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    type Lines = Arc<Mutex<Vec<(ConsoleMethod, String)>>>;

    fn capture(max_level: Level) -> (impl Subscriber + Send + Sync, Lines) {
        let lines: Lines = Arc::default();
        let sink = {
            let lines = Arc::clone(&lines);
            move |method: ConsoleMethod, line: &str| {
                lines.lock().unwrap().push((method, line.to_owned()));
            }
        };
        let subscriber = tracing_subscriber::registry().with(ConsoleLayer::new(max_level, sink));
        (subscriber, lines)
    }

    #[test]
    fn levels_map_to_console_methods() {
        assert_eq!(ConsoleMethod::for_level(Level::ERROR).name(), "error");
        assert_eq!(ConsoleMethod::for_level(Level::WARN).name(), "warn");
        assert_eq!(ConsoleMethod::for_level(Level::INFO).name(), "info");
        assert_eq!(ConsoleMethod::for_level(Level::DEBUG), ConsoleMethod::Debug);
        assert_eq!(ConsoleMethod::for_level(Level::TRACE), ConsoleMethod::Debug);
    }

    #[test]
    fn events_are_formatted_with_target_and_fields() {
        let (subscriber, lines) = capture(Level::INFO);
        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(target: "xtint.pass", failed = 2, reason = "readonly", "border override rejected");
        });
        assert_eq!(
            lines.lock().unwrap().as_slice(),
            &[(
                ConsoleMethod::Warn,
                "xtint.pass: border override rejected failed=2 reason=readonly".to_owned()
            )]
        );
    }

    #[test]
    fn events_above_max_level_are_dropped() {
        let (subscriber, lines) = capture(Level::WARN);
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "xtint.controller", "themer active");
            tracing::debug!(target: "xtint.scheduler", "frame requested");
            tracing::error!(target: "xtint.settings", "could not save theme values");
        });
        let lines = lines.lock().unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].0, ConsoleMethod::Error);
    }
}
