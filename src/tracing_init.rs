use std::fmt::{self, Write as _};
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::Context;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{Error, Logger, Result, Severity};

/// Target prefix of this crate's own diagnostics.
const CRATE_TARGET: &str = env!("CARGO_CRATE_NAME");

/// Most verbose level of this crate's diagnostics printed on stderr.
const DIAGNOSTICS_LEVEL: Level = Level::INFO;

fn is_own_diagnostic(target: &str) -> bool {
    target == CRATE_TARGET || target.starts_with(&format!("{}::", CRATE_TARGET))
}

/// A `tracing` layer that forwards events into a [`Logger`].
///
/// Events emitted by this crate itself are skipped, so the logger's own
/// diagnostics never loop back into it.
pub struct SeverityLayer {
    logger: Arc<Logger>,
}

impl SeverityLayer {
    pub fn new(logger: Arc<Logger>) -> Self {
        Self { logger }
    }
}

impl<S: Subscriber> Layer<S> for SeverityLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if is_own_diagnostic(metadata.target()) {
            return;
        }

        let severity = Severity::from(*metadata.level());
        if !self.logger.is_displayed(severity) {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.logger.log(severity, visitor.finish());
    }
}

/// Collects the `message` field followed by the remaining fields as
/// `key=value` pairs.
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn finish(self) -> String {
        match (self.message.is_empty(), self.fields.is_empty()) {
            (_, true) => self.message,
            (true, false) => self.fields,
            (false, false) => format!("{} {}", self.message, self.fields),
        }
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            self.record_debug(field, &value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
            return;
        }
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        let _ = write!(self.fields, "{}={:?}", field.name(), value);
    }
}

/// Route application `tracing` events into `logger` and print this crate's
/// own diagnostics on stderr.
///
/// Forwarded events are filtered by `RUST_LOG` when set, otherwise by the
/// tracing level matching the logger's threshold.
pub fn init_tracing(logger: Arc<Logger>) -> Result<()> {
    let log_spec = effective_log_spec(logger.severity());
    layered(logger, &log_spec, std::io::stderr)?
        .try_init()
        .map_err(|e| Error::Init(e.to_string()))?;

    Ok(())
}

/// Build the subscriber installed by [`init_tracing`], with the crate's own
/// diagnostics going to `diagnostics`.
pub(crate) fn layered<W>(
    logger: Arc<Logger>,
    log_spec: &str,
    diagnostics: W,
) -> Result<impl Subscriber + Send + Sync + 'static>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let env_filter = EnvFilter::try_new(log_spec).map_err(|e| Error::Init(e.to_string()))?;

    let forward = SeverityLayer::new(logger).with_filter(env_filter);

    let diagnostics = tracing_subscriber::fmt::layer()
        .with_writer(diagnostics)
        .with_target(false)
        .with_filter(filter_fn(|metadata| {
            is_own_diagnostic(metadata.target()) && *metadata.level() <= DIAGNOSTICS_LEVEL
        }));

    Ok(tracing_subscriber::registry().with(forward).with(diagnostics))
}

/// Tracing level whose events can still pass `threshold`.
fn level_for(threshold: Severity) -> &'static str {
    match threshold {
        Severity::Crit | Severity::High => "error",
        Severity::Med => "warn",
        Severity::Low | Severity::Info => "info",
        Severity::Debug => "trace",
    }
}

/// Determine the effective filter specification, considering `RUST_LOG`.
fn effective_log_spec(threshold: Severity) -> String {
    // RUST_LOG takes precedence over the logger threshold
    if let Ok(rust_log) = std::env::var("RUST_LOG")
        && !rust_log.is_empty()
    {
        return rust_log;
    }
    level_for(threshold).to_string()
}
