use core::fmt;
use std::fs::OpenOptions;
use std::sync::Once;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::fmt::format::{self, FormatEvent, FormatFields};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, fmt as tracingfmt};

struct AlignedFormatter;

/// Visitor to extract the `trx` field value, naming the transceiver that logged
struct TrxVisitor {
    trx: Option<String>,
}

impl tracing::field::Visit for TrxVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        if field.name() == "trx" {
            self.trx = Some(format!("{:?}", value));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "trx" {
            self.trx = Some(value.to_string());
        }
    }
}

impl<S, N> FormatEvent<S, N> for AlignedFormatter
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();

        let mut visitor = TrxVisitor { trx: None };
        event.record(&mut visitor);
        let has_trx = visitor.trx.is_some();
        let trx_str = visitor.trx.unwrap_or_default();

        let (color_level, color_reset) = if writer.has_ansi_escapes() {
            match *metadata.level() {
                tracing::Level::ERROR => ("\x1b[31m", "\x1b[0m"),
                tracing::Level::WARN => ("\x1b[33m", "\x1b[0m"),
                tracing::Level::INFO => ("\x1b[32m", "\x1b[0m"),
                tracing::Level::DEBUG => ("\x1b[34m", "\x1b[0m"),
                tracing::Level::TRACE => ("\x1b[35m", "\x1b[0m"),
            }
        } else {
            ("", "")
        };

        // "crates/trx-entities/src/trx/transceiver.rs" becomes "[entities/trx] transceiver.rs"
        let file_path = metadata.file().unwrap_or("unknown");
        let formatted_path = if let Some(src_idx) = file_path.find("/src/") {
            let before_src = &file_path[..src_idx];
            let after_src = &file_path[src_idx + 5..];

            let crate_name = if let Some(trx_idx) = before_src.rfind("trx-") {
                &before_src[trx_idx + 4..]
            } else {
                before_src.rsplit('/').next().unwrap_or("unknown")
            };

            if let Some(last_slash) = after_src.rfind('/') {
                let module_path = &after_src[..last_slash];
                let filename = &after_src[last_slash + 1..];
                let first_module = module_path.split('/').next().unwrap_or("");
                format!("{:<8} [{}/{}] {}", trx_str, crate_name, first_module, filename)
            } else {
                format!("{:<8} [{}] {}", trx_str, crate_name, after_src)
            }
        } else {
            file_path.to_string()
        };

        // Format: "LEVEL trx [module] file:line: message"
        let location = format!(
            "{}{:<5}{} {}:{}:",
            color_level,
            metadata.level(),
            color_reset,
            formatted_path,
            metadata.line().unwrap_or(0)
        );

        let mut message_buf = String::new();
        let message_writer = format::Writer::new(&mut message_buf);
        ctx.field_format().format_fields(message_writer, event)?;

        // The trx field is already part of the prefix
        if has_trx {
            if let Some(trx_idx) = message_buf.find("trx=") {
                if let Some(space_idx) = message_buf[trx_idx..].find(' ') {
                    message_buf.replace_range(trx_idx..trx_idx + space_idx + 1, "");
                } else {
                    message_buf.truncate(trx_idx);
                }
            }
        }

        let mut padding = 64;
        if message_buf.starts_with("->") || message_buf.starts_with("<-") {
            padding -= 3;
        }

        write!(writer, "{:<width$} {}", location, message_buf.trim_end(), width = padding)?;
        writeln!(writer)
    }
}

static INIT_LOG: Once = Once::new();

/// Sets up logging with maximum verbosity (trace level)
/// Mainly for unit tests
pub fn setup_logging_verbose() {
    setup_logging(EnvFilter::new("trace"), None);
}

/// Sets up default logging to stdout and optionally, a verbose log file
/// Returns a guard, that needs to be kept alive for logging to file to work
pub fn setup_logging_default(verbose_logfile: Option<String>) -> Option<WorkerGuard> {
    let stdout_filter = get_default_stdout_filter();
    let logfile_and_filter = verbose_logfile.map(|file| (file, get_default_logfile_filter()));
    setup_logging(stdout_filter, logfile_and_filter)
}

pub fn get_default_stdout_filter() -> EnvFilter {
    // RUST_LOG takes precedence over the built-in defaults
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    EnvFilter::new(
        [
            "info",
            // Per-tick activity is only interesting when debugging the scheduler
            "trx_entities::clock=info",
            "trx_entities::trx::tx_queue=info",
            // Bursts going back and forth
            "trx_entities::fwd=info",
            "trx_entities::network=info",
            // Control plane
            "trx_entities::ctrl=debug",
            "trx_entities::trx::transceiver=debug",
        ]
        .join(","),
    )
}

fn get_default_logfile_filter() -> EnvFilter {
    EnvFilter::new("debug")
}

/// Sets up logging to stdout and optionally, a verbose log file
/// If an output file is requested and could be opened, returns Some<WorkerGuard>. Keep this
/// value alive or logging to file may cease working.
fn setup_logging(stdout_filter: EnvFilter, outfile: Option<(String, EnvFilter)>) -> Option<WorkerGuard> {
    let file = outfile.and_then(|(path, filter)| {
        match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => Some((file, filter)),
            Err(e) => {
                eprintln!("Failed to open log file {}: {}", path, e);
                None
            }
        }
    });

    if let Some((file, outfile_filter)) = file {
        let (file_writer, guard) = tracing_appender::non_blocking(file);

        INIT_LOG.call_once(|| {
            let file_layer = tracingfmt::layer()
                .event_format(AlignedFormatter)
                .with_writer(file_writer)
                .with_ansi(false);

            let stdout_layer = tracingfmt::layer().event_format(AlignedFormatter);

            tracing_subscriber::registry()
                .with(file_layer.with_filter(outfile_filter))
                .with(stdout_layer.with_filter(stdout_filter))
                .init();
        });

        Some(guard)
    } else {
        INIT_LOG.call_once(|| {
            let stdout_layer = tracingfmt::layer().event_format(AlignedFormatter);

            tracing_subscriber::registry()
                .with(stdout_layer.with_filter(stdout_filter))
                .init();
        });
        None
    }
}
