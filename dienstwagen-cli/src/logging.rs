use std::fs::File;
use std::io::{self, IsTerminal};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::Local;
use tracing::{Event, Subscriber};
use tracing_subscriber::{
    EnvFilter,
    fmt::{
        self, FmtContext,
        format::{FormatEvent, FormatFields, Writer},
    },
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
};

use crate::settings::RuntimeConfig;

/// Plain record format for log files: local timestamp, level, source
/// location, then the fields.
struct FileFmt;

impl<S, N> FormatEvent<S, N> for FileFmt
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        write!(
            writer,
            "{} {:>5} ",
            Local::now().format("%Y-%m-%dT%H:%M:%S%.6f%:z"),
            meta.level()
        )?;

        if let (Some(file), Some(line)) = (meta.file(), meta.line()) {
            let file = file.strip_prefix("src/").unwrap_or(file);
            write!(writer, "{file}:{line} ")?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// The global filter.
///
/// * `verbose` forces `debug`.
/// * Otherwise `RUST_LOG` wins when set.
/// * Otherwise `level` applies.
pub fn build_filter(
    level: &str,
    verbose: bool,
) -> Result<EnvFilter> {
    if verbose {
        return Ok(EnvFilter::new("debug"));
    }
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level).with_context(|| format!("invalid log level '{level}'"))
}

/// Opens `path` for appending, creating it if needed.
pub fn open_log_file(path: &Path) -> Result<File> {
    File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open log file '{}'", path.display()))
}

/// Installs the global subscriber. Call once at startup.
///
/// Console records go to stderr so command output on stdout stays clean;
/// they carry no timestamp or target. With a log file configured, the same
/// records are appended there without ANSI colours.
pub fn init(config: &RuntimeConfig) -> Result<()> {
    let filter = build_filter(&config.log_level, config.verbose)?;

    let console_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .without_time()
        .with_target(false);

    let file_layer = match &config.log_file {
        Some(path) => Some(
            fmt::layer()
                .event_format(FileFmt)
                .with_ansi(false)
                .with_writer(Mutex::new(open_log_file(path)?)),
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("logging already initialised")
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn verbose_forces_debug() {
        let filter = build_filter("warn", true).unwrap();

        assert_eq!(filter.to_string(), "debug");
    }

    #[test]
    fn log_file_is_appended() {
        let path = std::env::temp_dir().join(format!("dienstwagen-{}.log", uuid::Uuid::new_v4()));

        writeln!(open_log_file(&path).unwrap(), "first").unwrap();
        writeln!(open_log_file(&path).unwrap(), "second").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(content, "first\nsecond\n");
    }

    #[test]
    fn unopenable_log_file_is_reported() {
        let path = std::env::temp_dir()
            .join("dienstwagen-missing-dir")
            .join("x.log");

        let err = open_log_file(&path).unwrap_err();

        assert!(err.to_string().contains("cannot open log file"));
    }
}
