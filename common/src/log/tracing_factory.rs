use std::sync::Once;

use tracing_subscriber::fmt::writer::MakeWriterExt;

use crate::config::LoggerConfig;

static INIT: Once = Once::new();

/// Installs the process-wide `tracing` subscriber from a [`LoggerConfig`].
///
/// Idempotent: subsequent calls are no-ops, mirroring this codebase's
/// existing logging factories which guard against re-initializing the
/// global subscriber.
pub struct TracingFactory;

impl TracingFactory {
    pub fn init(config: &LoggerConfig) {
        let level: tracing::Level = config.level.into();

        INIT.call_once(|| {
            let format = tracing_subscriber::fmt::format()
                .with_file(true)
                .with_line_number(true)
                .with_target(false)
                .compact();

            match &config.file {
                None => {
                    let _ = tracing_subscriber::fmt()
                        .with_max_level(level)
                        .event_format(format)
                        .try_init();
                }
                Some(dir) => {
                    let file_appender = tracing_appender::rolling::daily(dir, "ingest.log");
                    let writer = file_appender.and(std::io::stdout);

                    let _ = tracing_subscriber::fmt()
                        .with_max_level(level)
                        .event_format(format)
                        .with_writer(writer)
                        .try_init();
                }
            }
        });
    }
}
