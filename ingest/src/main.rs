mod cli;
mod driver;
mod source;

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use binlog::reader_context::ReaderContext;
use common::config::IngestConfig;
use common::err::{IngestError, IngestResult};
use common::log::tracing_factory::TracingFactory;
use storage::{ReplicationMode, Storage};

use cli::CliArgs;
use driver::Driver;
use source::FileEventSource;

fn main() -> ExitCode {
    let args = CliArgs::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Logging may not be installed yet if config resolution itself
            // failed, so the error is always also printed to stderr.
            error!(%err, "ingestion aborted");
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &CliArgs) -> IngestResult<()> {
    let config = args.resolve()?;
    TracingFactory::init(&config.logger);
    info!(storage_uri = %config.storage.uri, "starting binlog ingestion");

    let replication_mode =
        if config.replication.gtid_mode { ReplicationMode::Gtid } else { ReplicationMode::Position };
    let storage = Storage::open(&config.storage, replication_mode)?;
    info!(description = %storage.description(), "opened storage");

    let context = ReaderContext::new(config.replication.gtid_mode, true);

    let replay_path = args.replay_file.as_ref().ok_or_else(|| {
        IngestError::configuration(
            "no live MySQL transport is implemented in this build -- pass --replay-file to re-ingest a captured event stream",
        )
    })?;
    let source = FileEventSource::open(replay_path)?;

    let mut driver = Driver::new(source, context, storage);
    driver.run()?;

    info!("ingestion finished cleanly");
    Ok(())
}
