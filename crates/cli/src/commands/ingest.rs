use std::fs;
use std::path::Path;

use launchdesk_core::ingest::{ColumnMapping, IngestOptions};
use launchdesk_db::{IngestionFailure, IngestionPipeline, IngestionSummary};

use crate::commands::{
    build_runtime, load_config, open_database, CommandResult, Failure, EXIT_DATABASE, EXIT_INPUT,
};

pub fn run(file: &Path, mapping: Option<&str>, default_market: Option<String>) -> CommandResult {
    let config = match load_config("ingest") {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let bytes = match fs::read(file) {
        Ok(bytes) => bytes,
        Err(error) => {
            return CommandResult::failure(
                "ingest",
                "input",
                format!("could not read `{}`: {error}", file.display()),
                EXIT_INPUT,
            );
        }
    };
    let mapping = match ColumnMapping::from_json(mapping.unwrap_or_default()) {
        Ok(mapping) => mapping,
        Err(error) => {
            return CommandResult::failure("ingest", "input", error.to_string(), EXIT_INPUT);
        }
    };
    let options = IngestOptions { mapping, default_market };

    let runtime = match build_runtime("ingest") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = open_database(&config).await?;
        let pipeline = IngestionPipeline::new(pool.clone())
            .with_seed_on_ingest(config.ingest.seed_on_ingest);
        let summary = pipeline.ingest(&bytes, &options).await.map_err(classify);
        pool.close().await;
        Ok::<IngestionSummary, Failure>(summary?)
    });

    match result {
        Ok(summary) => CommandResult::success("ingest", describe(&summary)),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("ingest", error_class, message, exit_code)
        }
    }
}

fn classify(failure: IngestionFailure) -> Failure {
    match failure {
        IngestionFailure::Ingest(error) => ("ingestion", error.to_string(), EXIT_INPUT),
        IngestionFailure::Repository(error) => ("db_persistence", error.to_string(), EXIT_DATABASE),
    }
}

fn describe(summary: &IngestionSummary) -> String {
    format!(
        "ingested {} candidates ({} rows skipped); auxiliary rows: {} settings, {} channels, {} cost-to-serve",
        summary.candidate_row_count,
        summary.skipped_row_count,
        summary.settings_row_count,
        summary.channel_row_count,
        summary.cts_row_count
    )
}
