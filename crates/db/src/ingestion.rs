use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use launchdesk_core::errors::ApplicationError;
use launchdesk_core::ingest::{parse_upload, IngestError, IngestOptions, ParsedUpload};
use launchdesk_core::scoring::{DeterministicScoringEngine, ScoringEngine};

use crate::repositories::candidate::{delete_all, insert_candidate, replace_result};
use crate::repositories::config::load_snapshot_with;
use crate::repositories::RepositoryError;
use crate::seeder::DefaultConfigSeeder;
use crate::DbPool;

#[derive(Debug, Error)]
pub enum IngestionFailure {
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<IngestionFailure> for ApplicationError {
    fn from(failure: IngestionFailure) -> Self {
        match failure {
            IngestionFailure::Ingest(error) => ApplicationError::Ingestion(error),
            IngestionFailure::Repository(error) => error.into(),
        }
    }
}

/// Counts reported back to the uploader.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IngestionSummary {
    pub settings_row_count: usize,
    pub channel_row_count: usize,
    pub cts_row_count: usize,
    pub candidate_row_count: usize,
    pub skipped_row_count: usize,
}

/// Replaces the candidate set with the contents of one workbook and scores
/// every new candidate against the configuration committed alongside it.
///
/// Runs are serialized: a second upload waits until the first has committed
/// or rolled back.
pub struct IngestionPipeline {
    pool: DbPool,
    engine: Arc<dyn ScoringEngine>,
    seed_on_ingest: bool,
    writer: Mutex<()>,
}

impl IngestionPipeline {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            engine: Arc::new(DeterministicScoringEngine),
            seed_on_ingest: true,
            writer: Mutex::new(()),
        }
    }

    pub fn with_engine(mut self, engine: Arc<dyn ScoringEngine>) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_seed_on_ingest(mut self, seed_on_ingest: bool) -> Self {
        self.seed_on_ingest = seed_on_ingest;
        self
    }

    pub async fn ingest(
        &self,
        bytes: &[u8],
        options: &IngestOptions,
    ) -> Result<IngestionSummary, IngestionFailure> {
        let run_id = Uuid::new_v4();
        info!(
            event_name = "ingest.pipeline.started",
            correlation_id = %run_id,
            bytes = bytes.len(),
            default_market = options.default_market.as_deref().unwrap_or(""),
            "starting ingestion"
        );

        let parsed = match parse_upload(bytes, options) {
            Ok(parsed) => parsed,
            Err(error) => {
                warn!(
                    event_name = "ingest.pipeline.failed",
                    correlation_id = %run_id,
                    stage = "parse",
                    error = %error,
                    "ingestion aborted"
                );
                return Err(error.into());
            }
        };

        match self.replace_all(run_id, parsed).await {
            Ok(summary) => Ok(summary),
            Err(error) => {
                warn!(
                    event_name = "ingest.pipeline.failed",
                    correlation_id = %run_id,
                    stage = "persist",
                    error = %error,
                    "ingestion rolled back"
                );
                Err(error)
            }
        }
    }

    async fn replace_all(
        &self,
        run_id: Uuid,
        parsed: ParsedUpload,
    ) -> Result<IngestionSummary, IngestionFailure> {
        let _writer = self.writer.lock().await;
        let now = Utc::now().to_rfc3339();

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        if self.seed_on_ingest {
            DefaultConfigSeeder::seed_with(&mut tx).await?;
        }

        let removed = delete_all(&mut tx).await?;
        for candidate in &parsed.candidates {
            insert_candidate(&mut tx, candidate, &now).await?;
        }

        let snapshot = load_snapshot_with(&mut tx).await?;
        let results = self.engine.evaluate_all(&parsed.candidates, &snapshot);
        for result in &results {
            replace_result(&mut tx, result, &now).await?;
        }

        tx.commit().await.map_err(RepositoryError::from)?;

        let summary = IngestionSummary {
            settings_row_count: parsed.settings_rows,
            channel_row_count: parsed.channel_rows,
            cts_row_count: parsed.cts_rows,
            candidate_row_count: parsed.candidates.len(),
            skipped_row_count: parsed.skipped_rows,
        };
        info!(
            event_name = "ingest.pipeline.completed",
            correlation_id = %run_id,
            sheet = %parsed.sheet_name,
            header_row = parsed.header_row,
            removed_rows = removed,
            configured_channels = snapshot.channel_count(),
            candidate_rows = summary.candidate_row_count,
            skipped_rows = summary.skipped_row_count,
            evaluated_rows = results.iter().filter(|result| result.is_evaluated()).count(),
            "ingestion committed"
        );
        Ok(summary)
    }
}
