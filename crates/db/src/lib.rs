pub mod connection;
pub mod ingestion;
pub mod migrations;
pub mod repositories;
pub mod seeder;
pub mod service;

pub use connection::{connect_with_settings, DbPool};
pub use ingestion::{IngestionFailure, IngestionPipeline, IngestionSummary};
pub use repositories::{
    CandidateRepository, ConfigRepository, MarketRepository, RepositoryError,
    SqlCandidateRepository, SqlConfigRepository, SqlMarketRepository,
};
pub use seeder::{DefaultConfigSeeder, SeedReport};
pub use service::{CandidateService, CandidateServiceError, DEFAULT_PAGE_LIMIT};
