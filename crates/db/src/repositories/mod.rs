use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite};
use thiserror::Error;

use launchdesk_core::domain::candidate::SkuId;
use launchdesk_core::domain::channel::{ChannelConfig, ChannelConfigUpdate, MarketChannelCts};
use launchdesk_core::domain::market::Market;
use launchdesk_core::domain::result::ScoredCandidate;
use launchdesk_core::domain::settings::GlobalSetting;
use launchdesk_core::errors::ApplicationError;
use launchdesk_core::scoring::ConfigSnapshot;

pub mod candidate;
pub mod config;
pub mod market;

pub use candidate::SqlCandidateRepository;
pub use config::SqlConfigRepository;
pub use market::SqlMarketRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("{0} not found")]
    NotFound(String),
}

impl From<RepositoryError> for ApplicationError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound(what) => ApplicationError::NotFound(what),
            other => ApplicationError::Persistence(other.to_string()),
        }
    }
}

pub(crate) fn column<'r, T>(row: &'r SqliteRow, name: &str) -> Result<T, RepositoryError>
where
    T: sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite>,
{
    row.try_get(name).map_err(|error| RepositoryError::Decode(format!("{name}: {error}")))
}

#[async_trait]
pub trait CandidateRepository: Send + Sync {
    async fn list(&self, skip: u32, limit: u32) -> Result<Vec<ScoredCandidate>, RepositoryError>;
    async fn find_by_id(&self, sku_id: &SkuId) -> Result<Option<ScoredCandidate>, RepositoryError>;
    async fn count(&self) -> Result<u64, RepositoryError>;
}

#[async_trait]
pub trait ConfigRepository: Send + Sync {
    async fn list_settings(&self) -> Result<Vec<GlobalSetting>, RepositoryError>;
    async fn upsert_settings(&self, settings: &[GlobalSetting]) -> Result<(), RepositoryError>;

    async fn list_channels(&self) -> Result<Vec<ChannelConfig>, RepositoryError>;
    async fn update_channel(
        &self,
        channel_name: &str,
        update: ChannelConfigUpdate,
    ) -> Result<ChannelConfig, RepositoryError>;

    async fn list_cts(&self) -> Result<Vec<MarketChannelCts>, RepositoryError>;
    async fn update_cts_total(
        &self,
        market_name: &str,
        channel_name: &str,
        total_cts_pct: f64,
    ) -> Result<MarketChannelCts, RepositoryError>;

    async fn load_snapshot(&self) -> Result<ConfigSnapshot, RepositoryError>;
}

#[async_trait]
pub trait MarketRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Market>, RepositoryError>;
    /// Returns false when the market already existed.
    async fn create(&self, market: &Market) -> Result<bool, RepositoryError>;
}
