pub mod baseline;
pub mod config;
pub mod domain;
pub mod errors;
pub mod ingest;
pub mod scoring;

pub use domain::candidate::{Candidate, CandidateUpdate, SkuId};
pub use domain::channel::{ChannelConfig, ChannelConfigUpdate, CtsComponents, MarketChannelCts};
pub use domain::market::Market;
pub use domain::result::{CalculationResult, Recommendation, ScoredCandidate};
pub use domain::settings::GlobalSetting;
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use ingest::{extract_headers, parse_upload, IngestError, IngestOptions, ParsedUpload};
pub use scoring::{ConfigSnapshot, DeterministicScoringEngine, ScoringEngine};
