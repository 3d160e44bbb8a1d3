pub mod defaults;
pub mod engine;
pub mod snapshot;

use crate::domain::candidate::Candidate;
use crate::domain::result::CalculationResult;

pub use engine::{evaluate_candidate, risk_factor, RAMP_FACTOR};
pub use snapshot::{ChannelTerms, ConfigSnapshot, LayerWeights, ScoringSettings};

pub trait ScoringEngine: Send + Sync {
    fn evaluate(&self, candidate: &Candidate, config: &ConfigSnapshot) -> CalculationResult;

    fn evaluate_all(
        &self,
        candidates: &[Candidate],
        config: &ConfigSnapshot,
    ) -> Vec<CalculationResult> {
        candidates.iter().map(|candidate| self.evaluate(candidate, config)).collect()
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DeterministicScoringEngine;

impl ScoringEngine for DeterministicScoringEngine {
    fn evaluate(&self, candidate: &Candidate, config: &ConfigSnapshot) -> CalculationResult {
        evaluate_candidate(candidate, config)
    }
}
