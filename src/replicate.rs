//! Independent repeated runs of one scenario.

use std::sync::Arc;

use rand::SeedableRng;
use rayon::prelude::*;
use serde::Serialize;

use crate::engine::{EngineError, RunParameters, SimulationEngine, SimulationOutcome};
use crate::rng::{derive_seed, RunRng};
use crate::species::SpeciesProfile;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplicateSummary {
    pub runs: usize,
    pub mean_final_population: f64,
    pub min_final_population: u64,
    pub max_final_population: u64,
    pub mean_growth_rate: f64,
}

impl ReplicateSummary {
    pub fn from_outcomes(outcomes: &[SimulationOutcome]) -> Self {
        let runs = outcomes.len();
        if runs == 0 {
            return Self {
                runs,
                mean_final_population: 0.0,
                min_final_population: 0,
                max_final_population: 0,
                mean_growth_rate: 0.0,
            };
        }
        let finals: Vec<u64> = outcomes.iter().map(|o| o.final_population()).collect();
        Self {
            runs,
            mean_final_population: finals.iter().sum::<u64>() as f64 / runs as f64,
            min_final_population: finals.iter().copied().min().unwrap_or(0),
            max_final_population: finals.iter().copied().max().unwrap_or(0),
            mean_growth_rate: outcomes.iter().map(|o| o.average_growth_rate).sum::<f64>()
                / runs as f64,
        }
    }
}

/// Runs `count` replicates in parallel, each with its own cohort and a
/// generator seeded from `derive_seed(master_seed, index)`. Outcomes are
/// returned in replicate order.
pub fn run_replicates(
    profile: Arc<SpeciesProfile>,
    params: RunParameters,
    master_seed: u64,
    count: usize,
) -> Result<Vec<SimulationOutcome>, EngineError> {
    (0..count as u64)
        .into_par_iter()
        .map(|index| {
            let seed = derive_seed(master_seed, index);
            SimulationEngine::new(profile.clone(), params, RunRng::seed_from_u64(seed))
                .with_seed(seed)
                .run()
        })
        .collect()
}
