use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::cohort::{eligible_females, CohortPopulation};
use crate::growth::average_growth_rate;
use crate::species::SpeciesProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunParameters {
    pub initial_population: u64,
    pub simulation_years: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Seeded,
    Running { year: u32 },
    Completed,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("simulation already completed; build a new engine to run again")]
    AlreadyCompleted,
    #[error("simulation cancelled after year {year}")]
    Cancelled { year: u32 },
}

/// What happened during one simulated year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearSummary {
    pub year: u32,
    pub breeding_eligible: u64,
    pub breeding_females: u64,
    pub offspring: u64,
    pub survivors: u64,
    pub total: u64,
    pub extinction_guarded: bool,
}

/// Completed trajectory of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutcome {
    pub profile: SpeciesProfile,
    pub initial_population: u64,
    pub simulation_years: u32,
    pub history: Vec<u64>,
    pub average_growth_rate: f64,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl SimulationOutcome {
    pub fn final_population(&self) -> u64 {
        self.history.last().copied().unwrap_or(0)
    }

    pub fn report(&self) -> String {
        format!(
            "=== Simulation Results ===\nSpecies: {}\nFinal Population: {}\nGrowth Rate: {:.2}%\n",
            self.profile.name(),
            self.final_population(),
            self.average_growth_rate
        )
    }
}

/// Year-by-year cohort simulation.
///
/// The engine owns its generator; runs are single-shot and a completed
/// engine refuses to run again.
pub struct SimulationEngine<R: Rng> {
    profile: Arc<SpeciesProfile>,
    params: RunParameters,
    rng: R,
    seed: Option<u64>,
    cohort: CohortPopulation,
    history: Vec<u64>,
    state: EngineState,
    average_growth_rate: Option<f64>,
}

impl<R: Rng> SimulationEngine<R> {
    pub fn new(profile: Arc<SpeciesProfile>, params: RunParameters, rng: R) -> Self {
        Self {
            profile,
            params,
            rng,
            seed: None,
            cohort: CohortPopulation::new(),
            history: Vec::with_capacity(params.simulation_years as usize + 1),
            state: EngineState::Uninitialized,
            average_growth_rate: None,
        }
    }

    /// Records the seed the generator was built from so it travels with the outcome.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn profile(&self) -> &SpeciesProfile {
        &self.profile
    }

    pub fn cohort(&self) -> &CohortPopulation {
        &self.cohort
    }

    pub fn history(&self) -> &[u64] {
        &self.history
    }

    pub fn average_growth_rate(&self) -> Option<f64> {
        self.average_growth_rate
    }

    /// Builds the mixed-age starting cohort. A no-op once seeded.
    pub fn seed(&mut self) -> Result<(), EngineError> {
        match self.state {
            EngineState::Uninitialized => {}
            EngineState::Completed => return Err(EngineError::AlreadyCompleted),
            _ => return Ok(()),
        }
        self.cohort =
            CohortPopulation::seeded(&self.profile, self.params.initial_population, &mut self.rng);
        self.history.clear();
        self.history.push(self.params.initial_population);
        self.state = EngineState::Seeded;
        debug!(
            species = self.profile.name(),
            initial = self.params.initial_population,
            "seeded cohort"
        );
        Ok(())
    }

    /// Advances one year. Returns `None` when every year has been simulated.
    pub fn step(&mut self) -> Result<Option<YearSummary>, EngineError> {
        self.seed()?;
        let year = match self.state {
            EngineState::Seeded => 1,
            EngineState::Running { year } => year + 1,
            EngineState::Uninitialized | EngineState::Completed => {
                return Err(EngineError::AlreadyCompleted)
            }
        };
        if year > self.params.simulation_years {
            return Ok(None);
        }

        let profile = &*self.profile;
        self.cohort.age();
        let breeding_eligible = self.cohort.breeding_count(profile);
        let breeding_females = eligible_females(breeding_eligible);
        let offspring = self
            .cohort
            .produce_offspring(profile, breeding_females, &mut self.rng);
        let survivors = self.cohort.apply_mortality(profile, &mut self.rng);
        self.cohort.add_newborns(offspring);
        let computed = survivors.saturating_add(offspring);
        let total = self.cohort.extinction_guard(profile, computed);
        self.history.push(total);
        self.state = EngineState::Running { year };

        let summary = YearSummary {
            year,
            breeding_eligible,
            breeding_females,
            offspring,
            survivors,
            total,
            extinction_guarded: computed == 0,
        };
        debug!(
            year,
            breeding_females,
            offspring,
            survivors,
            total,
            guarded = summary.extinction_guarded,
            "simulated year"
        );
        Ok(Some(summary))
    }

    pub fn run(&mut self) -> Result<SimulationOutcome, EngineError> {
        self.run_until(|_| true)
    }

    pub fn run_with_hook<F>(&mut self, mut hook: F) -> Result<SimulationOutcome, EngineError>
    where
        F: FnMut(&YearSummary),
    {
        self.run_until(|summary| {
            hook(summary);
            true
        })
    }

    /// Runs to completion, consulting `keep_going` after every year. Returning
    /// `false` stops the run with [`EngineError::Cancelled`].
    pub fn run_until<F>(&mut self, mut keep_going: F) -> Result<SimulationOutcome, EngineError>
    where
        F: FnMut(&YearSummary) -> bool,
    {
        if self.state == EngineState::Completed {
            return Err(EngineError::AlreadyCompleted);
        }
        while let Some(summary) = self.step()? {
            if !keep_going(&summary) {
                return Err(EngineError::Cancelled { year: summary.year });
            }
        }
        Ok(self.complete())
    }

    fn complete(&mut self) -> SimulationOutcome {
        let rate = average_growth_rate(&self.history);
        self.average_growth_rate = Some(rate);
        self.state = EngineState::Completed;
        let outcome = SimulationOutcome {
            profile: (*self.profile).clone(),
            initial_population: self.params.initial_population,
            simulation_years: self.params.simulation_years,
            history: self.history.clone(),
            average_growth_rate: rate,
            seed: self.seed,
        };
        info!(
            species = self.profile.name(),
            years = self.params.simulation_years,
            final_population = outcome.final_population(),
            growth_rate = rate,
            "simulation completed"
        );
        outcome
    }
}
