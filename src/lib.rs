pub mod cohort;
pub mod config;
pub mod engine;
pub mod growth;
pub mod render;
pub mod replicate;
pub mod rng;
pub mod scenario;
pub mod snapshot;
pub mod species;
pub mod web;

pub use engine::{RunParameters, SimulationEngine, SimulationOutcome, YearSummary};
pub use scenario::Scenario;
pub use species::SpeciesProfile;
