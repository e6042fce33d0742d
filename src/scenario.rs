use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{LoggingConfig, OutputConfig};
use crate::engine::RunParameters;
use crate::render::ChartConfig;
use crate::species::{ProfileError, SpeciesProfile};

/// Largest accepted average litter size. Keeps yearly offspring counts far
/// from integer and allocation limits.
pub const MAX_LITTER_SIZE: f64 = 100.0;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("malformed input: {0}")]
    InputFormat(String),
    #[error("{field} {reason}")]
    OutOfRange { field: &'static str, reason: String },
    #[error(transparent)]
    Profile(#[from] ProfileError),
}

/// Species parameters as typed by a user, before range checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesInput {
    pub name: String,
    pub avg_litter_size: f64,
    pub avg_litters_per_year: f64,
    pub survival_rate: f64,
    /// Months.
    pub reproduction_age: u32,
}

impl SpeciesInput {
    pub fn validate(&self) -> Result<SpeciesProfile, ScenarioError> {
        if self.name.trim().is_empty() {
            return Err(out_of_range("species name", "must not be empty"));
        }
        positive("average litter size", self.avg_litter_size)?;
        if self.avg_litter_size > MAX_LITTER_SIZE {
            return Err(out_of_range("average litter size", "must be at most 100"));
        }
        positive("average litters per year", self.avg_litters_per_year)?;
        if !(0.0..=1.0).contains(&self.survival_rate) {
            return Err(out_of_range("survival rate", "must be between 0.0 and 1.0"));
        }
        if self.reproduction_age == 0 {
            return Err(out_of_range("reproduction age", "must be at least 1 month"));
        }
        Ok(SpeciesProfile::new(
            self.name.trim(),
            self.avg_litter_size,
            self.avg_litters_per_year,
            self.survival_rate,
            self.reproduction_age,
        )?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub seed: Option<u64>,
    pub species: SpeciesInput,
    pub initial_population: u64,
    pub years: u32,
    #[serde(default)]
    pub chart: ChartConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Scenario {
    pub fn from_yaml_str(text: &str) -> Result<Self, ScenarioError> {
        serde_yaml::from_str(text).map_err(|err| ScenarioError::InputFormat(err.to_string()))
    }

    /// Builds a scenario from already-parsed values, e.g. command-line flags.
    pub fn from_parts(species: SpeciesInput, initial_population: u64, years: u32) -> Self {
        Self {
            name: species.name.clone(),
            description: None,
            seed: None,
            species,
            initial_population,
            years,
            chart: ChartConfig::default(),
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Range-checks every field and returns what the engine needs.
    pub fn prepare(&self) -> Result<(Arc<SpeciesProfile>, RunParameters), ScenarioError> {
        let profile = self.species.validate()?;
        if self.initial_population == 0 {
            return Err(out_of_range("initial population", "must be greater than zero"));
        }
        if self.years == 0 {
            return Err(out_of_range("years to simulate", "must be greater than zero"));
        }
        Ok((
            Arc::new(profile),
            RunParameters {
                initial_population: self.initial_population,
                simulation_years: self.years,
            },
        ))
    }
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario = Scenario::from_yaml_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(scenario)
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ScenarioError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(out_of_range(field, "must be a positive number"))
    }
}

fn out_of_range(field: &'static str, reason: &str) -> ScenarioError {
    ScenarioError::OutOfRange {
        field,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mouse() -> SpeciesInput {
        SpeciesInput {
            name: "House Mouse".into(),
            avg_litter_size: 6.0,
            avg_litters_per_year: 5.0,
            survival_rate: 0.8,
            reproduction_age: 2,
        }
    }

    #[test]
    fn valid_input_prepares_engine_parameters() {
        let (profile, params) = Scenario::from_parts(mouse(), 10, 3).prepare().unwrap();
        assert_eq!(profile.name(), "House Mouse");
        assert_eq!(params.initial_population, 10);
        assert_eq!(params.simulation_years, 3);
    }

    #[test]
    fn rejects_out_of_range_fields() {
        let cases: Vec<(SpeciesInput, &str)> = vec![
            (SpeciesInput { name: " ".into(), ..mouse() }, "species name"),
            (SpeciesInput { avg_litter_size: 0.0, ..mouse() }, "average litter size"),
            (SpeciesInput { avg_litters_per_year: -1.0, ..mouse() }, "average litters per year"),
            (SpeciesInput { avg_litter_size: f64::INFINITY, ..mouse() }, "average litter size"),
            (SpeciesInput { avg_litter_size: 1e20, ..mouse() }, "average litter size"),
            (SpeciesInput { survival_rate: 1.2, ..mouse() }, "survival rate"),
            (SpeciesInput { reproduction_age: 0, ..mouse() }, "reproduction age"),
        ];
        for (input, expected_field) in cases {
            match input.validate() {
                Err(ScenarioError::OutOfRange { field, .. }) => assert_eq!(field, expected_field),
                other => panic!("expected {expected_field} to be rejected, got {other:?}"),
            }
        }
    }

    #[test]
    fn accepts_litter_size_at_the_upper_bound() {
        let input = SpeciesInput { avg_litter_size: MAX_LITTER_SIZE, ..mouse() };
        assert_eq!(input.validate().unwrap().avg_litter_size(), MAX_LITTER_SIZE);
    }

    #[test]
    fn rejects_empty_runs() {
        assert!(matches!(
            Scenario::from_parts(mouse(), 0, 3).prepare(),
            Err(ScenarioError::OutOfRange { field: "initial population", .. })
        ));
        assert!(matches!(
            Scenario::from_parts(mouse(), 10, 0).prepare(),
            Err(ScenarioError::OutOfRange { field: "years to simulate", .. })
        ));
    }

    #[test]
    fn parses_yaml_with_defaults() {
        let scenario = Scenario::from_yaml_str(
            "name: lab colony\n\
             species:\n  name: Rat\n  avg_litter_size: 8\n  avg_litters_per_year: 4\n  survival_rate: 0.6\n  reproduction_age: 3\n\
             initial_population: 12\n\
             years: 5\n",
        )
        .unwrap();
        assert_eq!(scenario.seed, None);
        assert_eq!(scenario.chart, ChartConfig::default());
        assert_eq!(scenario.logging.level, "info");
        assert_eq!(scenario.species.reproduction_age, 3);
    }

    #[test]
    fn malformed_yaml_is_an_input_format_error() {
        let err = Scenario::from_yaml_str("name: x\ninitial_population: lots\n").unwrap_err();
        assert!(matches!(err, ScenarioError::InputFormat(_)));
    }
}
