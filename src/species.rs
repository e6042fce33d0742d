use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ProfileError {
    #[error("invalid parameter: survival rate must be between 0 and 1 (got {0})")]
    InvalidParameter(f64),
}

/// Biological parameters for one species.
///
/// Only the survival rate is range-checked here; the remaining fields are
/// validated by whatever input surface builds the profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawProfile")]
pub struct SpeciesProfile {
    name: String,
    avg_litter_size: f64,
    avg_litters_per_year: f64,
    survival_rate: f64,
    reproduction_age: u32,
}

impl SpeciesProfile {
    pub fn new(
        name: impl Into<String>,
        avg_litter_size: f64,
        avg_litters_per_year: f64,
        survival_rate: f64,
        reproduction_age: u32,
    ) -> Result<Self, ProfileError> {
        if !(0.0..=1.0).contains(&survival_rate) {
            return Err(ProfileError::InvalidParameter(survival_rate));
        }
        Ok(Self {
            name: name.into(),
            avg_litter_size,
            avg_litters_per_year,
            survival_rate,
            reproduction_age,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn avg_litter_size(&self) -> f64 {
        self.avg_litter_size
    }

    /// Carried for reporting; the cohort model does not read it.
    pub fn avg_litters_per_year(&self) -> f64 {
        self.avg_litters_per_year
    }

    pub fn survival_rate(&self) -> f64 {
        self.survival_rate
    }

    /// Age in months at which an individual becomes able to breed.
    pub fn reproduction_age(&self) -> u32 {
        self.reproduction_age
    }
}

impl fmt::Display for SpeciesProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [Litter: {:.1}, Litters/Year: {:.1}, Survival: {:.1}%, Repro Age: {} months]",
            self.name,
            self.avg_litter_size,
            self.avg_litters_per_year,
            self.survival_rate * 100.0,
            self.reproduction_age
        )
    }
}

#[derive(Deserialize)]
struct RawProfile {
    name: String,
    avg_litter_size: f64,
    avg_litters_per_year: f64,
    survival_rate: f64,
    reproduction_age: u32,
}

impl TryFrom<RawProfile> for SpeciesProfile {
    type Error = ProfileError;

    fn try_from(raw: RawProfile) -> Result<Self, Self::Error> {
        SpeciesProfile::new(
            raw.name,
            raw.avg_litter_size,
            raw.avg_litters_per_year,
            raw.survival_rate,
            raw.reproduction_age,
        )
    }
}
