//! Age-structured population mechanics.
//!
//! A cohort is a bag of individual ages in months. The engine drives it
//! through one year at a time: aging, breeding, mortality, then the
//! extinction guard.

use rand::Rng;

use crate::species::SpeciesProfile;

pub const MONTHS_PER_YEAR: u32 = 12;
pub const FEMALE_FRACTION: f64 = 0.5;
pub const BREEDING_PROBABILITY: f64 = 0.8;
pub const LITTER_VARIATION_MIN: f64 = 0.8;
pub const LITTER_VARIATION_MAX: f64 = 1.2;
pub const JUVENILE_SURVIVAL_FACTOR: f64 = 0.7;
pub const ELDER_SURVIVAL_FACTOR: f64 = 0.6;
/// Individuals older than this multiple of the reproduction age count as elders.
pub const ELDER_AGE_MULTIPLE: u32 = 3;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CohortPopulation {
    ages: Vec<u32>,
}

impl CohortPopulation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ages(ages: Vec<u32>) -> Self {
        Self { ages }
    }

    /// Seeds `count` individuals with ages uniform on `[0, 2 * reproduction_age)`.
    pub fn seeded<R: Rng>(profile: &SpeciesProfile, count: u64, rng: &mut R) -> Self {
        let span = profile.reproduction_age().saturating_mul(2);
        let ages = (0..count)
            .map(|_| if span == 0 { 0 } else { rng.gen_range(0..span) })
            .collect();
        Self { ages }
    }

    pub fn len(&self) -> u64 {
        self.ages.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.ages.is_empty()
    }

    pub fn ages(&self) -> &[u32] {
        &self.ages
    }

    pub fn age(&mut self) {
        for age in &mut self.ages {
            *age = age.saturating_add(MONTHS_PER_YEAR);
        }
    }

    pub fn breeding_count(&self, profile: &SpeciesProfile) -> u64 {
        let threshold = profile.reproduction_age();
        self.ages.iter().filter(|&&age| age >= threshold).count() as u64
    }

    /// Total offspring for the year from `females` eligible breeders.
    ///
    /// Litter noise is drawn per breeding female and rounded; the survival
    /// scaling is applied once to the summed litters and truncated. The sum
    /// saturates at `u64::MAX`.
    pub fn produce_offspring<R: Rng>(
        &self,
        profile: &SpeciesProfile,
        females: u64,
        rng: &mut R,
    ) -> u64 {
        let mut litters = 0_u64;
        for _ in 0..females {
            if !rng.gen_bool(BREEDING_PROBABILITY) {
                continue;
            }
            let variation = rng.gen_range(LITTER_VARIATION_MIN..=LITTER_VARIATION_MAX);
            let litter = (profile.avg_litter_size() * variation).round().max(0.0) as u64;
            litters = litters.saturating_add(litter);
        }
        (litters as f64 * profile.survival_rate())
            .trunc()
            .clamp(0.0, u64::MAX as f64) as u64
    }

    pub fn add_newborns(&mut self, count: u64) {
        self.ages.extend(std::iter::repeat(0).take(count as usize));
    }

    /// Runs one survival trial per individual and keeps the survivors.
    pub fn apply_mortality<R: Rng>(
        &mut self,
        profile: &SpeciesProfile,
        rng: &mut R,
    ) -> u64 {
        let maturity = profile.reproduction_age();
        let elder = maturity.saturating_mul(ELDER_AGE_MULTIPLE);
        let base = profile.survival_rate();
        self.ages.retain(|&age| {
            let p = if age < maturity {
                base * JUVENILE_SURVIVAL_FACTOR
            } else if age > elder {
                base * ELDER_SURVIVAL_FACTOR
            } else {
                base
            };
            rng.gen_bool(p)
        });
        self.len()
    }

    /// Keeps the lineage alive: a zero total reseeds one mature individual
    /// and is reported as 1.
    pub fn extinction_guard(&mut self, profile: &SpeciesProfile, total: u64) -> u64 {
        if total > 0 {
            return total;
        }
        self.ages.push(profile.reproduction_age());
        1
    }
}

pub fn eligible_females(breeding_count: u64) -> u64 {
    (breeding_count as f64 * FEMALE_FRACTION).floor() as u64
}
