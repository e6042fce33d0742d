use serde::{Deserialize, Serialize};

/// Growth between two consecutive yearly totals, as a percentage.
/// `None` when the earlier total is zero.
pub fn year_over_year(prev: u64, current: u64) -> Option<f64> {
    if prev == 0 {
        return None;
    }
    Some((current as f64 - prev as f64) / prev as f64 * 100.0)
}

/// Mean of the year-over-year growth percentages of a history.
///
/// Pairs starting from a zero total are left out of the mean entirely. A
/// history with no usable pair yields 0.
pub fn average_growth_rate(history: &[u64]) -> f64 {
    let rates: Vec<f64> = history
        .windows(2)
        .filter_map(|pair| year_over_year(pair[0], pair[1]))
        .collect();
    if rates.is_empty() {
        return 0.0;
    }
    rates.iter().sum::<f64>() / rates.len() as f64
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthSummary {
    pub initial: u64,
    pub final_population: u64,
    pub peak: u64,
    pub peak_year: usize,
    pub trough: u64,
    pub trough_year: usize,
    pub yearly_rates: Vec<Option<f64>>,
    pub average_growth_rate: f64,
}

impl GrowthSummary {
    pub fn from_history(history: &[u64]) -> Self {
        let (peak_year, peak) = history
            .iter()
            .copied()
            .enumerate()
            .fold((0, 0), |best, (year, value)| {
                if value > best.1 {
                    (year, value)
                } else {
                    best
                }
            });
        let (trough_year, trough) = history
            .iter()
            .copied()
            .enumerate()
            .min_by_key(|&(_, value)| value)
            .unwrap_or((0, 0));
        Self {
            initial: history.first().copied().unwrap_or(0),
            final_population: history.last().copied().unwrap_or(0),
            peak,
            peak_year,
            trough,
            trough_year,
            yearly_rates: history
                .windows(2)
                .map(|pair| year_over_year(pair[0], pair[1]))
                .collect(),
            average_growth_rate: average_growth_rate(history),
        }
    }
}
