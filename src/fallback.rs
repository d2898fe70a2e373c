//! Seeded source of substitute values for missing numeric cells.
//!
//! Every ingestion pass builds a fresh sampler from `IngestConfig::seed`, so the
//! same workbook with the same configuration always yields bit-identical output.

use crate::config::Fallback;
use chrono::{Datelike, NaiveDate};
use rand::SeedableRng;
use rand_distr::{Distribution, Uniform};
use rand_pcg::Pcg64Mcg;

pub struct FallbackSampler {
    rng: Pcg64Mcg,
    today: NaiveDate,
}

impl FallbackSampler {
    pub fn new(seed: u64, today: NaiveDate) -> Self {
        Self {
            rng: Pcg64Mcg::seed_from_u64(seed),
            today,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Substitute value for the given policy, or `None` when the policy rejects the row.
    pub fn resolve(&mut self, fallback: &Fallback) -> Option<f64> {
        match fallback {
            Fallback::Random { min, max } => Some(self.draw(*min, *max)),
            Fallback::Constant { value } => Some(*value),
            Fallback::CurrentYear => Some(self.today.year() as f64),
            Fallback::Reject => None,
        }
    }

    fn draw(&mut self, min: f64, max: f64) -> f64 {
        let raw = Uniform::new_inclusive(min, max).sample(&mut self.rng);
        let rounded = raw.round();
        if rounded < min || rounded > max {
            raw
        } else {
            rounded
        }
    }
}
