use crate::config::ModelConstants;
use crate::error::{PipelineError, Result};
use crate::schema::WeeklyRecord;
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioParameters {
    pub revenue_multiplier: f64,
    pub volume_multiplier: f64,
    /// Industry whose figures the mix shift amplifies or dampens.
    #[serde(default)]
    pub mix_shift_industry: Option<String>,
    #[serde(default)]
    pub mix_shift_percent: f64,
}

impl Default for ScenarioParameters {
    fn default() -> Self {
        Self {
            revenue_multiplier: 1.0,
            volume_multiplier: 1.0,
            mix_shift_industry: None,
            mix_shift_percent: 0.0,
        }
    }
}

impl ScenarioParameters {
    pub fn scaled(revenue_multiplier: f64, volume_multiplier: f64) -> Self {
        Self {
            revenue_multiplier,
            volume_multiplier,
            ..Self::default()
        }
    }

    pub fn with_mix_shift(mut self, industry: &str, percent: f64) -> Self {
        self.mix_shift_industry = Some(industry.to_string());
        self.mix_shift_percent = percent;
        self
    }

    pub fn is_identity(&self) -> bool {
        self.revenue_multiplier == 1.0
            && self.volume_multiplier == 1.0
            && (self.mix_shift_industry.is_none() || self.mix_shift_percent == 0.0)
    }

    /// Multipliers and the mix shift must keep revenue and volume non-negative.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("revenue multiplier", self.revenue_multiplier),
            ("volume multiplier", self.volume_multiplier),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(PipelineError::InvalidScenario(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        if !self.mix_shift_percent.is_finite() || self.mix_shift_percent < -100.0 {
            return Err(PipelineError::InvalidScenario(format!(
                "mix shift percent must be at least -100, got {}",
                self.mix_shift_percent
            )));
        }
        Ok(())
    }

    /// (revenue factor, volume factor) for one record's industry.
    pub fn factors_for(&self, industry: &str, model: &ModelConstants) -> (f64, f64) {
        let mut revenue = self.revenue_multiplier;
        let mut volume = self.volume_multiplier;
        if self.mix_shift_industry.as_deref() == Some(industry) {
            let shift = self.mix_shift_percent / 100.0;
            revenue *= 1.0 + shift;
            volume *= 1.0 + model.mix_shift_volume_elasticity * shift;
        }
        (revenue, volume)
    }
}

/// Returns a scaled copy of `records`; the input is never modified.
pub fn apply_scenario(
    records: &[WeeklyRecord],
    params: &ScenarioParameters,
    model: &ModelConstants,
) -> Result<Vec<WeeklyRecord>> {
    params.validate()?;

    let adjusted: Vec<WeeklyRecord> = records
        .iter()
        .map(|record| {
            let (revenue_factor, volume_factor) = params.factors_for(&record.industry, model);
            WeeklyRecord {
                revenue: record.revenue * revenue_factor,
                volume: record.volume * volume_factor,
                ..record.clone()
            }
        })
        .collect();

    debug!(
        "Applied scenario (revenue x{}, volume x{}, mix shift {:?} {}%) to {} records",
        params.revenue_multiplier,
        params.volume_multiplier,
        params.mix_shift_industry,
        params.mix_shift_percent,
        adjusted.len()
    );

    Ok(adjusted)
}
