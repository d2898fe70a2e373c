use crate::error::{PipelineError, Result};
use chrono::{Datelike, Local, NaiveDate};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The account attributes a workbook column can be resolved to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum CanonicalField {
    AccountName,
    Industry,
    SalesCategory,
    City,
    TerritoryCode,
    Area,
    Agent,
    Status,
    StartMonth,
    StartYear,
    YearsOfEngagement,
    MonthlyRevenue,
    MonthlyVolume,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct ColumnMapping {
    #[schemars(description = "The canonical field this column feeds")]
    pub field: CanonicalField,

    #[schemars(description = "Expected header text. Used for fuzzy resolution and exact lookup.")]
    pub header: String,

    #[serde(default)]
    #[schemars(
        description = "Secondary header names tried (exact match, in order) when the primary header is absent or blank"
    )]
    pub aliases: Vec<String>,
}

impl ColumnMapping {
    pub fn new(field: CanonicalField, header: &str) -> Self {
        Self {
            field,
            header: header.to_string(),
            aliases: Vec::new(),
        }
    }

    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|a| a.to_string()).collect();
        self
    }

    /// Primary header first, then aliases.
    pub fn lookup_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.header.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

/// What to substitute when a numeric cell is missing or not a finite positive number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "PascalCase", tag = "kind")]
pub enum Fallback {
    #[schemars(description = "Whole number drawn uniformly from [min, max] using the seeded generator")]
    Random { min: f64, max: f64 },

    #[schemars(description = "A fixed value")]
    Constant { value: f64 },

    #[schemars(description = "The calendar year of the reference date")]
    CurrentYear,

    #[schemars(description = "Treat the row as unparseable: it is skipped and reported")]
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct NumericFallbacks {
    pub monthly_revenue: Fallback,
    pub monthly_volume: Fallback,
    pub years_of_engagement: Fallback,
    pub start_year: Fallback,
}

impl NumericFallbacks {
    pub fn for_field(&self, field: CanonicalField) -> Option<&Fallback> {
        match field {
            CanonicalField::MonthlyRevenue => Some(&self.monthly_revenue),
            CanonicalField::MonthlyVolume => Some(&self.monthly_volume),
            CanonicalField::YearsOfEngagement => Some(&self.years_of_engagement),
            CanonicalField::StartYear => Some(&self.start_year),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct TextDefaults {
    pub unknown: String,
    pub status: String,
    #[schemars(description = "Prefix of the synthesized account name; the 1-based row index is appended")]
    pub account_name_prefix: String,
}

impl Default for TextDefaults {
    fn default() -> Self {
        Self {
            unknown: "Unknown".to_string(),
            status: "Prospect".to_string(),
            account_name_prefix: "Account-".to_string(),
        }
    }
}

/// Tunable constants of the weekly expansion and scenario model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct ModelConstants {
    #[schemars(description = "Average weeks per month used for week-to-month mapping and monthly-to-weekly smoothing")]
    pub weeks_per_month: f64,

    pub weeks_per_year: u32,

    #[schemars(description = "Amplitude of the sinusoidal seasonal factor (0.12 = +/-12%)")]
    pub seasonal_amplitude: f64,

    #[schemars(description = "Share of a targeted mix shift that carries over to volume")]
    pub mix_shift_volume_elasticity: f64,
}

impl Default for ModelConstants {
    fn default() -> Self {
        Self {
            weeks_per_month: 4.345,
            weeks_per_year: 52,
            seasonal_amplitude: 0.12,
            mix_shift_volume_elasticity: 0.6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct IngestConfig {
    pub columns: Vec<ColumnMapping>,

    #[schemars(description = "Minimum number of canonical headers that must be recognized")]
    pub match_threshold: usize,

    pub fallbacks: NumericFallbacks,

    #[serde(default)]
    pub defaults: TextDefaults,

    #[serde(default)]
    #[schemars(description = "Seed of the fallback value generator")]
    pub seed: u64,

    #[serde(default)]
    #[schemars(description = "Stand-in for today's date. Defaults to the local clock.")]
    pub reference_date: Option<NaiveDate>,

    #[serde(default)]
    #[schemars(description = "Year of the expanded weekly series. Defaults to the reference date's year.")]
    pub reporting_year: Option<i32>,

    #[serde(default = "default_valid_years")]
    pub valid_years: (i32, i32),

    #[serde(default)]
    pub model: ModelConstants,
}

fn default_valid_years() -> (i32, i32) {
    (1900, 2200)
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self::extended()
    }
}

impl IngestConfig {
    /// Full column set: categorical detail down to city and territory.
    pub fn extended() -> Self {
        use CanonicalField::*;
        Self {
            columns: vec![
                ColumnMapping::new(AccountName, "Account Name"),
                ColumnMapping::new(Industry, "Industry"),
                ColumnMapping::new(SalesCategory, "Sales Category"),
                ColumnMapping::new(City, "City"),
                ColumnMapping::new(TerritoryCode, "Territory Code"),
                ColumnMapping::new(Area, "Team"),
                ColumnMapping::new(Agent, "Sales Agent"),
                ColumnMapping::new(Status, "Status"),
                ColumnMapping::new(StartMonth, "Forecasted TXN Start (Month)"),
                ColumnMapping::new(StartYear, "Forecasted TXN Start (Year)"),
                ColumnMapping::new(YearsOfEngagement, "Years of Engagement"),
                ColumnMapping::new(MonthlyRevenue, "Monthly Sales Forecast")
                    .with_aliases(&["Monthly Revenue"]),
                ColumnMapping::new(MonthlyVolume, "Monthly TXN Forecast"),
            ],
            match_threshold: 3,
            fallbacks: NumericFallbacks {
                monthly_revenue: Fallback::Random {
                    min: 500_000.0,
                    max: 2_500_000.0,
                },
                monthly_volume: Fallback::Random {
                    min: 50.0,
                    max: 550.0,
                },
                years_of_engagement: Fallback::Constant { value: 1.0 },
                start_year: Fallback::CurrentYear,
            },
            defaults: TextDefaults::default(),
            seed: 0,
            reference_date: None,
            reporting_year: None,
            valid_years: default_valid_years(),
            model: ModelConstants::default(),
        }
    }

    /// Reduced column set: no city, territory, sales category or engagement length.
    pub fn compact() -> Self {
        use CanonicalField::*;
        Self {
            columns: vec![
                ColumnMapping::new(AccountName, "Account"),
                ColumnMapping::new(Industry, "Industry"),
                ColumnMapping::new(Area, "Region"),
                ColumnMapping::new(Agent, "Agent"),
                ColumnMapping::new(Status, "Status"),
                ColumnMapping::new(StartMonth, "Start Month"),
                ColumnMapping::new(MonthlyRevenue, "Monthly Revenue")
                    .with_aliases(&["Revenue", "Monthly Sales Forecast"]),
                ColumnMapping::new(MonthlyVolume, "Monthly Volume"),
            ],
            match_threshold: 2,
            fallbacks: NumericFallbacks {
                monthly_revenue: Fallback::Random {
                    min: 100_000.0,
                    max: 1_000_000.0,
                },
                monthly_volume: Fallback::Random {
                    min: 10.0,
                    max: 110.0,
                },
                years_of_engagement: Fallback::Constant { value: 1.0 },
                start_year: Fallback::CurrentYear,
            },
            defaults: TextDefaults::default(),
            seed: 0,
            reference_date: None,
            reporting_year: None,
            valid_years: default_valid_years(),
            model: ModelConstants::default(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    pub fn with_reporting_year(mut self, year: i32) -> Self {
        self.reporting_year = Some(year);
        self
    }

    pub fn mapping(&self, field: CanonicalField) -> Option<&ColumnMapping> {
        self.columns.iter().find(|c| c.field == field)
    }

    pub fn has_field(&self, field: CanonicalField) -> bool {
        self.mapping(field).is_some()
    }

    pub fn today(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn effective_reporting_year(&self) -> i32 {
        self.reporting_year.unwrap_or_else(|| self.today().year())
    }

    pub fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "column mapping table is empty".to_string(),
            ));
        }

        if self.match_threshold == 0 || self.match_threshold > self.columns.len() {
            return Err(PipelineError::InvalidConfig(format!(
                "match threshold {} must be between 1 and the number of mapped columns ({})",
                self.match_threshold,
                self.columns.len()
            )));
        }

        for (idx, mapping) in self.columns.iter().enumerate() {
            if mapping.header.trim().is_empty() {
                return Err(PipelineError::InvalidConfig(format!(
                    "column mapping #{} for {:?} has an empty header",
                    idx, mapping.field
                )));
            }
            if self.columns[..idx].iter().any(|m| m.field == mapping.field) {
                return Err(PipelineError::InvalidConfig(format!(
                    "field {:?} is mapped more than once",
                    mapping.field
                )));
            }
        }

        for (name, fallback) in [
            ("monthly_revenue", &self.fallbacks.monthly_revenue),
            ("monthly_volume", &self.fallbacks.monthly_volume),
            ("years_of_engagement", &self.fallbacks.years_of_engagement),
            ("start_year", &self.fallbacks.start_year),
        ] {
            validate_fallback(name, fallback)?;
        }

        let (first, last) = self.valid_years;
        if first > last {
            return Err(PipelineError::InvalidConfig(format!(
                "valid year range {}..={} is empty",
                first, last
            )));
        }

        let model = &self.model;
        if !(model.weeks_per_month.is_finite() && model.weeks_per_month > 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "weeks_per_month must be positive, got {}",
                model.weeks_per_month
            )));
        }
        if model.weeks_per_year == 0 {
            return Err(PipelineError::InvalidConfig(
                "weeks_per_year must be at least 1".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&model.seasonal_amplitude) {
            return Err(PipelineError::InvalidConfig(format!(
                "seasonal_amplitude must be in [0, 1), got {}",
                model.seasonal_amplitude
            )));
        }
        if !(model.mix_shift_volume_elasticity.is_finite() && model.mix_shift_volume_elasticity >= 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "mix_shift_volume_elasticity must be non-negative, got {}",
                model.mix_shift_volume_elasticity
            )));
        }

        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = schemars::schema_for!(IngestConfig);
        serde_json::to_string_pretty(&schema)
    }
}

fn validate_fallback(name: &str, fallback: &Fallback) -> Result<()> {
    match fallback {
        Fallback::Random { min, max } => {
            if !(min.is_finite() && max.is_finite()) || *min <= 0.0 || min > max {
                return Err(PipelineError::InvalidConfig(format!(
                    "{} fallback bounds [{}, {}] must be positive with min <= max",
                    name, min, max
                )));
            }
        }
        Fallback::Constant { value } => {
            if !value.is_finite() || *value <= 0.0 {
                return Err(PipelineError::InvalidConfig(format!(
                    "{} fallback constant must be positive, got {}",
                    name, value
                )));
            }
        }
        Fallback::CurrentYear | Fallback::Reject => {}
    }
    Ok(())
}
