//! # Pipeline Forecast Builder
//!
//! A library for turning a sales pipeline spreadsheet (one row per account) into a
//! normalized per-account, per-week revenue and volume series for reporting and
//! what-if analysis.
//!
//! ## Core Concepts
//!
//! - **Column resolution**: tolerant, case-insensitive header matching decides whether
//!   the workbook is probably in the expected shape before anything is parsed
//! - **Normalization**: every row becomes an [`Account`]; missing text falls back to
//!   placeholders and missing figures to a seeded, configurable [`Fallback`]
//! - **Weekly expansion**: monthly commitments are smoothed into 52 weeks, gated by
//!   the account's contribution window and modulated by a sinusoidal seasonal factor
//! - **Views**: scenario adjustment, then filtering, then aggregation, each a pure
//!   function producing a new collection
//! - **Comparison**: YTD, MTD and run-rate forecast over monthly buckets
//!
//! ## Example
//!
//! ```rust,ignore
//! use pipeline_forecast_builder::*;
//!
//! let bytes = std::fs::read("pipeline.xlsx")?;
//! let config = IngestConfig::extended().with_seed(42);
//! let dataset = process_workbook(&bytes, &config)?;
//!
//! let scenario = ScenarioParameters::scaled(1.1, 1.0).with_mix_shift("Retail", 20.0);
//! let filters = FilterSet::new().with(Dimension::Area, "West");
//! let view = dataset.derive_view(&scenario, &filters, &config.model)?;
//!
//! let monthly = group_by_time(&view, TimeGranularity::Monthly, &config.model);
//! let forecast = run_rate_forecast(ytd(&monthly, 6, Metric::Revenue), 6, 10.0);
//! ```

pub mod aggregation;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod fallback;
pub mod filter;
pub mod forecast;
pub mod normalizer;
pub mod resolver;
pub mod scenario;
pub mod schema;
pub mod seasonality;
pub mod utils;
pub mod workbook;

pub use aggregation::{
    group_by_key, group_by_time, status_by_agent, AgentStatusBreakdown, AgentStatusRow,
    AggregateBucket, BucketKey, TimeGranularity,
};
pub use config::*;
pub use engine::WeeklyExpander;
pub use error::{PipelineError, Result};
pub use export::{to_csv_string, write_csv, ExportLayout};
pub use fallback::FallbackSampler;
pub use filter::{filter_records, Dimension, FilterSet, Selection};
pub use forecast::*;
pub use normalizer::{normalize_rows, NormalizedBatch, RowNormalizer};
pub use resolver::{resolve_columns, ColumnResolution};
pub use scenario::{apply_scenario, ScenarioParameters};
pub use schema::*;
pub use workbook::{read_workbook_bytes, read_workbook_path, SheetRows};

use log::{debug, info};
use std::path::Path;
use utils::distinct_sorted;

pub struct PipelineProcessor {
    config: IngestConfig,
}

impl PipelineProcessor {
    pub fn new(config: IngestConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Runs the whole ingest: resolve headers, normalize rows, expand to weeks.
    ///
    /// Either yields one complete dataset or fails with nothing partially visible.
    pub fn process_rows(&self, headers: &[String], rows: &[RawRow]) -> Result<PipelineDataset> {
        if rows.is_empty() {
            return Err(PipelineError::EmptyInput);
        }

        resolve_columns(headers, &self.config)?;

        let batch = normalize_rows(rows, &self.config)?;

        let year = self.config.effective_reporting_year();
        let expander = WeeklyExpander::new(self.config.model, year);
        let (accounts, weekly) = expander.expand_and_total(batch.accounts);

        if weekly.is_empty() {
            return Err(PipelineError::EmptyResult {
                skipped: batch.skipped.len(),
            });
        }

        let meta = self.build_meta(&accounts, year);
        let info = IngestInfo {
            total_rows: rows.len(),
            original_columns: headers.to_vec(),
            date_range: date_range(&weekly),
            skipped_rows: batch.skipped,
            imputations: batch.imputations,
        };

        info!(
            "Ingest complete: {} accounts, {} weekly records, {} rows skipped",
            accounts.len(),
            weekly.len(),
            info.skipped_rows.len()
        );

        Ok(PipelineDataset {
            weekly,
            accounts,
            meta,
            info,
        })
    }

    pub fn process_sheet(&self, sheet: &SheetRows) -> Result<PipelineDataset> {
        self.process_rows(&sheet.headers, &sheet.rows)
    }

    /// Rows without a header row: the first row's keys stand in for the headers.
    pub fn process_raw_rows(&self, rows: &[RawRow]) -> Result<PipelineDataset> {
        let headers: Vec<String> = rows
            .first()
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default();
        self.process_rows(&headers, rows)
    }

    pub fn process_bytes(&self, bytes: &[u8]) -> Result<PipelineDataset> {
        let sheet = read_workbook_bytes(bytes)?;
        self.process_sheet(&sheet)
    }

    pub fn process_path(&self, path: impl AsRef<Path>) -> Result<PipelineDataset> {
        let sheet = read_workbook_path(path.as_ref())?;
        self.process_sheet(&sheet)
    }

    /// Reads the file once, then runs the synchronous pipeline. No retries.
    #[cfg(feature = "async")]
    pub async fn process_file_async(&self, path: impl AsRef<Path>) -> Result<PipelineDataset> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| PipelineError::ReadFailure(format!("{}: {}", path.display(), e)))?;
        debug!("Read {} bytes from {}", bytes.len(), path.display());
        self.process_bytes(&bytes)
    }

    /// Re-expands normalized accounts for another year, e.g. the prior period.
    pub fn expand_year(&self, accounts: &[Account], year: i32) -> Vec<WeeklyRecord> {
        WeeklyExpander::new(self.config.model, year).expand_all(accounts)
    }

    pub fn export_layout(&self) -> ExportLayout {
        ExportLayout::for_config(&self.config)
    }

    fn build_meta(&self, accounts: &[Account], year: i32) -> DatasetMeta {
        let optional = |field: CanonicalField, pick: fn(&Account) -> &str| {
            self.config
                .has_field(field)
                .then(|| distinct_sorted(accounts.iter().map(pick)))
        };

        DatasetMeta {
            industries: distinct_sorted(accounts.iter().map(|a| a.industry.as_str())),
            sales_categories: optional(CanonicalField::SalesCategory, |a| a.sales_category.as_str()),
            cities: optional(CanonicalField::City, |a| a.city.as_str()),
            areas: distinct_sorted(accounts.iter().map(|a| a.area.as_str())),
            territory_codes: optional(CanonicalField::TerritoryCode, |a| a.territory_code.as_str()),
            agents: distinct_sorted(accounts.iter().map(|a| a.agent.as_str())),
            statuses: distinct_sorted(accounts.iter().map(|a| a.status.as_str())),
            year,
        }
    }
}

fn date_range(weekly: &[WeeklyRecord]) -> DateRange {
    let mut years: Vec<i32> = weekly.iter().map(|r| r.year).collect();
    years.sort_unstable();
    years.dedup();
    DateRange {
        min_week: weekly.iter().map(|r| r.week).min().unwrap_or(0),
        max_week: weekly.iter().map(|r| r.week).max().unwrap_or(0),
        years,
    }
}

impl PipelineDataset {
    /// Scenario first, then filters: the filter sees already-adjusted figures.
    pub fn derive_view(
        &self,
        scenario: &ScenarioParameters,
        filters: &FilterSet,
        model: &ModelConstants,
    ) -> Result<Vec<WeeklyRecord>> {
        let adjusted = apply_scenario(&self.weekly, scenario, model)?;
        let view = filters.apply(&adjusted);
        debug!(
            "Derived view of {} records from {} weekly records",
            view.len(),
            self.weekly.len()
        );
        Ok(view)
    }
}

pub fn process_workbook(bytes: &[u8], config: &IngestConfig) -> Result<PipelineDataset> {
    PipelineProcessor::new(config.clone())?.process_bytes(bytes)
}

pub fn process_rows(
    headers: &[String],
    rows: &[RawRow],
    config: &IngestConfig,
) -> Result<PipelineDataset> {
    PipelineProcessor::new(config.clone())?.process_rows(headers, rows)
}
