use crate::config::{CanonicalField, IngestConfig};
use crate::error::{PipelineError, Result};
use crate::fallback::FallbackSampler;
use crate::schema::{Account, CellValue, Imputation, RawRow, RowDiagnostic};
use crate::utils::{lookup_cell, parse_month, parse_positive_number};
use chrono::Datelike;
use log::{debug, info, warn};
use std::collections::HashMap;

const MAX_YEARS_OF_ENGAGEMENT: f64 = 100.0;

#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    /// One account per distinct name, in input order.
    pub accounts: Vec<Account>,
    pub skipped: Vec<RowDiagnostic>,
    pub imputations: Vec<Imputation>,
}

pub struct RowNormalizer<'a> {
    config: &'a IngestConfig,
    sampler: FallbackSampler,
}

impl<'a> RowNormalizer<'a> {
    pub fn new(config: &'a IngestConfig) -> Self {
        Self {
            config,
            sampler: FallbackSampler::new(config.seed, config.today()),
        }
    }

    /// Cleans one row into an account. `row_number` is 1-based.
    ///
    /// `base_revenue` and `base_volume` stay at zero until the expander runs.
    pub fn normalize_row(
        &mut self,
        row: &RawRow,
        row_number: usize,
    ) -> Result<(Account, Vec<Imputation>)> {
        let config = self.config;
        let defaults = &config.defaults;
        let mut imputations = Vec::new();

        let name = self
            .text_field(row, CanonicalField::AccountName)
            .unwrap_or_else(|| format!("{}{}", defaults.account_name_prefix, row_number));
        let status = self
            .text_field(row, CanonicalField::Status)
            .unwrap_or_else(|| defaults.status.clone());
        let unknown = |value: Option<String>| value.unwrap_or_else(|| defaults.unknown.clone());

        let industry = unknown(self.text_field(row, CanonicalField::Industry));
        let sales_category = unknown(self.text_field(row, CanonicalField::SalesCategory));
        let city = unknown(self.text_field(row, CanonicalField::City));
        let territory_code = unknown(self.text_field(row, CanonicalField::TerritoryCode));
        let area = unknown(self.text_field(row, CanonicalField::Area));
        let agent = unknown(self.text_field(row, CanonicalField::Agent));

        let monthly_revenue = self.numeric_field(
            row,
            CanonicalField::MonthlyRevenue,
            row_number,
            &mut imputations,
        )?;
        let monthly_volume = self.numeric_field(
            row,
            CanonicalField::MonthlyVolume,
            row_number,
            &mut imputations,
        )?;
        let years_raw = self.numeric_field(
            row,
            CanonicalField::YearsOfEngagement,
            row_number,
            &mut imputations,
        )?;
        let start_year_raw = self.numeric_field(
            row,
            CanonicalField::StartYear,
            row_number,
            &mut imputations,
        )?;

        if years_raw > MAX_YEARS_OF_ENGAGEMENT {
            return Err(PipelineError::RowProcessing {
                row: row_number,
                reason: format!("years of engagement {} is out of range", years_raw),
            });
        }
        let years_of_engagement = (years_raw.round() as u32).max(1);

        let (first_year, last_year) = config.valid_years;
        let start_year = start_year_raw.round();
        if start_year < first_year as f64 || start_year > last_year as f64 {
            return Err(PipelineError::RowProcessing {
                row: row_number,
                reason: format!(
                    "start year {} is outside {}..={}",
                    start_year_raw, first_year, last_year
                ),
            });
        }
        let start_year = start_year as i32;
        let end_year = start_year + years_of_engagement as i32 - 1;

        let start_month = self
            .lookup(row, CanonicalField::StartMonth)
            .and_then(parse_month)
            .unwrap_or_else(|| self.sampler.today().month());

        let account = Account {
            name,
            industry,
            sales_category,
            city,
            territory_code,
            area,
            agent,
            status,
            start_month,
            start_year,
            years_of_engagement,
            end_year,
            monthly_revenue,
            monthly_volume,
            base_revenue: 0.0,
            base_volume: 0.0,
        };

        Ok((account, imputations))
    }

    /// Normalizes every row, skipping the ones that fail and duplicate names.
    pub fn normalize_all(&mut self, rows: &[RawRow]) -> Result<NormalizedBatch> {
        let mut batch = NormalizedBatch::default();
        let mut first_seen: HashMap<String, usize> = HashMap::new();

        for (idx, row) in rows.iter().enumerate() {
            let row_number = idx + 1;
            match self.normalize_row(row, row_number) {
                Ok((account, imputations)) => {
                    if let Some(first) = first_seen.get(&account.name) {
                        let reason = format!(
                            "duplicate account name '{}' (first seen on row {})",
                            account.name, first
                        );
                        warn!("Skipping row {}: {}", row_number, reason);
                        batch.skipped.push(RowDiagnostic {
                            row: row_number,
                            reason,
                        });
                        continue;
                    }
                    first_seen.insert(account.name.clone(), row_number);
                    batch.imputations.extend(imputations);
                    batch.accounts.push(account);
                }
                Err(err) => {
                    let reason = match err {
                        PipelineError::RowProcessing { reason, .. } => reason,
                        other => other.to_string(),
                    };
                    warn!("Skipping row {}: {}", row_number, reason);
                    batch.skipped.push(RowDiagnostic {
                        row: row_number,
                        reason,
                    });
                }
            }
        }

        info!(
            "Normalized {} accounts from {} rows ({} skipped, {} imputed values)",
            batch.accounts.len(),
            rows.len(),
            batch.skipped.len(),
            batch.imputations.len()
        );

        if batch.accounts.is_empty() {
            return Err(PipelineError::EmptyResult {
                skipped: batch.skipped.len(),
            });
        }

        Ok(batch)
    }

    fn lookup<'r>(&self, row: &'r RawRow, field: CanonicalField) -> Option<&'r CellValue> {
        let mapping = self.config.mapping(field)?;
        lookup_cell(row, mapping.lookup_names())
    }

    fn text_field(&self, row: &RawRow, field: CanonicalField) -> Option<String> {
        self.lookup(row, field)
            .and_then(|cell| cell.as_text())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn numeric_field(
        &mut self,
        row: &RawRow,
        field: CanonicalField,
        row_number: usize,
        imputations: &mut Vec<Imputation>,
    ) -> Result<f64> {
        if let Some(value) = self.lookup(row, field).and_then(parse_positive_number) {
            return Ok(value);
        }

        let config = self.config;
        let fallback = config
            .fallbacks
            .for_field(field)
            .ok_or_else(|| PipelineError::RowProcessing {
                row: row_number,
                reason: format!("{:?} is not a numeric field", field),
            })?;

        let value = self
            .sampler
            .resolve(fallback)
            .ok_or_else(|| PipelineError::RowProcessing {
                row: row_number,
                reason: format!("{:?} is missing or not a positive number", field),
            })?;

        if config.has_field(field) {
            debug!("Row {}: imputed {:?} = {}", row_number, field, value);
            imputations.push(Imputation {
                row: row_number,
                field,
                value,
            });
        }

        Ok(value)
    }
}

pub fn normalize_rows(rows: &[RawRow], config: &IngestConfig) -> Result<NormalizedBatch> {
    RowNormalizer::new(config).normalize_all(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Fallback;
    use chrono::NaiveDate;

    fn config() -> IngestConfig {
        IngestConfig::extended()
            .with_seed(11)
            .with_reference_date(NaiveDate::from_ymd_opt(2024, 10, 16).unwrap())
    }

    fn row(cells: &[(&str, CellValue)]) -> RawRow {
        cells
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn full_row(name: &str) -> RawRow {
        row(&[
            ("Account Name", name.into()),
            ("Industry", "Retail".into()),
            ("Sales Category", "New Logo".into()),
            ("City", "Denver".into()),
            ("Territory Code", "CO-02".into()),
            ("Team", "West".into()),
            ("Sales Agent", "Priya".into()),
            ("Status", "Committed".into()),
            ("Forecasted TXN Start (Month)", "August".into()),
            ("Forecasted TXN Start (Year)", CellValue::Number(2024.0)),
            ("Years of Engagement", "3".into()),
            ("Monthly Sales Forecast", "$1,200,000".into()),
            ("Monthly TXN Forecast", CellValue::Number(300.0)),
        ])
    }

    #[test]
    fn test_full_row_is_parsed() {
        let config = config();
        let mut normalizer = RowNormalizer::new(&config);
        let (account, imputations) = normalizer.normalize_row(&full_row("Acme"), 1).unwrap();

        assert!(imputations.is_empty());
        assert_eq!(account.name, "Acme");
        assert_eq!(account.territory_code, "CO-02");
        assert_eq!(account.area, "West");
        assert_eq!(account.start_month, 8);
        assert_eq!(account.start_year, 2024);
        assert_eq!(account.years_of_engagement, 3);
        assert_eq!(account.end_year, 2026);
        assert_eq!(account.monthly_revenue, 1_200_000.0);
        assert_eq!(account.monthly_volume, 300.0);
        assert_eq!(account.base_revenue, 0.0);
    }

    #[test]
    fn test_missing_text_fields_use_defaults() {
        let config = config();
        let mut normalizer = RowNormalizer::new(&config);
        let sparse = row(&[
            ("Industry", CellValue::Number(5.0)),
            ("City", "   ".into()),
            ("Monthly Sales Forecast", "900000".into()),
        ]);
        let (account, _) = normalizer.normalize_row(&sparse, 7).unwrap();

        assert_eq!(account.name, "Account-7");
        assert_eq!(account.status, "Prospect");
        assert_eq!(account.industry, "Unknown");
        assert_eq!(account.city, "Unknown");
        assert_eq!(account.agent, "Unknown");
    }

    #[test]
    fn test_missing_revenue_falls_back_within_bounds() {
        let config = config();
        let mut normalizer = RowNormalizer::new(&config);
        let mut r = full_row("Beta");
        r.remove("Monthly Sales Forecast");
        let (account, imputations) = normalizer.normalize_row(&r, 2).unwrap();

        assert!(account.monthly_revenue.is_finite());
        assert!((500_000.0..=2_500_000.0).contains(&account.monthly_revenue));
        assert_eq!(imputations.len(), 1);
        assert_eq!(imputations[0].field, CanonicalField::MonthlyRevenue);
        assert_eq!(imputations[0].row, 2);
    }

    #[test]
    fn test_revenue_alias_used_when_primary_absent() {
        let config = config();
        let mut normalizer = RowNormalizer::new(&config);
        let mut r = full_row("Gamma");
        r.remove("Monthly Sales Forecast");
        r.insert("Monthly Revenue".to_string(), "75,000".into());
        let (account, imputations) = normalizer.normalize_row(&r, 1).unwrap();
        assert_eq!(account.monthly_revenue, 75_000.0);
        assert!(imputations.is_empty());
    }

    #[test]
    fn test_unparseable_month_uses_reference_month() {
        let config = config();
        let mut normalizer = RowNormalizer::new(&config);
        let mut r = full_row("Delta");
        r.insert("Forecasted TXN Start (Month)".to_string(), "TBD".into());
        let (account, _) = normalizer.normalize_row(&r, 1).unwrap();
        assert_eq!(account.start_month, 10);

        r.remove("Forecasted TXN Start (Month)");
        let (account, _) = normalizer.normalize_row(&r, 1).unwrap();
        assert_eq!(account.start_month, 10);
    }

    #[test]
    fn test_numeric_month_accepted() {
        let config = config();
        let mut normalizer = RowNormalizer::new(&config);
        let mut r = full_row("Echo");
        r.insert(
            "Forecasted TXN Start (Month)".to_string(),
            CellValue::Number(3.0),
        );
        let (account, _) = normalizer.normalize_row(&r, 1).unwrap();
        assert_eq!(account.start_month, 3);
    }

    #[test]
    fn test_missing_start_year_uses_reference_year() {
        let config = config();
        let mut normalizer = RowNormalizer::new(&config);
        let mut r = full_row("Foxtrot");
        r.insert("Forecasted TXN Start (Year)".to_string(), "unknown".into());
        r.insert("Years of Engagement".to_string(), CellValue::Empty);
        let (account, imputations) = normalizer.normalize_row(&r, 4).unwrap();
        assert_eq!(account.start_year, 2024);
        assert_eq!(account.years_of_engagement, 1);
        assert_eq!(account.end_year, 2024);
        assert_eq!(imputations.len(), 2);
    }

    #[test]
    fn test_start_year_out_of_range_is_row_error() {
        let config = config();
        let mut normalizer = RowNormalizer::new(&config);
        let mut r = full_row("Golf");
        r.insert(
            "Forecasted TXN Start (Year)".to_string(),
            CellValue::Number(45_000.0),
        );
        match normalizer.normalize_row(&r, 5) {
            Err(PipelineError::RowProcessing { row, .. }) => assert_eq!(row, 5),
            other => panic!("expected RowProcessing, got {:?}", other),
        }
    }

    #[test]
    fn test_reject_policy_skips_rows() {
        let mut config = config();
        config.fallbacks.monthly_revenue = Fallback::Reject;
        let mut missing = full_row("Hotel");
        missing.remove("Monthly Sales Forecast");
        let rows = vec![full_row("India"), missing];

        let batch = normalize_rows(&rows, &config).unwrap();
        assert_eq!(batch.accounts.len(), 1);
        assert_eq!(batch.skipped.len(), 1);
        assert_eq!(batch.skipped[0].row, 2);
        assert!(batch.skipped[0].reason.contains("MonthlyRevenue"));
    }

    #[test]
    fn test_all_rows_rejected_is_empty_result() {
        let mut config = config();
        config.fallbacks.monthly_revenue = Fallback::Reject;
        let rows = vec![row(&[("Account Name", "A".into())]), row(&[])];
        match normalize_rows(&rows, &config) {
            Err(PipelineError::EmptyResult { skipped }) => assert_eq!(skipped, 2),
            other => panic!("expected EmptyResult, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_names_keep_first_occurrence() {
        let config = config();
        let mut second = full_row("Acme");
        second.insert("Industry".to_string(), "Banking".into());
        let rows = vec![full_row("Acme"), second, full_row("Zulu")];

        let batch = normalize_rows(&rows, &config).unwrap();
        assert_eq!(batch.accounts.len(), 2);
        assert_eq!(batch.accounts[0].name, "Acme");
        assert_eq!(batch.accounts[0].industry, "Retail");
        assert_eq!(batch.accounts[1].name, "Zulu");
        assert_eq!(batch.skipped.len(), 1);
        assert!(batch.skipped[0].reason.contains("first seen on row 1"));
    }

    #[test]
    fn test_seeded_fallbacks_reproducible() {
        let config = config();
        let rows: Vec<RawRow> = (0..5)
            .map(|i| row(&[("Account Name", format!("Acct {}", i).as_str().into())]))
            .collect();
        let a = normalize_rows(&rows, &config).unwrap();
        let b = normalize_rows(&rows, &config).unwrap();
        assert_eq!(a.accounts, b.accounts);
        assert_eq!(a.imputations, b.imputations);
    }
}
