use crate::config::CanonicalField;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single spreadsheet cell as read from the workbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Empty,
}

impl CellValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Cell contents rendered as text, the way a spreadsheet would display it.
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Empty => String::new(),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

/// Header name to cell value, one per data row.
pub type RawRow = BTreeMap<String, CellValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub name: String,
    pub industry: String,
    pub sales_category: String,
    pub city: String,
    pub territory_code: String,
    #[schemars(description = "Team or region the account belongs to")]
    pub area: String,
    pub agent: String,
    pub status: String,
    pub start_month: u32,
    pub start_year: i32,
    pub years_of_engagement: u32,
    #[schemars(description = "start_year + years_of_engagement - 1")]
    pub end_year: i32,
    #[schemars(description = "Committed monthly revenue after cleaning or fallback")]
    pub monthly_revenue: f64,
    #[schemars(description = "Committed monthly volume after cleaning or fallback")]
    pub monthly_volume: f64,
    #[schemars(description = "Sum of this account's weekly revenue, set once by the expander")]
    pub base_revenue: f64,
    #[schemars(description = "Sum of this account's weekly volume, set once by the expander")]
    pub base_volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyRecord {
    pub week: u32,
    pub year: i32,
    pub account: String,
    pub industry: String,
    pub sales_category: String,
    pub city: String,
    pub area: String,
    pub territory_code: String,
    pub agent: String,
    pub status: String,
    pub revenue: f64,
    pub volume: f64,
    pub start_month: u32,
    pub start_year: i32,
    pub years_of_engagement: u32,
    pub end_year: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DatasetMeta {
    pub industries: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sales_categories: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cities: Option<Vec<String>>,
    pub areas: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub territory_codes: Option<Vec<String>>,
    pub agents: Vec<String>,
    pub statuses: Vec<String>,
    pub year: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub min_week: u32,
    pub max_week: u32,
    pub years: Vec<i32>,
}

/// A row that was skipped, with its 1-based position among the data rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RowDiagnostic {
    pub row: usize,
    pub reason: String,
}

/// A numeric value that was substituted because the cell was missing or unusable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Imputation {
    pub row: usize,
    pub field: CanonicalField,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IngestInfo {
    pub total_rows: usize,
    pub original_columns: Vec<String>,
    pub date_range: DateRange,
    pub skipped_rows: Vec<RowDiagnostic>,
    pub imputations: Vec<Imputation>,
}

/// The result of one ingestion pass. Replaced wholesale on the next upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PipelineDataset {
    pub weekly: Vec<WeeklyRecord>,
    pub accounts: Vec<Account>,
    pub meta: DatasetMeta,
    pub info: IngestInfo,
}

impl PipelineDataset {
    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = schemars::schema_for!(PipelineDataset);
        serde_json::to_string_pretty(&schema)
    }

    pub fn total_revenue(&self) -> f64 {
        self.weekly.iter().map(|r| r.revenue).sum()
    }

    pub fn total_volume(&self) -> f64 {
        self.weekly.iter().map(|r| r.volume).sum()
    }
}
