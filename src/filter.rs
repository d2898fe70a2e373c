use crate::schema::WeeklyRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const WILDCARD: &str = "all";

static UNCONSTRAINED: Selection = Selection::All;

/// Categorical attributes a weekly record can be filtered or grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Dimension {
    Account,
    Industry,
    SalesCategory,
    City,
    Area,
    TerritoryCode,
    Agent,
    Status,
}

impl Dimension {
    pub const ALL: [Dimension; 8] = [
        Dimension::Account,
        Dimension::Industry,
        Dimension::SalesCategory,
        Dimension::City,
        Dimension::Area,
        Dimension::TerritoryCode,
        Dimension::Agent,
        Dimension::Status,
    ];

    pub fn value_of<'r>(&self, record: &'r WeeklyRecord) -> &'r str {
        match self {
            Dimension::Account => &record.account,
            Dimension::Industry => &record.industry,
            Dimension::SalesCategory => &record.sales_category,
            Dimension::City => &record.city,
            Dimension::Area => &record.area,
            Dimension::TerritoryCode => &record.territory_code,
            Dimension::Agent => &record.agent,
            Dimension::Status => &record.status,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Account => "account",
            Dimension::Industry => "industry",
            Dimension::SalesCategory => "salesCategory",
            Dimension::City => "city",
            Dimension::Area => "area",
            Dimension::TerritoryCode => "territoryCode",
            Dimension::Agent => "agent",
            Dimension::Status => "status",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = String;

    /// Accepts camelCase, snake_case and a few UI synonyms ("team", "region").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "account" | "accountname" | "name" => Ok(Dimension::Account),
            "industry" => Ok(Dimension::Industry),
            "salescategory" | "category" => Ok(Dimension::SalesCategory),
            "city" => Ok(Dimension::City),
            "area" | "team" | "region" => Ok(Dimension::Area),
            "territorycode" | "territory" => Ok(Dimension::TerritoryCode),
            "agent" | "salesagent" => Ok(Dimension::Agent),
            "status" => Ok(Dimension::Status),
            _ => Err(format!("unknown dimension '{}'", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Selection {
    #[default]
    All,
    Value(String),
}

impl Selection {
    /// `"all"` in any case is the wildcard.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case(WILDCARD) {
            Selection::All
        } else {
            Selection::Value(value.to_string())
        }
    }

    pub fn admits(&self, value: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Value(selected) => selected == value,
        }
    }
}

/// Dimension constraints combined with logical AND. Unlisted dimensions are unconstrained.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterSet {
    selections: BTreeMap<Dimension, Selection>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, dimension: Dimension, value: &str) -> Self {
        self.set(dimension, value);
        self
    }

    pub fn set(&mut self, dimension: Dimension, value: &str) {
        self.selections.insert(dimension, Selection::parse(value));
    }

    /// Builds a filter from UI-style `name -> value` pairs.
    pub fn from_pairs<'a>(
        pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, String> {
        let mut filters = Self::new();
        for (name, value) in pairs {
            filters.set(name.parse()?, value);
        }
        Ok(filters)
    }

    pub fn selection(&self, dimension: Dimension) -> &Selection {
        self.selections.get(&dimension).unwrap_or(&UNCONSTRAINED)
    }

    pub fn is_unconstrained(&self) -> bool {
        self.selections.values().all(|s| *s == Selection::All)
    }

    pub fn matches(&self, record: &WeeklyRecord) -> bool {
        self.selections
            .iter()
            .all(|(dimension, selection)| selection.admits(dimension.value_of(record)))
    }

    pub fn apply(&self, records: &[WeeklyRecord]) -> Vec<WeeklyRecord> {
        records
            .iter()
            .filter(|r| self.matches(r))
            .cloned()
            .collect()
    }
}

pub fn filter_records(records: &[WeeklyRecord], filters: &FilterSet) -> Vec<WeeklyRecord> {
    filters.apply(records)
}
