use crate::config::ModelConstants;
use crate::filter::Dimension;
use crate::schema::WeeklyRecord;
use crate::seasonality::{month_display_name, month_of_week};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum TimeGranularity {
    Weekly,
    Monthly,
    Yearly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "value")]
pub enum BucketKey {
    Week(u32),
    Month(u32),
    /// `None` when the input was empty.
    Year(Option<i32>),
    Category(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateBucket {
    pub key: BucketKey,
    /// Display form of the key ("Week 3", "March", "2024", "N/A", or the category value).
    pub label: String,
    pub revenue: f64,
    pub volume: f64,
}

impl AggregateBucket {
    pub fn month(&self) -> Option<u32> {
        match self.key {
            BucketKey::Month(month) => Some(month),
            _ => None,
        }
    }
}

pub fn group_by_time(
    records: &[WeeklyRecord],
    granularity: TimeGranularity,
    model: &ModelConstants,
) -> Vec<AggregateBucket> {
    match granularity {
        TimeGranularity::Weekly => sum_by(records, |r| r.week)
            .into_iter()
            .map(|(week, (revenue, volume))| AggregateBucket {
                key: BucketKey::Week(week),
                label: format!("Week {}", week),
                revenue,
                volume,
            })
            .collect(),
        TimeGranularity::Monthly => sum_by(records, |r| month_of_week(r.week, model))
            .into_iter()
            .map(|(month, (revenue, volume))| AggregateBucket {
                key: BucketKey::Month(month),
                label: month_display_name(month).to_string(),
                revenue,
                volume,
            })
            .collect(),
        TimeGranularity::Yearly => {
            let year = records.first().map(|r| r.year);
            vec![AggregateBucket {
                key: BucketKey::Year(year),
                label: year.map_or_else(|| "N/A".to_string(), |y| y.to_string()),
                revenue: records.iter().map(|r| r.revenue).sum(),
                volume: records.iter().map(|r| r.volume).sum(),
            }]
        }
    }
}

fn sum_by<K: Ord>(
    records: &[WeeklyRecord],
    key: impl Fn(&WeeklyRecord) -> K,
) -> BTreeMap<K, (f64, f64)> {
    let mut sums: BTreeMap<K, (f64, f64)> = BTreeMap::new();
    for record in records {
        let entry = sums.entry(key(record)).or_insert((0.0, 0.0));
        entry.0 += record.revenue;
        entry.1 += record.volume;
    }
    sums
}

/// One bucket per distinct value, highest revenue first. Ties keep encounter order.
pub fn group_by_key(records: &[WeeklyRecord], dimension: Dimension) -> Vec<AggregateBucket> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut buckets: Vec<AggregateBucket> = Vec::new();

    for record in records {
        let value = dimension.value_of(record);
        let idx = *index.entry(value).or_insert_with(|| {
            buckets.push(AggregateBucket {
                key: BucketKey::Category(value.to_string()),
                label: value.to_string(),
                revenue: 0.0,
                volume: 0.0,
            });
            buckets.len() - 1
        });
        buckets[idx].revenue += record.revenue;
        buckets[idx].volume += record.volume;
    }

    buckets.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));
    buckets
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentStatusRow {
    pub agent: String,
    /// Revenue per status; every status in the breakdown has an entry.
    pub revenue_by_status: BTreeMap<String, f64>,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentStatusBreakdown {
    /// Status columns in encounter order.
    pub statuses: Vec<String>,
    /// Agent rows in encounter order.
    pub rows: Vec<AgentStatusRow>,
}

/// Revenue per (agent, status) pair, for stacked-share charts.
pub fn status_by_agent(records: &[WeeklyRecord]) -> AgentStatusBreakdown {
    let mut statuses: Vec<String> = Vec::new();
    for record in records {
        if !statuses.contains(&record.status) {
            statuses.push(record.status.clone());
        }
    }

    let mut rows: Vec<AgentStatusRow> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for record in records {
        let idx = *index.entry(record.agent.as_str()).or_insert_with(|| {
            rows.push(AgentStatusRow {
                agent: record.agent.clone(),
                revenue_by_status: statuses.iter().map(|s| (s.clone(), 0.0)).collect(),
                total: 0.0,
            });
            rows.len() - 1
        });
        let row = &mut rows[idx];
        *row.revenue_by_status.entry(record.status.clone()).or_insert(0.0) += record.revenue;
        row.total += record.revenue;
    }

    AgentStatusBreakdown { statuses, rows }
}
