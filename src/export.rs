use crate::config::{CanonicalField, IngestConfig};
use crate::error::Result;
use crate::schema::WeeklyRecord;
use std::io::Write;

/// Which optional columns the export carries, following the column mapping in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportLayout {
    pub sales_category: bool,
    pub city: bool,
    pub territory_code: bool,
    pub engagement: bool,
}

impl ExportLayout {
    pub fn full() -> Self {
        Self {
            sales_category: true,
            city: true,
            territory_code: true,
            engagement: true,
        }
    }

    pub fn for_config(config: &IngestConfig) -> Self {
        Self {
            sales_category: config.has_field(CanonicalField::SalesCategory),
            city: config.has_field(CanonicalField::City),
            territory_code: config.has_field(CanonicalField::TerritoryCode),
            engagement: config.has_field(CanonicalField::StartYear)
                || config.has_field(CanonicalField::YearsOfEngagement),
        }
    }

    pub fn header(&self) -> Vec<&'static str> {
        let mut header = vec!["week", "year", "account", "industry"];
        if self.sales_category {
            header.push("salesCategory");
        }
        if self.city {
            header.push("city");
        }
        header.push("area");
        if self.territory_code {
            header.push("territoryCode");
        }
        header.extend(["agent", "status", "revenue", "volume"]);
        if self.engagement {
            header.extend(["startMonth", "startYear", "yearsOfEngagement", "endYear"]);
        }
        header
    }

    fn row(&self, record: &WeeklyRecord) -> Vec<String> {
        let mut row = vec![
            record.week.to_string(),
            record.year.to_string(),
            record.account.clone(),
            record.industry.clone(),
        ];
        if self.sales_category {
            row.push(record.sales_category.clone());
        }
        if self.city {
            row.push(record.city.clone());
        }
        row.push(record.area.clone());
        if self.territory_code {
            row.push(record.territory_code.clone());
        }
        row.push(record.agent.clone());
        row.push(record.status.clone());
        row.push(round_figure(record.revenue));
        row.push(round_figure(record.volume));
        if self.engagement {
            row.push(record.start_month.to_string());
            row.push(record.start_year.to_string());
            row.push(record.years_of_engagement.to_string());
            row.push(record.end_year.to_string());
        }
        row
    }
}

/// Nearest integer, halves away from zero.
fn round_figure(value: f64) -> String {
    format!("{}", value.round() as i64)
}

pub fn write_csv<W: Write>(writer: W, records: &[WeeklyRecord], layout: ExportLayout) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(layout.header())?;
    for record in records {
        csv_writer.write_record(layout.row(record))?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn to_csv_string(records: &[WeeklyRecord], layout: ExportLayout) -> Result<String> {
    let mut buffer = Vec::new();
    write_csv(&mut buffer, records, layout)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> WeeklyRecord {
        WeeklyRecord {
            week: 3,
            year: 2024,
            account: "Acme, Inc.".to_string(),
            industry: "Retail".to_string(),
            sales_category: "New".to_string(),
            city: "Austin".to_string(),
            area: "South".to_string(),
            territory_code: "TX-1".to_string(),
            agent: "Dana".to_string(),
            status: "Won".to_string(),
            revenue: 10_449.5,
            volume: 12.49,
            start_month: 2,
            start_year: 2024,
            years_of_engagement: 2,
            end_year: 2025,
        }
    }

    #[test]
    fn test_full_layout() {
        let csv = to_csv_string(&[record()], ExportLayout::full()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "week,year,account,industry,salesCategory,city,area,territoryCode,agent,status,revenue,volume,startMonth,startYear,yearsOfEngagement,endYear"
        );
        assert_eq!(
            lines.next().unwrap(),
            "3,2024,\"Acme, Inc.\",Retail,New,Austin,South,TX-1,Dana,Won,10450,12,2,2024,2,2025"
        );
    }

    #[test]
    fn test_compact_layout_follows_mapping() {
        let layout = ExportLayout::for_config(&IngestConfig::compact());
        assert_eq!(
            layout.header(),
            vec!["week", "year", "account", "industry", "area", "agent", "status", "revenue", "volume"]
        );
        let csv = to_csv_string(&[record()], layout).unwrap();
        assert!(csv.lines().nth(1).unwrap().ends_with("Dana,Won,10450,12"));
    }

    #[test]
    fn test_extended_layout_is_full() {
        assert_eq!(
            ExportLayout::for_config(&IngestConfig::extended()),
            ExportLayout::full()
        );
    }
}
