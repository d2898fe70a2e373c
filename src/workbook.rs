use crate::error::{PipelineError, Result};
use crate::schema::{CellValue, RawRow};
use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Range, Reader};
use log::{debug, info};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

/// Header row plus data rows of the first worksheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetRows {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

pub fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::String(v) => CellValue::Text(v.clone()),
        Data::Float(v) => CellValue::Number(*v),
        Data::Int(v) => CellValue::Number(*v as f64),
        Data::Bool(v) => CellValue::Bool(*v),
        Data::DateTime(v) => CellValue::Text(v.to_string()),
        Data::DateTimeIso(v) => CellValue::Text(v.clone()),
        Data::DurationIso(v) => CellValue::Text(v.clone()),
        Data::Error(v) => CellValue::Text(format!("{v:?}")),
        Data::Empty => CellValue::Empty,
    }
}

pub fn read_workbook_bytes(bytes: &[u8]) -> Result<SheetRows> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| PipelineError::ReadFailure(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| PipelineError::ReadFailure("workbook has no worksheets".to_string()))?
        .map_err(|e| PipelineError::ReadFailure(e.to_string()))?;
    Ok(sheet_rows(&range))
}

pub fn read_workbook_path(path: &Path) -> Result<SheetRows> {
    let mut workbook = open_workbook_auto(path).map_err(|e| {
        PipelineError::ReadFailure(format!("{}: {}", path.display(), e))
    })?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| {
            PipelineError::ReadFailure(format!("{}: workbook has no worksheets", path.display()))
        })?
        .map_err(|e| PipelineError::ReadFailure(format!("{}: {}", path.display(), e)))?;
    Ok(sheet_rows(&range))
}

/// First row is the header row. Blank headers drop their column; repeated headers
/// get a `_1`, `_2`, ... suffix. Entirely blank data rows are skipped.
pub fn sheet_rows(range: &Range<Data>) -> SheetRows {
    let mut rows_iter = range.rows();
    let Some(header_cells) = rows_iter.next() else {
        return SheetRows::default();
    };

    let mut seen: HashMap<String, usize> = HashMap::new();
    let columns: Vec<Option<String>> = header_cells
        .iter()
        .map(|cell| {
            let name = cell_value(cell).to_text().trim().to_string();
            if name.is_empty() {
                return None;
            }
            let count = seen.entry(name.clone()).or_insert(0);
            let unique = if *count == 0 {
                name.clone()
            } else {
                format!("{}_{}", name, count)
            };
            *count += 1;
            Some(unique)
        })
        .collect();

    let headers: Vec<String> = columns.iter().flatten().cloned().collect();

    let rows: Vec<RawRow> = rows_iter
        .filter(|cells| cells.iter().any(|c| !cell_value(c).is_blank()))
        .map(|cells| {
            columns
                .iter()
                .zip(cells.iter())
                .filter_map(|(column, cell)| column.as_ref().map(|name| (name.clone(), cell_value(cell))))
                .collect()
        })
        .collect();

    debug!("Header row: {:?}", headers);
    info!(
        "Read {} data rows and {} columns from first worksheet",
        rows.len(),
        headers.len()
    );

    SheetRows { headers, rows }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_value_mapping() {
        assert_eq!(cell_value(&Data::Int(7)), CellValue::Number(7.0));
        assert_eq!(cell_value(&Data::Float(2.5)), CellValue::Number(2.5));
        assert_eq!(
            cell_value(&Data::String("Retail".to_string())),
            CellValue::Text("Retail".to_string())
        );
        assert_eq!(cell_value(&Data::Empty), CellValue::Empty);
    }

    #[test]
    fn test_sheet_rows_headers_and_blanks() {
        let mut range: Range<Data> = Range::new((0, 0), (3, 3));
        range.set_value((0, 0), Data::String("Account Name".to_string()));
        range.set_value((0, 1), Data::String("Industry".to_string()));
        range.set_value((0, 2), Data::String("Industry".to_string()));
        range.set_value((1, 0), Data::String("Acme".to_string()));
        range.set_value((1, 1), Data::String("Retail".to_string()));
        range.set_value((1, 2), Data::String("Banking".to_string()));
        range.set_value((1, 3), Data::Float(99.0));
        range.set_value((3, 0), Data::String("Zulu".to_string()));

        let sheet = sheet_rows(&range);
        assert_eq!(sheet.headers, vec!["Account Name", "Industry", "Industry_1"]);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0]["Industry_1"], CellValue::Text("Banking".to_string()));
        assert_eq!(sheet.rows[0].len(), 3);
        assert_eq!(sheet.rows[1]["Account Name"], CellValue::Text("Zulu".to_string()));
    }

    #[test]
    fn test_empty_range() {
        let range: Range<Data> = Range::empty();
        assert_eq!(sheet_rows(&range), SheetRows::default());
    }

    #[test]
    fn test_garbage_bytes_are_read_failure() {
        match read_workbook_bytes(b"definitely not a spreadsheet") {
            Err(PipelineError::ReadFailure(_)) => {}
            other => panic!("expected ReadFailure, got {:?}", other),
        }
    }
}
