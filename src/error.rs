use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("The workbook contains no data rows")]
    EmptyInput,

    #[error(
        "Only {} of the expected columns were recognized (need at least {required}). Matched: [{}]. Available: [{}]",
        matched.len(),
        matched.join(", "),
        available.join(", ")
    )]
    InsufficientColumns {
        required: usize,
        matched: Vec<String>,
        available: Vec<String>,
    },

    #[error("Row {row} could not be processed: {reason}")]
    RowProcessing { row: usize, reason: String },

    #[error("No usable accounts remained after processing ({skipped} rows skipped)")]
    EmptyResult { skipped: usize },

    #[error("Failed to read workbook: {0}")]
    ReadFailure(String),

    #[error("Invalid ingest configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid scenario parameters: {0}")]
    InvalidScenario(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV export error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_columns_message_lists_headers() {
        let err = PipelineError::InsufficientColumns {
            required: 3,
            matched: vec!["Industry".to_string()],
            available: vec!["Industry".to_string(), "Notes".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("Only 1 of the expected columns"));
        assert!(msg.contains("need at least 3"));
        assert!(msg.contains("Industry, Notes"));
    }

    #[test]
    fn test_row_processing_message_is_one_based() {
        let err = PipelineError::RowProcessing {
            row: 4,
            reason: "bad start year".to_string(),
        };
        assert_eq!(err.to_string(), "Row 4 could not be processed: bad start year");
    }
}
