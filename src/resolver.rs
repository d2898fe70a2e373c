use crate::config::IngestConfig;
use crate::error::{PipelineError, Result};
use log::{debug, info};

/// Outcome of a successful header check.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnResolution {
    /// Canonical headers that matched at least one workbook header.
    pub matched: Vec<String>,
    pub available: Vec<String>,
}

/// Case-insensitive containment in either direction. Blank headers never match.
pub fn headers_match(canonical: &str, present: &str) -> bool {
    let canonical = canonical.trim().to_lowercase();
    let present = present.trim().to_lowercase();
    if canonical.is_empty() || present.is_empty() {
        return false;
    }
    present.contains(&canonical) || canonical.contains(&present)
}

/// Checks that enough canonical headers are recognizable before committing to a parse.
///
/// A pass only certifies the workbook is probably in the expected shape; the
/// normalizer still looks fields up by exact name and degrades per field.
pub fn resolve_columns(headers: &[String], config: &IngestConfig) -> Result<ColumnResolution> {
    let matched: Vec<String> = config
        .columns
        .iter()
        .filter(|mapping| headers.iter().any(|h| headers_match(&mapping.header, h)))
        .map(|mapping| mapping.header.clone())
        .collect();

    debug!(
        "Resolved {}/{} canonical headers against {} workbook headers",
        matched.len(),
        config.columns.len(),
        headers.len()
    );

    if matched.len() < config.match_threshold {
        return Err(PipelineError::InsufficientColumns {
            required: config.match_threshold,
            matched,
            available: headers.to_vec(),
        });
    }

    info!("Column check passed with {} recognized headers", matched.len());

    Ok(ColumnResolution {
        matched,
        available: headers.to_vec(),
    })
}
