use crate::engine::parser::{sample, CsvSample};
use crate::models::FormatValidationError;
use crate::types::Delimiter;

/// Columns every ledger export must carry.
pub const REQUIRED_COLUMNS: [&str; 4] = ["DocEntry", "CardCode", "CardName", "DocNum"];

const SAMPLE_DATA_LINES: usize = 2;

/// Checks that `delimiter` splits the file into the expected columns by
/// reading only its first few lines, before anything expensive or destructive runs.
pub fn validate_format(content: &str, delimiter: Delimiter) -> Result<CsvSample, FormatValidationError> {
    let sample = sample(content, delimiter, SAMPLE_DATA_LINES).map_err(FormatValidationError::Unreadable)?;

    if sample.rows == 0 {
        return Err(FormatValidationError::NoDataRows);
    }

    let missing: Vec<String> = REQUIRED_COLUMNS.into_iter()
        .filter(|required| !sample.columns.iter().any(|column| column == *required))
        .map(str::to_string)
        .collect();

    if !missing.is_empty() {
        return Err(FormatValidationError::MissingColumns {
            missing,
            detected: sample.columns
        });
    }

    Ok(sample)
}
