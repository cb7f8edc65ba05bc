use crate::models::ImportStage;
use crate::storage::StorageError;
use crate::types::{Delimiter, DelimiterError, TableName};
use thiserror::Error;

const DETECTED_COLUMN_PREVIEW: usize = 5;

fn column_list(columns: &[String]) -> String {
    columns.join(", ")
}

fn detected_preview(columns: &[String]) -> String {
    let preview = column_list(&columns[..columns.len().min(DETECTED_COLUMN_PREVIEW)]);

    if columns.len() > DETECTED_COLUMN_PREVIEW {
        format!("{preview}...")
    } else {
        preview
    }
}

/// Request-level problems caught before any CSV parsing.
#[derive(Debug, Error)]
pub enum InputRejection {
    #[error("A valid .csv file must be attached (received [{0}])")]
    InvalidExtension(String),
    #[error(transparent)]
    Delimiter(#[from] DelimiterError),
    #[error("CSV content is empty")]
    EmptyContent,
    #[error("CSV content is not text")]
    NotTextual
}

/// Outcome of sampling the header and first rows with the chosen delimiter.
#[derive(Debug, Error)]
pub enum FormatValidationError {
    #[error("No data rows were detected with the selected delimiter")]
    NoDataRows,
    #[error("Required columns not found: {}. Check the delimiter. Detected columns: {}", column_list(.missing), detected_preview(.detected))]
    MissingColumns {
        missing: Vec<String>,
        detected: Vec<String>
    },
    #[error("Sample rows could not be read: {0}")]
    Unreadable(#[source] csv::Error)
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("{0}")]
    InputRejected(#[from] InputRejection),
    #[error("The CSV file is not valid with the selected delimiter ({:?}): {source}", .delimiter.as_char())]
    FormatValidation {
        delimiter: Delimiter,
        #[source]
        source: FormatValidationError
    },
    #[error("Error processing the CSV file: {0}")]
    Parse(#[source] csv::Error),
    #[error("No valid rows found to import")]
    EmptyResult,
    #[error("An import into table [{table}] is already in progress")]
    ImportInProgress {
        table: TableName
    },
    #[error("Storage failure while {stage}: {source}")]
    Storage {
        stage: ImportStage,
        #[source]
        source: StorageError
    },
    #[error("Import task failed while {stage}: {detail}")]
    Internal {
        stage: ImportStage,
        detail: String
    }
}

impl ImportError {
    pub fn storage(stage: ImportStage, source: StorageError) -> Self {
        Self::Storage { stage, source }
    }

    /// Short, operator-facing summary of what went wrong.
    pub fn message(&self) -> String {
        match self {
            Self::InputRejected(rejection) => rejection.to_string(),
            Self::FormatValidation { delimiter, .. } => {
                format!("The CSV file is not valid with the selected delimiter ({:?})", delimiter.as_char())
            }
            Self::Parse(_) => "Error processing the CSV file".to_string(),
            Self::EmptyResult => "No valid rows found to import".to_string(),
            Self::ImportInProgress { .. } => self.to_string(),
            Self::Storage { .. } | Self::Internal { .. } => "Failed to import the ledger".to_string()
        }
    }

    /// The underlying failure, when there is one worth showing.
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::InputRejected(_) | Self::ImportInProgress { .. } => None,
            Self::FormatValidation { source, .. } => Some(source.to_string()),
            Self::Parse(error) => Some(error.to_string()),
            Self::EmptyResult => Some("Check that the CSV contains at least CardCode or CardName".to_string()),
            Self::Storage { source, .. } => Some(source.to_string()),
            Self::Internal { detail, .. } => Some(detail.clone())
        }
    }

    /// Stage of the run at which the error surfaced.
    pub fn stage(&self) -> ImportStage {
        match self {
            Self::InputRejected(_) | Self::ImportInProgress { .. } => ImportStage::Received,
            Self::FormatValidation { .. } => ImportStage::Validating,
            Self::Parse(_) => ImportStage::Parsing,
            Self::EmptyResult => ImportStage::Mapping,
            Self::Storage { stage, .. } | Self::Internal { stage, .. } => *stage
        }
    }

    /// Whether the caller can fix the failure by correcting the submitted file.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InputRejected(_) | Self::FormatValidation { .. } | Self::Parse(_) | Self::EmptyResult
        )
    }
}
