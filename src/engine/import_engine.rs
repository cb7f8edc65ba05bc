use crate::engine::batch_writer::{write_batches, DEFAULT_BATCH_SIZE, MAX_BATCH_SIZE};
use crate::engine::parser::{parse_records, strip_byte_order_mark};
use crate::engine::table_lock::TableLocks;
use crate::engine::validator::validate_format;
use crate::models::{ImportError, ImportStage, InputRejection, LedgerRow};
use crate::storage::{LedgerStore, LedgerTransaction, StorageError};
use crate::types::Delimiter;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::spawn_blocking;
use tracing::{debug, error, info, instrument, warn};

const ACCEPTED_EXTENSION: &str = ".csv";

/// A ledger file submitted for import.
#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub file_name: String,
    /// Delimiter exactly as supplied; checked when the run starts.
    pub delimiter: String,
    pub content: String
}

impl ImportRequest {
    pub fn new(file_name: impl Into<String>, delimiter: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            delimiter: delimiter.into(),
            content: content.into()
        }
    }

    /// Builds a request from raw file bytes, rejecting content that is not UTF-8 text.
    pub fn from_bytes(file_name: impl Into<String>, delimiter: impl Into<String>, bytes: Vec<u8>) -> Result<Self, ImportError> {
        let content = String::from_utf8(bytes).map_err(|_| InputRejection::NotTextual)?;

        Ok(Self::new(file_name, delimiter, content))
    }

    fn check(&self) -> Result<Delimiter, InputRejection> {
        if !self.file_name.to_lowercase().ends_with(ACCEPTED_EXTENSION) {
            return Err(InputRejection::InvalidExtension(self.file_name.clone()));
        }

        let delimiter = self.delimiter.parse::<Delimiter>()?;

        if self.content.trim().is_empty() {
            return Err(InputRejection::EmptyContent);
        }

        Ok(delimiter)
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub table: String,
    pub file_name: String,
    pub delimiter: Delimiter,
    pub read: usize,
    pub inserted: u64,
    pub deleted: u64,
    pub sequence_reset: bool,
    pub batches: usize,
    /// Milliseconds.
    #[serde(rename = "elapsed", serialize_with = "serialize_millis")]
    pub elapsed: Duration
}

fn serialize_millis<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// Replace-and-load pipeline for a single ledger table.
///
/// A run validates the file, parses and maps it entirely in memory, and only
/// then replaces the table contents inside one storage transaction. Any failure
/// before the commit leaves the table as it was.
pub struct ImportEngine<S: LedgerStore> {
    storage: Arc<S>,
    batch_size: usize,
    locks: TableLocks
}

impl<S: LedgerStore> ImportEngine<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            batch_size: DEFAULT_BATCH_SIZE,
            locks: TableLocks::new()
        }
    }

    /// Sets the rows per bulk insert, clamped to `1..=MAX_BATCH_SIZE`.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        if batch_size > MAX_BATCH_SIZE {
            warn!("Batch size {batch_size} exceeds the bulk insert limit, using {MAX_BATCH_SIZE}");
        }

        self.batch_size = batch_size.clamp(1, MAX_BATCH_SIZE);
        self
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    /// Runs one import end to end.
    ///
    /// Concurrent runs against the same table are rejected with
    /// [`ImportError::ImportInProgress`] rather than interleaved.
    #[instrument(skip_all, fields(table = %self.storage.table(), file_name = %request.file_name, delimiter = ?request.delimiter))]
    pub async fn run(&self, request: ImportRequest) -> Result<ImportSummary, ImportError> {
        let timer = Instant::now();
        let mut stage = ImportStage::Received;

        let result = self.execute(request, &mut stage, timer).await;

        if let Err(error) = &result {
            let failed_at = stage;
            advance(&mut stage, ImportStage::Error);

            if failed_at.is_destructive() {
                error!("Import failed while {failed_at}; previous table contents were kept: {error}");
            } else {
                error!("Import failed while {failed_at}; table untouched: {error}");
            }
        }

        result
    }

    async fn execute(&self, mut request: ImportRequest, stage: &mut ImportStage, timer: Instant) -> Result<ImportSummary, ImportError> {
        let delimiter = request.check()?;
        let table = self.storage.table().clone();

        let _guard = self.locks.try_acquire(&table)
            .ok_or_else(|| ImportError::ImportInProgress { table: table.clone() })?;

        strip_byte_order_mark(&mut request.content);

        advance(stage, ImportStage::Validating);
        let sample = validate_format(&request.content, delimiter)
            .map_err(|source| ImportError::FormatValidation { delimiter, source })?;
        info!("Format validated: {} sample rows, {} columns", sample.rows, sample.columns.len());
        advance(stage, ImportStage::Validated);

        advance(stage, ImportStage::Parsing);
        let content = request.content;
        let records = spawn_blocking(move || parse_records(&content, delimiter))
            .await
            .map_err(|error| ImportError::Internal { stage: ImportStage::Parsing, detail: error.to_string() })?
            .map_err(ImportError::Parse)?;
        info!("Parsed {} rows", records.len());
        advance(stage, ImportStage::Parsed);

        advance(stage, ImportStage::Mapping);
        let rows: Vec<LedgerRow> = records.iter()
            .map(|record| LedgerRow::from_record(record, delimiter))
            .filter(LedgerRow::is_retained)
            .collect();

        if rows.is_empty() {
            return Err(ImportError::EmptyResult);
        }

        info!("{} valid rows ready to insert ({} discarded)", rows.len(), records.len() - rows.len());
        advance(stage, ImportStage::Mapped);

        advance(stage, ImportStage::Clearing);
        let mut transaction = self.storage.begin().await
            .map_err(|source| ImportError::storage(ImportStage::Clearing, source))?;

        let deleted = match transaction.delete_all().await {
            Ok(deleted) => deleted,
            Err(source) => return Err(abandon(transaction, ImportStage::Clearing, source).await)
        };
        info!("Deleted {deleted} existing rows from [{table}]");
        advance(stage, ImportStage::Cleared);

        let sequence_reset = match transaction.reset_sequence().await {
            Ok(()) => {
                debug!("Identity sequence for [{table}] restarted at 1");
                true
            }
            Err(error) => {
                warn!("Could not reset the identity sequence for [{table}], ids will continue from the last value: {error}");
                false
            }
        };

        advance(stage, ImportStage::Loading);
        let report = match write_batches(&mut transaction, &rows, self.batch_size).await {
            Ok(report) => report,
            Err(source) => return Err(abandon(transaction, ImportStage::Loading, source).await)
        };

        transaction.commit().await
            .map_err(|source| ImportError::storage(ImportStage::Loading, source))?;
        advance(stage, ImportStage::Done);

        let elapsed = timer.elapsed();
        info!("Import into [{table}] completed in {elapsed:?}: {} rows in {} batches", report.inserted, report.batches);

        Ok(ImportSummary {
            table: table.to_string(),
            file_name: request.file_name,
            delimiter,
            read: records.len(),
            inserted: report.inserted,
            deleted,
            sequence_reset,
            batches: report.batches,
            elapsed
        })
    }
}

fn advance(stage: &mut ImportStage, next: ImportStage) {
    debug!("Import stage {stage} -> {next}");
    *stage = next;
}

/// Rolls back after a storage failure and converts it into the run's error.
async fn abandon<T: LedgerTransaction>(transaction: T, stage: ImportStage, source: StorageError) -> ImportError {
    if let Err(rollback_error) = transaction.rollback().await {
        error!("Rollback after failure while {stage} also failed: {rollback_error}");
    }

    ImportError::storage(stage, source)
}
