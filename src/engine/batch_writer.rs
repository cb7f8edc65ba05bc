use crate::models::LedgerRow;
use crate::storage::{LedgerTransaction, StorageError, MAX_ROWS_PER_INSERT};
use tracing::info;

pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Batches larger than this cannot be sent as one bulk insert.
pub const MAX_BATCH_SIZE: usize = MAX_ROWS_PER_INSERT;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub batches: usize,
    pub inserted: u64
}

/// Inserts `rows` in consecutive chunks of `batch_size`, one bulk insert per chunk.
///
/// Chunks are written strictly in order and the first failure is returned as is;
/// nothing is retried.
pub async fn write_batches<T: LedgerTransaction>(transaction: &mut T, rows: &[LedgerRow], batch_size: usize) -> Result<BatchReport, StorageError> {
    let batch_size = batch_size.clamp(1, MAX_BATCH_SIZE);
    let total = rows.len().div_ceil(batch_size);
    let mut report = BatchReport::default();

    for (index, batch) in rows.chunks(batch_size).enumerate() {
        info!("Inserting batch {}/{} ({} rows)", index + 1, total, batch.len());

        report.inserted += transaction.insert_batch(batch).await?;
        report.batches += 1;
    }

    Ok(report)
}
