mod errors;
mod memory_storage;
mod postgres_storage;
#[cfg(test)]
mod tests;

use async_trait::async_trait;

use crate::models::{LedgerRow, StoredLedgerRow};
use crate::types::TableName;

pub use errors::StorageError;
pub use memory_storage::MemoryLedgerStore;
pub use postgres_storage::PostgresLedgerStore;

/// Bind parameters one ledger row takes in a bulk insert.
const PARAMETERS_PER_ROW: usize = 16;

/// Most rows a single bulk insert may carry; PostgreSQL caps a statement at 65535 bind parameters.
pub const MAX_ROWS_PER_INSERT: usize = u16::MAX as usize / PARAMETERS_PER_ROW;

/// Destination table for ledger imports.
#[async_trait]
pub trait LedgerStore: Send + Sync + 'static {
    type Transaction: LedgerTransaction;

    fn table(&self) -> &TableName;

    /// Opens a write transaction; writers on the same table are serialized.
    async fn begin(&self) -> Result<Self::Transaction, StorageError>;

    async fn count(&self) -> Result<u64, StorageError>;

    /// Rows for one customer (case-insensitive code match), newest document first.
    async fn rows_for_customer(&self, card_code: &str) -> Result<Vec<StoredLedgerRow>, StorageError>;
}

/// Writes staged by a [`LedgerStore`] and published only on `commit`.
#[async_trait]
pub trait LedgerTransaction: Send {
    /// Removes every row, returning how many were removed.
    async fn delete_all(&mut self) -> Result<u64, StorageError>;

    /// Restarts the primary-key sequence at 1.
    async fn reset_sequence(&mut self) -> Result<(), StorageError>;

    /// Inserts `rows` in one bulk operation, preserving their order.
    async fn insert_batch(&mut self, rows: &[LedgerRow]) -> Result<u64, StorageError>;

    async fn commit(self) -> Result<(), StorageError>;

    async fn rollback(self) -> Result<(), StorageError>;
}
