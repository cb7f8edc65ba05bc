use crate::models::{LedgerRow, StoredLedgerRow};
use crate::storage::{LedgerStore, LedgerTransaction, StorageError};
use crate::types::TableName;
use async_trait::async_trait;
use dashmap::DashMap;
use std::cmp::Reverse;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Process-local ledger table.
///
/// Used when no database is configured and by the test suite. Transactions
/// stage their changes against a snapshot and publish them on commit.
pub struct MemoryLedgerStore {
    table: TableName,
    rows: Arc<DashMap<i32, LedgerRow>>,
    next_id: Arc<AtomicI32>,
    writer: Arc<Mutex<()>>
}

impl MemoryLedgerStore {
    pub fn new(table: TableName) -> Self {
        Self {
            table,
            rows: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicI32::new(1)),
            writer: Arc::new(Mutex::new(()))
        }
    }

    /// All committed rows in identity order.
    pub fn snapshot(&self) -> Vec<StoredLedgerRow> {
        let mut rows: Vec<StoredLedgerRow> = self.rows.iter()
            .map(|entry| StoredLedgerRow { id: *entry.key(), row: entry.value().clone() })
            .collect();

        rows.sort_by_key(|stored| stored.id);
        rows
    }
}

impl Default for MemoryLedgerStore {
    fn default() -> Self {
        Self::new(TableName::default())
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    type Transaction = MemoryTransaction;

    fn table(&self) -> &TableName {
        &self.table
    }

    async fn begin(&self) -> Result<MemoryTransaction, StorageError> {
        let guard = self.writer.clone().lock_owned().await;

        Ok(MemoryTransaction {
            _guard: guard,
            rows: self.rows.clone(),
            next_id: self.next_id.clone(),
            staged: self.snapshot(),
            staged_next_id: self.next_id.load(Ordering::SeqCst)
        })
    }

    async fn count(&self) -> Result<u64, StorageError> {
        Ok(self.rows.len() as u64)
    }

    async fn rows_for_customer(&self, card_code: &str) -> Result<Vec<StoredLedgerRow>, StorageError> {
        let mut rows: Vec<StoredLedgerRow> = self.snapshot()
            .into_iter()
            .filter(|stored| {
                stored.row.card_code.as_deref()
                    .is_some_and(|code| code.eq_ignore_ascii_case(card_code))
            })
            .collect();

        // Newest document first, undated documents last.
        rows.sort_by_key(|stored| (stored.row.doc_date.is_none(), Reverse(stored.row.doc_date), stored.id));

        Ok(rows)
    }
}

pub struct MemoryTransaction {
    _guard: OwnedMutexGuard<()>,
    rows: Arc<DashMap<i32, LedgerRow>>,
    next_id: Arc<AtomicI32>,
    staged: Vec<StoredLedgerRow>,
    staged_next_id: i32
}

#[async_trait]
impl LedgerTransaction for MemoryTransaction {
    async fn delete_all(&mut self) -> Result<u64, StorageError> {
        let deleted = self.staged.len() as u64;
        self.staged.clear();

        Ok(deleted)
    }

    async fn reset_sequence(&mut self) -> Result<(), StorageError> {
        self.staged_next_id = 1;

        Ok(())
    }

    async fn insert_batch(&mut self, rows: &[LedgerRow]) -> Result<u64, StorageError> {
        for row in rows {
            let id = self.staged_next_id;
            self.staged_next_id = id.checked_add(1)
                .ok_or_else(|| StorageError::Unavailable("Identity sequence exhausted".to_string()))?;
            self.staged.push(StoredLedgerRow { id, row: row.clone() });
        }

        Ok(rows.len() as u64)
    }

    async fn commit(self) -> Result<(), StorageError> {
        self.rows.clear();

        for stored in self.staged {
            self.rows.insert(stored.id, stored.row);
        }

        self.next_id.store(self.staged_next_id, Ordering::SeqCst);

        Ok(())
    }

    async fn rollback(self) -> Result<(), StorageError> {
        Ok(())
    }
}
