use crate::types::TableName;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Single-flight guards, one per destination table.
#[derive(Clone, Default)]
pub struct TableLocks {
    locks: Arc<DashMap<TableName, Arc<Mutex<()>>>>
}

impl TableLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `table` for one run, or returns `None` while another run holds it.
    pub fn try_acquire(&self, table: &TableName) -> Option<OwnedMutexGuard<()>> {
        let lock = self.locks
            .entry(table.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();

        lock.try_lock_owned().ok()
    }
}
