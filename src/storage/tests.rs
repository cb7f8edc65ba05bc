use super::{LedgerStore, LedgerTransaction, MemoryLedgerStore, MAX_ROWS_PER_INSERT, PARAMETERS_PER_ROW};
use crate::models::{LedgerRow, RawRecord};
use crate::types::{Delimiter, TableName};
use anyhow::Result;
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

fn create_row(card_code: &str, doc_date: Option<&str>) -> LedgerRow {
    let record = RawRecord {
        card_code: Some(card_code.to_string()),
        doc_date: doc_date.map(str::to_string),
        ..RawRecord::default()
    };

    LedgerRow::from_record(&record, Delimiter::Semicolon)
}

#[tokio::test]
async fn test_committed_rows_receive_sequential_ids() -> Result<()> {
    let storage = MemoryLedgerStore::default();

    let mut transaction = storage.begin().await?;
    transaction.insert_batch(&[create_row("C001", None), create_row("C002", None)]).await?;
    transaction.commit().await?;

    let rows = storage.snapshot();

    assert_eq!(storage.count().await?, 2);
    assert_eq!(rows.iter().map(|stored| stored.id).collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(rows[1].row.card_code.as_deref(), Some("C002"));

    Ok(())
}

#[tokio::test]
async fn test_uncommitted_changes_are_invisible_and_discarded_on_rollback() -> Result<()> {
    let storage = MemoryLedgerStore::default();

    let mut transaction = storage.begin().await?;
    transaction.insert_batch(&[create_row("C001", None)]).await?;
    transaction.commit().await?;

    let mut transaction = storage.begin().await?;
    assert_eq!(transaction.delete_all().await?, 1);
    transaction.insert_batch(&[create_row("C009", None)]).await?;

    assert_eq!(storage.snapshot()[0].row.card_code.as_deref(), Some("C001"));

    transaction.rollback().await?;

    let rows = storage.snapshot();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].row.card_code.as_deref(), Some("C001"));

    Ok(())
}

#[tokio::test]
async fn test_sequence_reset_restarts_ids_after_delete() -> Result<()> {
    let storage = MemoryLedgerStore::default();

    let mut transaction = storage.begin().await?;
    transaction.insert_batch(&[create_row("C001", None), create_row("C002", None)]).await?;
    transaction.commit().await?;

    let mut transaction = storage.begin().await?;
    transaction.delete_all().await?;
    transaction.insert_batch(&[create_row("C003", None)]).await?;
    transaction.commit().await?;
    assert_eq!(storage.snapshot()[0].id, 3);

    let mut transaction = storage.begin().await?;
    transaction.delete_all().await?;
    transaction.reset_sequence().await?;
    transaction.insert_batch(&[create_row("C004", None)]).await?;
    transaction.commit().await?;
    assert_eq!(storage.snapshot()[0].id, 1);

    Ok(())
}

#[tokio::test]
async fn test_writers_are_serialized() -> Result<()> {
    let storage = Arc::new(MemoryLedgerStore::default());
    let first = storage.begin().await?;

    assert!(timeout(Duration::from_millis(50), storage.begin()).await.is_err());

    first.rollback().await?;

    assert!(timeout(Duration::from_millis(50), storage.begin()).await.is_ok());

    Ok(())
}

#[tokio::test]
async fn test_customer_query_is_case_insensitive_and_newest_first() -> Result<()> {
    let storage = MemoryLedgerStore::new(TableName::new("cartera_test")?);

    let mut transaction = storage.begin().await?;
    transaction.insert_batch(&[
        create_row("C001", Some("01/01/2024")),
        create_row("C002", Some("01/02/2024")),
        create_row("c001", None),
        create_row("C001", Some("01/03/2024"))
    ]).await?;
    transaction.commit().await?;

    let rows = storage.rows_for_customer("C001").await?;
    let dates: Vec<Option<NaiveDate>> = rows.iter().map(|stored| stored.row.doc_date).collect();

    assert_eq!(storage.table().to_string(), "cartera_test");
    assert_eq!(dates, vec![NaiveDate::from_ymd_opt(2024, 3, 1), NaiveDate::from_ymd_opt(2024, 1, 1), None]);
    assert!(storage.rows_for_customer("C404").await?.is_empty());

    Ok(())
}

#[test]
fn test_bulk_insert_limit_fits_postgres_bind_parameters() {
    assert_eq!(MAX_ROWS_PER_INSERT, 4095);
    assert!(MAX_ROWS_PER_INSERT * PARAMETERS_PER_ROW <= u16::MAX as usize);
    assert!((MAX_ROWS_PER_INSERT + 1) * PARAMETERS_PER_ROW > u16::MAX as usize);
}
