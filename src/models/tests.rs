use super::ledger_row::IN_TRANSIT_STATUS;
use super::{FormatValidationError, ImportError, ImportStage, InputRejection, LedgerRow, RawRecord};

use std::str::FromStr;

use anyhow::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::storage::StorageError;
use crate::types::{Delimiter, DelimiterError};

fn create_record(card_code: Option<&str>, card_name: Option<&str>, doc_total: Option<&str>) -> RawRecord {
    RawRecord {
        doc_entry: Some("17".to_string()),
        card_code: card_code.map(str::to_string),
        card_name: card_name.map(str::to_string),
        doc_num: Some("5001".to_string()),
        doc_total: doc_total.map(str::to_string),
        ..RawRecord::default()
    }
}

#[test]
fn test_mapping_a_full_record_coerces_every_field() -> Result<()> {
    let record = RawRecord {
        doc_entry: Some("1".to_string()),
        card_code: Some("C001".to_string()),
        card_name: Some("Acme".to_string()),
        doc_num: Some("9007199254740993".to_string()),
        folio_num: Some("FV-0001".to_string()),
        doc_due_date: Some("15/04/2024".to_string()),
        doc_date: Some("16/03/2024".to_string()),
        tax_date: Some("2024-03-16".to_string()),
        num_at_card: Some("PO-778".to_string()),
        doc_total: Some("1.234,56".to_string()),
        clase: Some("Factura".to_string()),
        dias_pendientes: Some("12".to_string()),
        comments: Some("Export lot 3".to_string()),
        saldo_vencido: Some("200,5".to_string()),
        tipo_cliente: Some("Nacional".to_string())
    };

    let row = LedgerRow::from_record(&record, Delimiter::Semicolon);

    assert_eq!(row.doc_entry, Some(1));
    assert_eq!(row.card_code.as_deref(), Some("C001"));
    assert_eq!(row.card_name.as_deref(), Some("Acme"));
    assert_eq!(row.doc_num, Some(9_007_199_254_740_993));
    assert_eq!(row.folio_num.as_deref(), Some("FV-0001"));
    assert_eq!(row.doc_due_date, NaiveDate::from_ymd_opt(2024, 4, 15));
    assert_eq!(row.doc_date, NaiveDate::from_ymd_opt(2024, 3, 16));
    assert_eq!(row.tax_date, NaiveDate::from_ymd_opt(2024, 3, 16));
    assert_eq!(row.po.as_deref(), Some("PO-778"));
    assert_eq!(row.doc_total, Some(Decimal::from_str("1234.56")?));
    assert_eq!(row.clase.as_deref(), Some("Factura"));
    assert_eq!(row.dias_pendientes, Some(12));
    assert_eq!(row.comments.as_deref(), Some("Export lot 3"));
    assert_eq!(row.saldo_vencido, Some(Decimal::from_str("200.5")?));
    assert_eq!(row.tipo_cliente.as_deref(), Some("Nacional"));
    assert_eq!(row.status, IN_TRANSIT_STATUS);

    Ok(())
}

#[test]
fn test_mapping_uses_us_decimals_for_comma_delimited_files() -> Result<()> {
    let record = create_record(Some("C001"), None, Some("1,234.56"));
    let row = LedgerRow::from_record(&record, Delimiter::Comma);

    assert_eq!(row.doc_total, Some(Decimal::from_str("1234.56")?));

    Ok(())
}

#[test]
fn test_mapping_an_empty_record_yields_nulls_and_fixed_status() {
    let row = LedgerRow::from_record(&RawRecord::default(), Delimiter::Pipe);

    assert_eq!(row.doc_entry, None);
    assert_eq!(row.card_code, None);
    assert_eq!(row.doc_num, None);
    assert_eq!(row.doc_date, None);
    assert_eq!(row.doc_total, None);
    assert_eq!(row.status, IN_TRANSIT_STATUS);
    assert!(!row.is_retained());
}

#[test]
fn test_blank_customer_fields_are_treated_as_missing() {
    let row = LedgerRow::from_record(&create_record(Some("   "), Some(""), Some("10")), Delimiter::Semicolon);

    assert_eq!(row.card_code, None);
    assert_eq!(row.card_name, None);
    assert!(!row.is_retained());
}

#[test]
fn test_either_customer_field_retains_the_row() {
    assert!(LedgerRow::from_record(&create_record(Some("C001"), None, None), Delimiter::Semicolon).is_retained());
    assert!(LedgerRow::from_record(&create_record(None, Some("Acme"), None), Delimiter::Semicolon).is_retained());
}

#[test]
fn test_days_outstanding_prefers_exported_value() -> Result<()> {
    let today = NaiveDate::from_ymd_opt(2024, 5, 1).ok_or_else(|| anyhow::anyhow!("invalid date"))?;
    let mut row = LedgerRow::from_record(&create_record(Some("C001"), None, None), Delimiter::Semicolon);

    assert_eq!(row.days_outstanding(today), 0);

    row.doc_due_date = NaiveDate::from_ymd_opt(2024, 4, 21);
    assert_eq!(row.days_outstanding(today), 10);

    row.doc_due_date = NaiveDate::from_ymd_opt(2024, 5, 11);
    assert_eq!(row.days_outstanding(today), -10);

    row.dias_pendientes = Some(45);
    assert_eq!(row.days_outstanding(today), 45);

    Ok(())
}

#[test]
fn test_missing_columns_message_names_each_missing_column() {
    let error = FormatValidationError::MissingColumns {
        missing: vec!["DocNum".to_string()],
        detected: vec!["DocEntry", "CardCode", "CardName", "DocTotal", "DocDate", "Comments"]
            .into_iter()
            .map(str::to_string)
            .collect()
    };

    let message = error.to_string();

    assert!(message.contains("Required columns not found: DocNum."));
    assert!(message.contains("DocEntry, CardCode, CardName, DocTotal, DocDate..."));
    assert!(!message.contains("Comments"));
}

#[test]
fn test_import_error_exposes_message_detail_and_stage() {
    let rejected = ImportError::from(InputRejection::from(DelimiterError::NotAllowed(":".to_string())));
    assert_eq!(rejected.stage(), ImportStage::Received);
    assert!(rejected.is_input_error());
    assert_eq!(rejected.detail(), None);

    let empty = ImportError::EmptyResult;
    assert_eq!(empty.message(), "No valid rows found to import");
    assert!(empty.detail().is_some());

    let storage = ImportError::storage(ImportStage::Loading, StorageError::Unavailable("connection reset".to_string()));
    assert_eq!(storage.stage(), ImportStage::Loading);
    assert!(!storage.is_input_error());
    assert!(storage.detail().is_some_and(|detail| detail.contains("connection reset")));
    assert!(ImportStage::Loading.is_destructive());
    assert!(!ImportStage::Mapped.is_destructive());
}
