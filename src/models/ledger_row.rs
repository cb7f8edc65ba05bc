use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::RawRecord;
use crate::types::{to_big_int, to_date, to_int, Delimiter};

/// Status given to every freshly imported document ("in transit").
pub const IN_TRANSIT_STATUS: i32 = 0;

/// A single accounts-receivable document in the shape of the destination table.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct LedgerRow {
    pub doc_entry: Option<i32>,
    /// Customer code.
    pub card_code: Option<String>,
    /// Customer name.
    pub card_name: Option<String>,
    pub doc_num: Option<i64>,
    pub folio_num: Option<String>,
    pub doc_due_date: Option<NaiveDate>,
    pub doc_date: Option<NaiveDate>,
    pub tax_date: Option<NaiveDate>,
    /// Purchase-order reference.
    pub po: Option<String>,
    pub doc_total: Option<Decimal>,
    pub clase: Option<String>,
    /// Days outstanding as computed by the ERP, when exported.
    pub dias_pendientes: Option<i32>,
    pub comments: Option<String>,
    /// Overdue balance.
    pub saldo_vencido: Option<Decimal>,
    pub tipo_cliente: Option<String>,
    pub status: i32
}

/// A ledger row as persisted, with its table-assigned identity.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct StoredLedgerRow {
    pub id: i32,
    #[sqlx(flatten)]
    pub row: LedgerRow
}

fn text(value: &Option<String>) -> Option<String> {
    value.as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

impl LedgerRow {
    /// Maps one parsed record into the destination shape.
    ///
    /// Amounts are read with the decimal convention implied by the delimiter,
    /// missing or blank cells become `None`, and `status` is always
    /// [`IN_TRANSIT_STATUS`].
    pub fn from_record(record: &RawRecord, delimiter: Delimiter) -> Self {
        let convention = delimiter.decimal_convention();

        Self {
            doc_entry: to_int(record.doc_entry.as_deref()),
            card_code: text(&record.card_code),
            card_name: text(&record.card_name),
            doc_num: to_big_int(record.doc_num.as_deref()),
            folio_num: text(&record.folio_num),
            doc_due_date: to_date(record.doc_due_date.as_deref()),
            doc_date: to_date(record.doc_date.as_deref()),
            tax_date: to_date(record.tax_date.as_deref()),
            po: text(&record.num_at_card),
            doc_total: convention.parse(record.doc_total.as_deref()),
            clase: text(&record.clase),
            dias_pendientes: to_int(record.dias_pendientes.as_deref()),
            comments: text(&record.comments),
            saldo_vencido: convention.parse(record.saldo_vencido.as_deref()),
            tipo_cliente: text(&record.tipo_cliente),
            status: IN_TRANSIT_STATUS
        }
    }

    /// Rows identifying no customer at all are padding from the export and are dropped.
    pub fn is_retained(&self) -> bool {
        self.card_code.is_some() || self.card_name.is_some()
    }

    /// Days past due as of `today`, preferring the exported figure.
    ///
    /// Negative when the document is not yet due; zero when there is no due date.
    pub fn days_outstanding(&self, today: NaiveDate) -> i64 {
        match (self.dias_pendientes, self.doc_due_date) {
            (Some(days), _) => i64::from(days),
            (None, Some(due)) => (today - due).num_days(),
            (None, None) => 0
        }
    }
}
