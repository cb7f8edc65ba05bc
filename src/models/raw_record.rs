use serde::Deserialize;

/// One CSV record keyed by the ERP export's header names.
///
/// Every column is optional: the header check only guarantees the key columns,
/// and blank cells arrive as `None`. Columns not listed here are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawRecord {
    #[serde(rename = "DocEntry")]
    pub doc_entry: Option<String>,
    #[serde(rename = "CardCode")]
    pub card_code: Option<String>,
    #[serde(rename = "CardName")]
    pub card_name: Option<String>,
    #[serde(rename = "DocNum")]
    pub doc_num: Option<String>,
    #[serde(rename = "FolioNum")]
    pub folio_num: Option<String>,
    #[serde(rename = "DocDueDate")]
    pub doc_due_date: Option<String>,
    #[serde(rename = "DocDate")]
    pub doc_date: Option<String>,
    #[serde(rename = "TaxDate")]
    pub tax_date: Option<String>,
    /// Customer purchase-order reference.
    #[serde(rename = "NumAtCard")]
    pub num_at_card: Option<String>,
    #[serde(rename = "DocTotal")]
    pub doc_total: Option<String>,
    #[serde(rename = "Clase")]
    pub clase: Option<String>,
    #[serde(rename = "dias_pendientes")]
    pub dias_pendientes: Option<String>,
    #[serde(rename = "Comments")]
    pub comments: Option<String>,
    #[serde(rename = "SaldoVencido")]
    pub saldo_vencido: Option<String>,
    #[serde(rename = "TipoCliente")]
    pub tipo_cliente: Option<String>
}
