use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{Local, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::engine::{ImportRequest, ImportSummary};
use crate::models::{ImportError, InputRejection, StoredLedgerRow};
use crate::server::AppState;
use crate::storage::LedgerStore;

const DEFAULT_DELIMITER: &str = ";";

/// Body of an import request. Everything is optional so that gaps are
/// reported as import rejections instead of generic deserialization failures.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportBody {
    file_name: Option<String>,
    delimiter: Option<String>,
    content: Option<Value>
}

impl ImportBody {
    fn into_request(self) -> Result<ImportRequest, ImportError> {
        let content = match self.content {
            Some(Value::String(content)) => content,
            Some(_) => return Err(InputRejection::NotTextual.into()),
            None => return Err(InputRejection::EmptyContent.into())
        };

        Ok(ImportRequest::new(
            self.file_name.unwrap_or_default(),
            self.delimiter.unwrap_or_else(|| DEFAULT_DELIMITER.to_string()),
            content
        ))
    }
}

#[derive(Debug, Serialize)]
struct ImportResponse {
    ok: bool,
    message: &'static str,
    #[serde(flatten)]
    summary: ImportSummary
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>
}

fn error_response(status: StatusCode, error: String, detail: Option<String>) -> Response {
    (status, Json(ErrorBody { error, detail })).into_response()
}

fn import_error_response(import_error: &ImportError) -> Response {
    warn!("Import rejected while {}: {import_error}", import_error.stage());

    let status = match import_error {
        ImportError::ImportInProgress { .. } => StatusCode::CONFLICT,
        _ if import_error.is_input_error() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR
    };

    error_response(status, import_error.message(), import_error.detail())
}

/// Ledger row as served to the portal.
#[derive(Debug, Serialize)]
pub struct LedgerEntryView {
    id: i32,
    docentry: Option<i32>,
    cardcode: Option<String>,
    cardname: Option<String>,
    /// Sent as text, JSON numbers lose precision past 2^53.
    docnum: Option<String>,
    folionum: Option<String>,
    docduedate: Option<NaiveDate>,
    docdate: Option<NaiveDate>,
    taxdate: Option<NaiveDate>,
    po: Option<String>,
    doctotal: Option<f64>,
    clase: Option<String>,
    dias_pendientes: i64,
    comments: Option<String>,
    saldovencido: Option<f64>,
    tipocliente: Option<String>,
    status: i32
}

impl LedgerEntryView {
    fn new(stored: StoredLedgerRow, today: NaiveDate) -> Self {
        let dias_pendientes = stored.row.days_outstanding(today);
        let row = stored.row;

        Self {
            id: stored.id,
            docentry: row.doc_entry,
            cardcode: row.card_code,
            cardname: row.card_name,
            docnum: row.doc_num.map(|number| number.to_string()),
            folionum: row.folio_num,
            docduedate: row.doc_due_date,
            docdate: row.doc_date,
            taxdate: row.tax_date,
            po: row.po,
            doctotal: row.doc_total.as_ref().and_then(Decimal::to_f64),
            clase: row.clase,
            dias_pendientes,
            comments: row.comments,
            saldovencido: row.saldo_vencido.as_ref().and_then(Decimal::to_f64),
            tipocliente: row.tipo_cliente,
            status: row.status
        }
    }
}

pub async fn import_ledger<S: LedgerStore>(State(state): State<AppState<S>>, payload: Result<Json<ImportBody>, JsonRejection>) -> Response {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            warn!("Rejected import request body: {rejection}");
            return error_response(StatusCode::BAD_REQUEST, "Invalid request body".to_string(), Some(rejection.body_text()));
        }
    };

    let request = match body.into_request() {
        Ok(request) => request,
        Err(import_error) => return import_error_response(&import_error)
    };

    // Detached so a dropped connection cannot cancel a run halfway through.
    let engine = state.engine.clone();
    let run = tokio::spawn(async move { engine.run(request).await });

    match run.await {
        Ok(Ok(summary)) => Json(ImportResponse {
            ok: true,
            message: "Import completed",
            summary
        }).into_response(),
        Ok(Err(import_error)) => import_error_response(&import_error),
        Err(join_error) => {
            error!("Import task aborted: {join_error}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to import the ledger".to_string(), Some(join_error.to_string()))
        }
    }
}

pub async fn customer_ledger<S: LedgerStore>(State(state): State<AppState<S>>, Path(card_code): Path<String>) -> Response {
    let timer = Instant::now();

    match state.engine.storage().rows_for_customer(&card_code).await {
        Ok(rows) => {
            info!("Ledger for customer [{card_code}]: {} documents [{:?}]", rows.len(), timer.elapsed());

            let today = Local::now().date_naive();
            let entries: Vec<LedgerEntryView> = rows.into_iter()
                .map(|stored| LedgerEntryView::new(stored, today))
                .collect();

            Json(entries).into_response()
        }
        Err(storage_error) => {
            error!("Failed to load ledger for customer [{card_code}] [{:?}]: {storage_error}", timer.elapsed());
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load the ledger".to_string(), None)
        }
    }
}

pub async fn health<S: LedgerStore>(State(state): State<AppState<S>>) -> Response {
    match state.engine.storage().count().await {
        Ok(rows) => Json(json!({ "status": "ok", "rows": rows })).into_response(),
        Err(storage_error) => {
            error!("Health check failed: {storage_error}");
            (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "status": "unavailable", "error": storage_error.to_string() }))).into_response()
        }
    }
}
