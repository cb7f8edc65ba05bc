use crate::models::{LedgerRow, StoredLedgerRow};
use crate::storage::{LedgerStore, LedgerTransaction, StorageError, MAX_ROWS_PER_INSERT};
use crate::types::TableName;
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder, Transaction};
use std::time::Duration;
use tracing::debug;

const INSERT_COLUMNS: &str = "docentry, cardcode, cardname, docnum, folionum, docduedate, docdate, taxdate, \
    po, doctotal, clase, dias_pendientes, comments, saldovencido, tipocliente, status";

const SELECT_COLUMNS: &str = "id, docentry AS doc_entry, cardcode AS card_code, cardname AS card_name, \
    docnum AS doc_num, folionum AS folio_num, docduedate AS doc_due_date, docdate AS doc_date, \
    taxdate AS tax_date, po, doctotal AS doc_total, clase, dias_pendientes, comments, \
    saldovencido AS saldo_vencido, tipocliente AS tipo_cliente, status";

/// Ledger table in PostgreSQL.
///
/// Table names are validated identifiers, which is what makes it safe to
/// format them into statement text.
pub struct PostgresLedgerStore {
    pool: PgPool,
    table: TableName
}

impl PostgresLedgerStore {
    pub fn new(pool: PgPool, table: TableName) -> Self {
        Self { pool, table }
    }

    pub async fn connect(database_url: &str, table: TableName) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        Ok(Self::new(pool, table))
    }

    /// Creates the ledger table when it does not exist yet.
    pub async fn ensure_table(&self) -> Result<(), StorageError> {
        let statement = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id SERIAL PRIMARY KEY,
                docentry INTEGER,
                cardcode TEXT,
                cardname TEXT,
                docnum BIGINT,
                folionum TEXT,
                docduedate DATE,
                docdate DATE,
                taxdate DATE,
                po TEXT,
                doctotal NUMERIC,
                clase TEXT,
                dias_pendientes INTEGER,
                comments TEXT,
                saldovencido NUMERIC,
                tipocliente TEXT,
                status INTEGER NOT NULL DEFAULT 0
            )",
            self.table
        );

        sqlx::query(&statement).execute(&self.pool).await?;

        Ok(())
    }
}

#[async_trait]
impl LedgerStore for PostgresLedgerStore {
    type Transaction = PostgresTransaction;

    fn table(&self) -> &TableName {
        &self.table
    }

    async fn begin(&self) -> Result<PostgresTransaction, StorageError> {
        let mut transaction = self.pool.begin().await?;

        // Blocks concurrent writers (other processes included) until this transaction ends.
        let statement = format!("LOCK TABLE {} IN EXCLUSIVE MODE", self.table);
        sqlx::query(&statement).execute(&mut *transaction).await?;

        Ok(PostgresTransaction {
            transaction,
            table: self.table.clone()
        })
    }

    async fn count(&self) -> Result<u64, StorageError> {
        let statement = format!("SELECT COUNT(*) FROM {}", self.table);
        let count: i64 = sqlx::query_scalar(&statement).fetch_one(&self.pool).await?;

        Ok(count.max(0) as u64)
    }

    async fn rows_for_customer(&self, card_code: &str) -> Result<Vec<StoredLedgerRow>, StorageError> {
        let statement = format!(
            "SELECT {SELECT_COLUMNS} FROM {} WHERE lower(cardcode) = lower($1) ORDER BY docdate DESC NULLS LAST, id",
            self.table
        );

        let rows = sqlx::query_as::<_, StoredLedgerRow>(&statement)
            .bind(card_code)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }
}

pub struct PostgresTransaction {
    transaction: Transaction<'static, Postgres>,
    table: TableName
}

#[async_trait]
impl LedgerTransaction for PostgresTransaction {
    async fn delete_all(&mut self) -> Result<u64, StorageError> {
        let statement = format!("DELETE FROM {}", self.table);
        let result = sqlx::query(&statement).execute(&mut *self.transaction).await?;

        Ok(result.rows_affected())
    }

    async fn reset_sequence(&mut self) -> Result<(), StorageError> {
        // A failed statement aborts the whole transaction unless it is fenced by a savepoint.
        sqlx::query("SAVEPOINT reset_sequence").execute(&mut *self.transaction).await?;

        let statement = format!("ALTER SEQUENCE {} RESTART WITH 1", self.table.id_sequence());

        match sqlx::query(&statement).execute(&mut *self.transaction).await {
            Ok(_) => {
                sqlx::query("RELEASE SAVEPOINT reset_sequence").execute(&mut *self.transaction).await?;
                Ok(())
            }
            Err(error) => {
                sqlx::query("ROLLBACK TO SAVEPOINT reset_sequence").execute(&mut *self.transaction).await?;
                Err(error.into())
            }
        }
    }

    async fn insert_batch(&mut self, rows: &[LedgerRow]) -> Result<u64, StorageError> {
        let mut inserted = 0;

        for chunk in rows.chunks(MAX_ROWS_PER_INSERT) {
            let mut builder = QueryBuilder::<Postgres>::new(format!("INSERT INTO {} ({INSERT_COLUMNS}) ", self.table));

            builder.push_values(chunk, |mut values, row| {
                values
                    .push_bind(row.doc_entry)
                    .push_bind(row.card_code.clone())
                    .push_bind(row.card_name.clone())
                    .push_bind(row.doc_num)
                    .push_bind(row.folio_num.clone())
                    .push_bind(row.doc_due_date)
                    .push_bind(row.doc_date)
                    .push_bind(row.tax_date)
                    .push_bind(row.po.clone())
                    .push_bind(row.doc_total)
                    .push_bind(row.clase.clone())
                    .push_bind(row.dias_pendientes)
                    .push_bind(row.comments.clone())
                    .push_bind(row.saldo_vencido)
                    .push_bind(row.tipo_cliente.clone())
                    .push_bind(row.status);
            });

            let result = builder.build().execute(&mut *self.transaction).await?;
            debug!("Inserted {} rows into [{}]", result.rows_affected(), self.table);

            inserted += result.rows_affected();
        }

        Ok(inserted)
    }

    async fn commit(self) -> Result<(), StorageError> {
        self.transaction.commit().await?;

        Ok(())
    }

    async fn rollback(self) -> Result<(), StorageError> {
        self.transaction.rollback().await?;

        Ok(())
    }
}
