use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::postgres::{PgConnection, PgRow};
use sqlx::{Column, Connection, Row as _, TypeInfo};

use super::sanitizer::SanitizedQuery;
use super::StageError;
use crate::models::{Row, RowValue};

/// Runs a sanitized statement and materializes every result row
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, query: &SanitizedQuery) -> Result<Vec<Row>, StageError>;
}

/// Executes against the relational post store
///
/// Each call opens its own connection, runs the statement inside a
/// `READ ONLY` transaction, rolls back and closes. No retry.
pub struct PgQueryExecutor {
    database_url: String,
}

impl PgQueryExecutor {
    pub fn new(database_url: String) -> Self {
        Self { database_url }
    }

    async fn run(&self, query: &SanitizedQuery) -> Result<Vec<Row>, sqlx::Error> {
        let mut conn = PgConnection::connect(&self.database_url).await?;

        let rows = {
            let mut tx = conn.begin().await?;
            sqlx::query("SET TRANSACTION READ ONLY")
                .execute(&mut *tx)
                .await?;
            let rows = sqlx::query(query.as_str()).fetch_all(&mut *tx).await?;
            tx.rollback().await?;
            rows
        };

        conn.close().await?;

        rows.iter().map(pg_row_to_row).collect()
    }
}

#[async_trait]
impl QueryExecutor for PgQueryExecutor {
    async fn execute(&self, query: &SanitizedQuery) -> Result<Vec<Row>, StageError> {
        let rows = self
            .run(query)
            .await
            .map_err(|e| StageError::Execution(e.to_string()))?;

        tracing::info!("Query returned {} rows", rows.len());
        Ok(rows)
    }
}

/// Convert a Postgres row into an ordered column mapping
///
/// Types without a mapping (e.g. `vector`) come back as `Null`. A value that
/// fails to decode fails the whole query.
fn pg_row_to_row(row: &PgRow) -> Result<Row, sqlx::Error> {
    row.columns()
        .iter()
        .map(|column| {
            let value = decode_column(row, column.ordinal(), column.type_info().name())?;
            Ok::<_, sqlx::Error>((column.name().to_string(), value))
        })
        .collect()
}

fn decode_column(row: &PgRow, index: usize, type_name: &str) -> Result<RowValue, sqlx::Error> {
    let value = match type_name {
        "INT2" => row
            .try_get::<Option<i16>, _>(index)?
            .map(|v| RowValue::Int(v.into())),
        "INT4" => row
            .try_get::<Option<i32>, _>(index)?
            .map(|v| RowValue::Int(v.into())),
        "INT8" => row.try_get::<Option<i64>, _>(index)?.map(RowValue::Int),
        "FLOAT4" => row
            .try_get::<Option<f32>, _>(index)?
            .map(|v| RowValue::Float(v.into())),
        "FLOAT8" => row.try_get::<Option<f64>, _>(index)?.map(RowValue::Float),
        "NUMERIC" => row
            .try_get::<Option<Decimal>, _>(index)?
            .and_then(|d| d.to_f64())
            .map(RowValue::Float),
        "BOOL" => row.try_get::<Option<bool>, _>(index)?.map(RowValue::Bool),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => {
            row.try_get::<Option<String>, _>(index)?.map(RowValue::Text)
        }
        "TIMESTAMPTZ" => row
            .try_get::<Option<DateTime<Utc>>, _>(index)?
            .map(RowValue::Timestamp),
        "TIMESTAMP" => row
            .try_get::<Option<NaiveDateTime>, _>(index)?
            .map(|ts| RowValue::Timestamp(ts.and_utc())),
        "DATE" => row
            .try_get::<Option<NaiveDate>, _>(index)?
            .map(|d| RowValue::Text(d.to_string())),
        other => {
            tracing::debug!("No mapping for column type {}, returning null", other);
            None
        }
    };

    Ok(value.unwrap_or(RowValue::Null))
}
