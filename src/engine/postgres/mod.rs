//! `PostgreSQL` Connection and Value Conversion
//!
//! # Features
//! - Client-server connections via TCP with a bounded retry loop
//! - Generic "run statement, collect rows" helper over clients and transactions
//! - Conversion of result values to JSON for rendering and `--json` output
//!
//! # Implementation Notes
//! - Uses `tokio-postgres` (async driver, requires tokio runtime)
//! - The connection future is driven on a spawned task
//! - NULL in any column becomes `null`
//! - NUMERIC is decoded to exact decimal text (see [`numeric`])
//! - BYTEA data is Base64-encoded for JSON safety

use std::time::Duration;
use tokio_postgres::types::{FromSql, ToSql, Type};
use tokio_postgres::{Client, Config, GenericClient, NoTls, Row, Transaction};
use tracing::{debug, error, info, warn};

use crate::engine::{ConnectionConfig, QueryResult, RetryPolicy};
use crate::error::{LibraryError, Result};

pub mod numeric;

pub use numeric::PgNumeric;

/// Per-attempt TCP connect timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Open a single connection
pub async fn connect(config: &ConnectionConfig) -> Result<Client> {
    open(&build_pg_config(config)?).await
}

async fn open(pg_config: &Config) -> Result<Client> {
    let (client, connection) = pg_config.connect(NoTls).await.map_err(|e| {
        LibraryError::connection_failed(format!("Failed to connect to PostgreSQL: {e}"))
    })?;

    // Connection errors carry no credentials, so they are safe to log
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            error!(error = %e, "PostgreSQL connection closed with error");
        }
    });

    Ok(client)
}

/// Open a connection, retrying according to `policy`
///
/// An incomplete config fails at once with `InvalidInput`; only the connect
/// itself is retried. Each failed attempt is logged at warn level. After the
/// last attempt the most recent failure is returned as `ConnectionFailed`.
pub async fn connect_with_retry(
    config: &ConnectionConfig,
    policy: RetryPolicy,
) -> Result<Client> {
    let pg_config = build_pg_config(config)?;
    let mut last_failure = String::from("no attempts made");

    for attempt in 1..=policy.attempts {
        match open(&pg_config).await {
            Ok(client) => {
                info!(target_db = %config, attempt, "connected to PostgreSQL");
                return Ok(client);
            }
            Err(e) => {
                warn!(attempt, attempts = policy.attempts, error = %e, "connection attempt failed");
                last_failure = match e {
                    LibraryError::ConnectionFailed(detail) => detail,
                    other => other.message(),
                };
            }
        }

        if attempt < policy.attempts {
            tokio::time::sleep(policy.delay).await;
        }
    }

    Err(LibraryError::connection_failed(format!(
        "Could not connect to {config} after {} attempts: {last_failure}",
        policy.attempts
    )))
}

/// Build `PostgreSQL` connection config from `ConnectionConfig`
fn build_pg_config(config: &ConnectionConfig) -> Result<Config> {
    if config.host.trim().is_empty() {
        return Err(LibraryError::invalid_input("PostgreSQL requires 'host' parameter"));
    }
    if config.user.trim().is_empty() {
        return Err(LibraryError::invalid_input("PostgreSQL requires 'user' parameter"));
    }
    if config.database.trim().is_empty() {
        return Err(LibraryError::invalid_input("PostgreSQL requires 'database' parameter"));
    }

    let mut pg_config = Config::new();
    pg_config
        .host(&config.host)
        .port(config.port)
        .user(&config.user)
        .password(&config.password)
        .dbname(&config.database)
        .application_name("library-admin")
        .connect_timeout(CONNECT_TIMEOUT);

    Ok(pg_config)
}

/// Prepare and run `sql`, collecting every row
///
/// Works on both a [`Client`] and a transaction. Column names come from the
/// prepared statement, so an empty result still reports its columns.
pub async fn fetch<C: GenericClient>(
    client: &C,
    sql: &str,
    params: &[&(dyn ToSql + Sync)],
) -> Result<QueryResult> {
    debug!(sql, params = params.len(), "running statement");

    let stmt = client
        .prepare(sql)
        .await
        .map_err(|e| {
            LibraryError::query_failed(format!("Failed to prepare query: {}", db_error_text(&e)))
        })?;

    if stmt.columns().is_empty() {
        let rows_affected = client
            .execute(&stmt, params)
            .await
            .map_err(|e| {
                LibraryError::query_failed(format!(
                    "Failed to execute query: {}",
                    db_error_text(&e)
                ))
            })?;

        return Ok(QueryResult {
            columns: Vec::new(),
            rows: Vec::new(),
            rows_affected: Some(rows_affected),
        });
    }

    let rows = client
        .query(&stmt, params)
        .await
        .map_err(|e| {
            LibraryError::query_failed(format!("Failed to execute query: {}", db_error_text(&e)))
        })?;

    let columns: Vec<String> = stmt.columns().iter().map(|c| c.name().to_string()).collect();
    let mut data = Vec::with_capacity(rows.len());
    for row in &rows {
        data.push(row_to_json(row)?);
    }

    Ok(QueryResult { columns, rows: data, rows_affected: None })
}

/// Run a statement whose result is not needed
pub async fn run<C: GenericClient>(
    client: &C,
    sql: &str,
    params: &[&(dyn ToSql + Sync)],
) -> Result<u64> {
    debug!(sql, params = params.len(), "running statement");

    client
        .execute(sql, params)
        .await
        .map_err(|e| LibraryError::query_failed(db_error_text(&e)))
}

/// Start a read-write transaction
pub async fn begin(client: &mut Client) -> Result<Transaction<'_>> {
    client.transaction().await.map_err(|e| {
        LibraryError::query_failed(format!("Failed to start transaction: {}", db_error_text(&e)))
    })
}

/// Commit, mapping the failure like any other statement error
pub async fn commit(tx: Transaction<'_>) -> Result<()> {
    tx.commit()
        .await
        .map_err(|e| LibraryError::query_failed(format!("Failed to commit: {}", db_error_text(&e))))
}

/// Server error message when there is one, driver message otherwise
pub fn db_error_text(err: &tokio_postgres::Error) -> String {
    match err.as_db_error() {
        Some(db) => match db.detail() {
            Some(detail) => format!("{} ({detail})", db.message()),
            None => db.message().to_string(),
        },
        None => err.to_string(),
    }
}

/// Convert a `PostgreSQL` row to a JSON-safe `Vec`
pub fn row_to_json(row: &Row) -> Result<Vec<serde_json::Value>> {
    (0..row.len()).map(|idx| postgres_value_to_json(row, idx)).collect()
}

fn get<'a, T: FromSql<'a>>(row: &'a Row, idx: usize, what: &str) -> Result<Option<T>> {
    row.try_get::<_, Option<T>>(idx)
        .map_err(|e| LibraryError::query_failed(format!("Failed to get {what} value: {e}")))
}

/// Convert `PostgreSQL` value to JSON value
fn postgres_value_to_json(row: &Row, idx: usize) -> Result<serde_json::Value> {
    use serde_json::{Number, Value};

    let col_type = row.columns()[idx].type_();

    let value = match *col_type {
        Type::BOOL => get::<bool>(row, idx, "boolean")?.map(Value::Bool),

        Type::INT2 => get::<i16>(row, idx, "i16")?.map(|v| Value::Number(v.into())),
        Type::INT4 => get::<i32>(row, idx, "i32")?.map(|v| Value::Number(v.into())),
        Type::INT8 => get::<i64>(row, idx, "i64")?.map(|v| Value::Number(v.into())),
        Type::OID => get::<u32>(row, idx, "oid")?.map(|v| Value::Number(v.into())),

        // NaN/Infinity have no JSON form
        Type::FLOAT4 => get::<f32>(row, idx, "f32")?
            .map(|v| Number::from_f64(f64::from(v)).map_or(Value::Null, Value::Number)),
        Type::FLOAT8 => {
            get::<f64>(row, idx, "f64")?
                .map(|v| Number::from_f64(v).map_or(Value::Null, Value::Number))
        }

        Type::NUMERIC => get::<PgNumeric>(row, idx, "numeric")?.map(|v| Value::String(v.0)),

        Type::VARCHAR | Type::TEXT | Type::BPCHAR | Type::NAME => {
            get::<String>(row, idx, "string")?.map(Value::String)
        }

        Type::JSON | Type::JSONB => get::<Value>(row, idx, "JSON")?,

        Type::BYTEA => get::<Vec<u8>>(row, idx, "bytea")?.map(|v| {
            use base64::Engine;
            Value::String(base64::engine::general_purpose::STANDARD.encode(v))
        }),

        Type::DATE => get::<chrono::NaiveDate>(row, idx, "date")?
            .map(|v| Value::String(v.format("%Y-%m-%d").to_string())),
        Type::TIMESTAMP => get::<chrono::NaiveDateTime>(row, idx, "timestamp")?
            .map(|v| Value::String(v.format("%Y-%m-%dT%H:%M:%S").to_string())),
        Type::TIMESTAMPTZ => get::<chrono::DateTime<chrono::Utc>>(row, idx, "timestamptz")?
            .map(|v| Value::String(v.to_rfc3339())),
        Type::TIME => get::<chrono::NaiveTime>(row, idx, "time")?
            .map(|v| Value::String(v.format("%H:%M:%S").to_string())),

        Type::UUID => get::<uuid::Uuid>(row, idx, "UUID")?.map(|v| Value::String(v.to_string())),

        _ => row
            .try_get::<_, Option<String>>(idx)
            .map_err(|e| {
                LibraryError::query_failed(format!(
                    "Failed to convert PostgreSQL type '{}' to JSON: {e}",
                    col_type.name()
                ))
            })?
            .map(Value::String),
    };

    Ok(value.unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_config_accepts_defaults() {
        let config = ConnectionConfig::new("localhost", 5432, "library", "postgres", "postgres");
        let pg = build_pg_config(&config).unwrap();
        assert_eq!(pg.get_dbname(), Some("library"));
        assert_eq!(pg.get_user(), Some("postgres"));
        assert_eq!(pg.get_ports(), &[5432]);
    }

    #[test]
    fn test_build_config_missing_host() {
        let config = ConnectionConfig::new("  ", 5432, "library", "postgres", "postgres");
        let err = build_pg_config(&config).unwrap_err();
        assert!(err.message().contains("PostgreSQL requires 'host' parameter"));
    }

    #[test]
    fn test_build_config_missing_database() {
        let config = ConnectionConfig::new("localhost", 5432, "", "postgres", "postgres");
        let err = build_pg_config(&config).unwrap_err();
        assert!(err.message().contains("'database'"));
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_all_attempts() {
        // Nothing listens on port 1
        let config = ConnectionConfig::new("127.0.0.1", 1, "library", "postgres", "secret-pw");
        let policy = RetryPolicy { attempts: 2, delay: Duration::from_millis(10) };

        let err = connect_with_retry(&config, policy).await.unwrap_err();
        assert_eq!(err.error_code(), "CONNECTION_FAILED");
        assert!(err.message().contains("after 2 attempts"));
        assert!(!err.message().contains("secret-pw"));
    }

    #[tokio::test]
    async fn test_incomplete_config_fails_without_retrying() {
        let config = ConnectionConfig::new("", 5432, "library", "postgres", "postgres");
        let policy = RetryPolicy { attempts: 20, delay: Duration::from_secs(60) };

        let attempt = connect_with_retry(&config, policy);
        let err = tokio::time::timeout(Duration::from_secs(5), attempt)
            .await
            .expect("should fail before any retry delay")
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
        assert!(err.message().contains("'host'"));
    }

    #[tokio::test]
    #[ignore = "Requires running PostgreSQL instance"]
    async fn test_fetch_converts_types() {
        let config = ConnectionConfig::new("localhost", 5432, "postgres", "postgres", "postgres");
        let client = connect(&config).await.unwrap();

        let result = fetch(
            &client,
            "SELECT 1::int4 AS n, 'x'::text AS s, NULL::int4 AS missing, \
             12.50::numeric(10,2) AS fine, DATE '2024-03-01' AS d, true AS flag",
            &[],
        )
        .await
        .unwrap();

        assert_eq!(result.columns, vec!["n", "s", "missing", "fine", "d", "flag"]);
        let row = &result.rows[0];
        assert_eq!(row[0], serde_json::json!(1));
        assert_eq!(row[1], serde_json::json!("x"));
        assert_eq!(row[2], serde_json::Value::Null);
        assert_eq!(row[3], serde_json::json!("12.50"));
        assert_eq!(row[4], serde_json::json!("2024-03-01"));
        assert_eq!(row[5], serde_json::json!(true));
    }
}
