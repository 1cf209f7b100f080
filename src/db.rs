// 🗄️ SQLite Sink - the flattened table as a single-file database
// One table, rebuilt on every run, WAL mode like the rest of our storage

use crate::transform::OutputRow;
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use std::path::Path;
use tracing::debug;

pub const TABLE_NAME: &str = "customer_orders";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // The artifact reflects exactly one run
    conn.execute(&format!("DROP TABLE IF EXISTS {}", TABLE_NAME), [])?;

    // Column order matches OutputRow
    conn.execute(
        &format!(
            "CREATE TABLE {} (
            customer_id INTEGER NOT NULL,
            customer_name TEXT,
            registration_date TEXT NOT NULL,
            is_vip INTEGER NOT NULL,
            order_id INTEGER NOT NULL,
            order_date TEXT NOT NULL,
            product_id INTEGER NOT NULL,
            product_name TEXT NOT NULL,
            category TEXT NOT NULL,
            unit_price REAL,
            item_quantity INTEGER NOT NULL,
            total_item_price REAL,
            total_order_value_percentage REAL
        )",
            TABLE_NAME
        ),
        [],
    )?;

    conn.execute(
        &format!(
            "CREATE INDEX IF NOT EXISTS idx_{0}_key
             ON {0}(customer_id, order_id, product_id)",
            TABLE_NAME
        ),
        [],
    )?;

    Ok(())
}

/// Insert rows in one transaction, preserving their order
pub fn insert_rows(conn: &Connection, rows: &[OutputRow]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO {} (
                customer_id, customer_name, registration_date, is_vip,
                order_id, order_date, product_id, product_name, category,
                unit_price, item_quantity, total_item_price, total_order_value_percentage
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            TABLE_NAME
        ))?;

        for row in rows {
            stmt.execute(params![
                row.customer_id,
                row.customer_name,
                row.registration_date.format(TIMESTAMP_FORMAT).to_string(),
                row.is_vip,
                row.order_id,
                row.order_date.format(TIMESTAMP_FORMAT).to_string(),
                row.product_id,
                row.product_name,
                row.category,
                row.unit_price,
                row.item_quantity,
                row.total_item_price,
                row.total_order_value_percentage,
            ])?;
        }
    }
    tx.commit()?;

    Ok(rows.len())
}

pub fn count_rows(conn: &Connection) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM {}", TABLE_NAME);
    let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;

    Ok(count)
}

fn parse_timestamp(idx: usize, raw: String) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Read the table back in insertion order
pub fn get_all_rows(conn: &Connection) -> Result<Vec<OutputRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT customer_id, customer_name, registration_date, is_vip,
                order_id, order_date, product_id, product_name, category,
                unit_price, item_quantity, total_item_price, total_order_value_percentage
         FROM {}
         ORDER BY rowid",
        TABLE_NAME
    ))?;

    let rows = stmt
        .query_map([], |row| {
            // NaN is stored as NULL
            let real = |idx: usize| -> rusqlite::Result<f64> {
                Ok(row.get::<_, Option<f64>>(idx)?.unwrap_or(f64::NAN))
            };

            Ok(OutputRow {
                customer_id: row.get(0)?,
                customer_name: row.get(1)?,
                registration_date: parse_timestamp(2, row.get(2)?)?,
                is_vip: row.get(3)?,
                order_id: row.get(4)?,
                order_date: parse_timestamp(5, row.get(5)?)?,
                product_id: row.get(6)?,
                product_name: row.get(7)?,
                category: row.get(8)?,
                unit_price: real(9)?,
                item_quantity: row.get(10)?,
                total_item_price: real(11)?,
                total_order_value_percentage: real(12)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Open (or create) the database file and replace its table with `rows`
pub fn write_database(path: &Path, rows: &[OutputRow]) -> Result<usize> {
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database: {}", path.display()))?;

    setup_database(&conn)
        .with_context(|| format!("Failed to set up {} table", TABLE_NAME))?;
    let inserted = insert_rows(&conn, rows).context("Failed to insert rows")?;

    debug!(rows = inserted, path = %path.display(), "wrote SQLite table");
    Ok(inserted)
}
