//! Record store lookups and insert helpers.
//!
//! Two flat tables: consumption-by-account-and-month, and
//! invoices-by-account. An absent result does not distinguish between
//! "unknown account" and "no data for that month" — callers surface both
//! the same way.

use anyhow::Result;
use sqlx::{Row, SqlitePool};

use crate::models::{ConsumptionRecord, InvoiceRecord};

/// Exact-match consumption lookup. First matching row in rowid order wins
/// when duplicates exist.
pub async fn lookup_consumption(
    pool: &SqlitePool,
    account: &str,
    month: &str,
) -> Result<Option<f64>> {
    let row = sqlx::query(
        "SELECT volume_m3 FROM consumption WHERE account = ? AND month = ? ORDER BY id ASC LIMIT 1",
    )
    .bind(account)
    .bind(month)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| r.get("volume_m3")))
}

/// All invoices for an account in storage order, optionally filtered to one
/// month. Empty vec when none exist.
pub async fn lookup_invoices(
    pool: &SqlitePool,
    account: &str,
    month: Option<&str>,
) -> Result<Vec<InvoiceRecord>> {
    let rows = match month {
        Some(m) => {
            sqlx::query(
                "SELECT account, month, amount, status, paid_on FROM invoices \
                 WHERE account = ? AND month = ? ORDER BY id ASC",
            )
            .bind(account)
            .bind(m)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query(
                "SELECT account, month, amount, status, paid_on FROM invoices \
                 WHERE account = ? ORDER BY id ASC",
            )
            .bind(account)
            .fetch_all(pool)
            .await?
        }
    };

    let invoices = rows
        .iter()
        .map(|row| InvoiceRecord {
            account: row.get("account"),
            month: row.get("month"),
            amount: row.get("amount"),
            status: row.get("status"),
            paid_on: row.get("paid_on"),
        })
        .collect();

    Ok(invoices)
}

pub async fn insert_consumption(pool: &SqlitePool, record: &ConsumptionRecord) -> Result<()> {
    sqlx::query(
        "INSERT INTO consumption (surname, given_name, account, month, volume_m3, address) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&record.surname)
    .bind(&record.given_name)
    .bind(&record.account)
    .bind(&record.month)
    .bind(record.volume_m3)
    .bind(&record.address)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn insert_invoice(pool: &SqlitePool, invoice: &InvoiceRecord) -> Result<()> {
    sqlx::query(
        "INSERT INTO invoices (account, month, amount, status, paid_on) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&invoice.account)
    .bind(&invoice.month)
    .bind(invoice.amount)
    .bind(&invoice.status)
    .bind(&invoice.paid_on)
    .execute(pool)
    .await?;

    Ok(())
}
