//! Demo dataset seeding.
//!
//! Creates the schema (idempotent) and appends the demo customer rows.
//! Re-running appends again — the store carries no uniqueness constraint,
//! matching the original data loader.

use anyhow::Result;

use crate::config::Config;
use crate::db;
use crate::migrate;
use crate::models::{ConsumptionRecord, InvoiceRecord};
use crate::store;

pub async fn run_seed(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    migrate::create_schema(&pool).await?;

    let consumption = demo_consumption();
    for record in &consumption {
        store::insert_consumption(&pool, record).await?;
    }

    let invoices = demo_invoices();
    for invoice in &invoices {
        store::insert_invoice(&pool, invoice).await?;
    }

    println!("seed");
    println!("  consumption rows: {}", consumption.len());
    println!("  invoice rows: {}", invoices.len());

    pool.close().await;
    Ok(())
}

fn consumption_row(
    surname: &str,
    given_name: &str,
    account: &str,
    month: &str,
    volume_m3: f64,
    address: &str,
) -> ConsumptionRecord {
    ConsumptionRecord {
        surname: surname.to_string(),
        given_name: given_name.to_string(),
        account: account.to_string(),
        month: month.to_string(),
        volume_m3,
        address: address.to_string(),
    }
}

fn invoice_row(
    account: &str,
    month: &str,
    amount: f64,
    status: &str,
    paid_on: Option<&str>,
) -> InvoiceRecord {
    InvoiceRecord {
        account: account.to_string(),
        month: month.to_string(),
        amount,
        status: status.to_string(),
        paid_on: paid_on.map(|d| d.to_string()),
    }
}

pub fn demo_consumption() -> Vec<ConsumptionRecord> {
    vec![
        consumption_row("Ahmed", "El Mansouri", "123456", "2023-07", 20.5, "123 Rue de la Paix, Settat"),
        consumption_row("Ahmed", "El Mansouri", "123456", "2023-08", 25.1, "123 Rue de la Paix, Settat"),
        consumption_row("Fatima", "Zahi", "654321", "2023-07", 18.7, "456 Avenue Mohammed V, Settat"),
        consumption_row("Fatima", "Zahi", "654321", "2023-08", 19.3, "456 Avenue Mohammed V, Settat"),
        consumption_row("Souad", "Zriouel", "112233", "2023-07", 22.4, "789 Boulevard Hassan II, Settat"),
        consumption_row("Souad", "Zriouel", "112233", "2023-08", 23.9, "789 Boulevard Hassan II, Settat"),
    ]
}

pub fn demo_invoices() -> Vec<InvoiceRecord> {
    vec![
        invoice_row("123456", "2024-08", 300.50, "Non payée", None),
        invoice_row("123456", "2024-07", 325.75, "Payée", Some("2023-08-15")),
        invoice_row("654321", "2023-07", 200.00, "Payée", Some("2023-07-20")),
        invoice_row("654321", "2023-08", 210.00, "Non payée", None),
    ]
}
