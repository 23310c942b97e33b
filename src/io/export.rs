use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;

use crate::application::LedgerService;
use crate::domain::{AccountView, Customer, TransactionView, format_cents};

/// Full ledger snapshot written by `export full`.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub customers: Vec<Customer>,
    pub accounts: Vec<AccountView>,
    pub transactions: Vec<TransactionView>,
}

/// Exporter for writing ledger data as CSV or JSON
pub struct Exporter<'a> {
    service: &'a LedgerService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a LedgerService) -> Self {
        Self { service }
    }

    /// Export transactions to CSV, one row per transfer with both parties named.
    pub async fn export_transactions_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let transactions = self.service.list_transactions().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "id",
            "created_at",
            "from_account",
            "from_customer",
            "to_account",
            "to_customer",
            "amount",
        ])?;

        for tx in &transactions {
            csv_writer.write_record([
                tx.id.to_string(),
                tx.created_at.to_rfc3339(),
                tx.from_account.id.to_string(),
                tx.from_account.customer.name.clone(),
                tx.to_account.id.to_string(),
                tx.to_account.customer.name.clone(),
                format_cents(tx.amount_cents),
            ])?;
        }

        csv_writer.flush()?;
        Ok(transactions.len())
    }

    /// Export account balances to CSV.
    pub async fn export_accounts_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let accounts = self.service.list_accounts().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["id", "customer_id", "customer", "balance"])?;

        for account in &accounts {
            csv_writer.write_record([
                account.id.to_string(),
                account.customer.id.to_string(),
                account.customer.name.clone(),
                format_cents(account.balance_cents),
            ])?;
        }

        csv_writer.flush()?;
        Ok(accounts.len())
    }

    /// Export the whole ledger as a pretty-printed JSON snapshot.
    pub async fn export_full_json<W: Write>(&self, mut writer: W) -> Result<LedgerSnapshot> {
        let snapshot = LedgerSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            customers: self.service.list_customers().await?,
            accounts: self.service.list_accounts().await?,
            transactions: self.service.list_transactions().await?,
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot)
    }
}
