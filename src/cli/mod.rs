use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use uuid::Uuid;

use crate::application::LedgerService;
use crate::domain::{AccountView, Customer, TransactionView, format_cents, parse_cents};

/// Banca - minimal banking ledger
#[derive(Parser)]
#[command(name = "banca")]
#[command(about = "Customers, accounts and atomic funds transfers over SQLite")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "BANCA_DATABASE", default_value = "banca.db")]
    pub database: String,

    /// Print results as JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging (RUST_LOG overrides this)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// List customers
    Customers,

    /// List accounts with their owners
    Accounts {
        /// Only accounts owned by this customer ID
        #[arg(long)]
        customer: Option<String>,
    },

    /// List transactions
    Transactions {
        /// Only transactions touching this account ID
        #[arg(long)]
        account: Option<String>,
    },

    /// Create a new customer
    CreateCustomer {
        /// Display name
        name: String,
    },

    /// Open an account for a customer
    CreateAccount {
        /// Owning customer ID
        #[arg(long)]
        customer: String,

        /// Initial balance (e.g., "100.00" or "100")
        #[arg(long, default_value = "0")]
        balance: String,
    },

    /// Transfer funds between two accounts
    Transfer {
        /// Amount to transfer (e.g., "40.00" or "40")
        #[arg(allow_negative_numbers = true)]
        amount: String,

        /// Source account ID
        #[arg(long)]
        from: String,

        /// Destination account ID
        #[arg(long)]
        to: String,
    },

    /// Show the balance of an account
    Balance {
        /// Account ID
        account: String,
    },

    /// Verify ledger integrity
    Check,

    /// Export data to CSV or JSON
    Export {
        /// What to export: transactions, accounts, full
        export_type: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Format: csv, json (default: csv; full only supports json)
        #[arg(short, long)]
        format: Option<String>,
    },
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `--verbose`.
pub fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "banca=debug" } else { "banca=warn" };

    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        init_tracing(self.verbose);
        let json = self.json;

        match self.command {
            Commands::Init => {
                LedgerService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Customers => {
                let service = LedgerService::connect(&self.database).await?;
                let customers = service.list_customers().await?;
                if json {
                    print_json(&customers)?;
                } else {
                    print_customers(&customers);
                }
            }

            Commands::Accounts { customer } => {
                let service = LedgerService::connect(&self.database).await?;
                let accounts = match customer {
                    Some(id) => {
                        service
                            .list_customer_accounts(parse_id(&id, "customer")?)
                            .await?
                    }
                    None => service.list_accounts().await?,
                };
                if json {
                    print_json(&accounts)?;
                } else {
                    print_accounts(&accounts);
                }
            }

            Commands::Transactions { account } => {
                let service = LedgerService::connect(&self.database).await?;
                let transactions = match account {
                    Some(id) => service.account_history(parse_id(&id, "account")?).await?,
                    None => service.list_transactions().await?,
                };
                if json {
                    print_json(&transactions)?;
                } else {
                    print_transactions(&transactions);
                }
            }

            Commands::CreateCustomer { name } => {
                let service = LedgerService::connect(&self.database).await?;
                let customer = service.create_customer(&name).await?;
                if json {
                    print_json(&customer)?;
                } else {
                    println!("Created customer: {} ({})", customer.name, customer.id);
                }
            }

            Commands::CreateAccount { customer, balance } => {
                let service = LedgerService::connect(&self.database).await?;
                let customer_id = parse_id(&customer, "customer")?;
                let balance_cents = parse_cents(&balance)
                    .context("Invalid balance format. Use '100.00' or '100'")?;

                let account = service.create_account(customer_id, balance_cents).await?;
                if json {
                    print_json(&account)?;
                } else {
                    println!(
                        "Created account: {} for {} (balance {})",
                        account.id,
                        account.customer.name,
                        format_cents(account.balance_cents)
                    );
                }
            }

            Commands::Transfer { amount, from, to } => {
                let service = LedgerService::connect(&self.database).await?;
                let amount_cents =
                    parse_cents(&amount).context("Invalid amount format. Use '40.00' or '40'")?;
                let from_id = parse_id(&from, "source account")?;
                let to_id = parse_id(&to, "destination account")?;

                let ok = service.transfer_funds(from_id, to_id, amount_cents).await?;
                if json {
                    print_json(&ok)?;
                } else {
                    println!(
                        "Transferred {} from {} to {}",
                        format_cents(amount_cents),
                        from_id,
                        to_id
                    );
                }
            }

            Commands::Balance { account } => {
                let service = LedgerService::connect(&self.database).await?;
                let view = service.get_account(parse_id(&account, "account")?).await?;
                if json {
                    print_json(&view)?;
                } else {
                    println!(
                        "{} ({}): {}",
                        view.id,
                        view.customer.name,
                        format_cents(view.balance_cents)
                    );
                }
            }

            Commands::Check => {
                let service = LedgerService::connect(&self.database).await?;
                run_check_command(&service, json).await?;
            }

            Commands::Export {
                export_type,
                output,
                format,
            } => {
                let service = LedgerService::connect(&self.database).await?;
                run_export_command(&service, &export_type, output.as_deref(), format.as_deref())
                    .await?;
            }
        }

        Ok(())
    }
}

fn parse_id(value: &str, what: &str) -> Result<Uuid> {
    Uuid::parse_str(value).with_context(|| format!("Invalid {} ID '{}' (expected UUID)", what, value))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_customers(customers: &[Customer]) {
    if customers.is_empty() {
        println!("No customers found.");
        return;
    }
    println!("{:<36}  {}", "ID", "NAME");
    println!("{}", "-".repeat(60));
    for customer in customers {
        println!("{:<36}  {}", customer.id, customer.name);
    }
}

fn print_accounts(accounts: &[AccountView]) {
    if accounts.is_empty() {
        println!("No accounts found.");
        return;
    }
    println!("{:<36}  {:<20} {:>12}", "ID", "CUSTOMER", "BALANCE");
    println!("{}", "-".repeat(72));
    for account in accounts {
        println!(
            "{:<36}  {:<20} {:>12}",
            account.id,
            account.customer.name,
            format_cents(account.balance_cents)
        );
    }
}

fn print_transactions(transactions: &[TransactionView]) {
    if transactions.is_empty() {
        println!("No transactions found.");
        return;
    }
    println!(
        "{:<36}  {:<20} {:<20} {:>12}",
        "ID", "FROM", "TO", "AMOUNT"
    );
    println!("{}", "-".repeat(94));
    for tx in transactions {
        println!(
            "{:<36}  {:<20} {:<20} {:>12}",
            tx.id,
            tx.from_account.customer.name,
            tx.to_account.customer.name,
            format_cents(tx.amount_cents)
        );
    }
}

async fn run_check_command(service: &LedgerService, json: bool) -> Result<()> {
    let report = service.check_integrity().await?;

    if json {
        print_json(&report)?;
    } else {
        println!("Checking ledger integrity...\n");
        println!("Customers:    {}", report.customer_count);
        println!("Accounts:     {}", report.account_count);
        println!("Transactions: {}", report.transaction_count);
        println!("Total held:   {}", format_cents(report.total_balance));
        println!();
    }

    if report.is_healthy() {
        if !json {
            println!("Ledger is consistent.");
        }
    } else {
        if !json {
            println!("Issues found:");
            for issue in &report.issues {
                println!("  - {}", issue);
            }
        }
        anyhow::bail!("Ledger integrity check failed");
    }

    Ok(())
}

/// What an `export` invocation writes, resolved before any output is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExportTarget {
    TransactionsCsv,
    TransactionsJson,
    AccountsCsv,
    AccountsJson,
    Full,
}

fn export_target(export_type: &str, format: Option<&str>) -> Result<ExportTarget> {
    match (export_type, format) {
        ("transactions", None | Some("csv")) => Ok(ExportTarget::TransactionsCsv),
        ("transactions", Some("json")) => Ok(ExportTarget::TransactionsJson),
        ("accounts", None | Some("csv")) => Ok(ExportTarget::AccountsCsv),
        ("accounts", Some("json")) => Ok(ExportTarget::AccountsJson),
        ("full", None | Some("json")) => Ok(ExportTarget::Full),
        ("full", Some(other)) => {
            anyhow::bail!("Invalid export format '{}' for full export. Valid formats: json", other)
        }
        ("transactions" | "accounts", Some(other)) => {
            anyhow::bail!("Invalid export format '{}'. Valid formats: csv, json", other)
        }
        _ => anyhow::bail!(
            "Invalid export type '{}'. Valid types: transactions, accounts, full",
            export_type
        ),
    }
}

async fn run_export_command(
    service: &LedgerService,
    export_type: &str,
    output: Option<&str>,
    format: Option<&str>,
) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::{Write, stdout};

    let target = export_target(export_type, format)?;
    let exporter = Exporter::new(service);

    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    match target {
        ExportTarget::TransactionsCsv => {
            let count = exporter.export_transactions_csv(writer).await?;
            if output.is_some() {
                eprintln!("Exported {} transactions", count);
            }
        }
        ExportTarget::TransactionsJson => {
            let transactions = service.list_transactions().await?;
            write_json(writer, &transactions)?;
        }
        ExportTarget::AccountsCsv => {
            let count = exporter.export_accounts_csv(writer).await?;
            if output.is_some() {
                eprintln!("Exported {} accounts", count);
            }
        }
        ExportTarget::AccountsJson => {
            let accounts = service.list_accounts().await?;
            write_json(writer, &accounts)?;
        }
        ExportTarget::Full => {
            let snapshot = exporter.export_full_json(writer).await?;
            if output.is_some() {
                eprintln!(
                    "Exported full ledger: {} customers, {} accounts, {} transactions",
                    snapshot.customers.len(),
                    snapshot.accounts.len(),
                    snapshot.transactions.len()
                );
            }
        }
    }

    Ok(())
}

fn write_json<W: std::io::Write, T: Serialize + ?Sized>(mut writer: W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    Ok(())
}
