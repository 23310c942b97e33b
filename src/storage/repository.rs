use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, Row, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::domain::{
    Account, AccountId, AccountView, Cents, Customer, CustomerId, CustomerSummary,
    IntegrityStats, Transaction, TransactionView,
};

use super::MIGRATION_001_INITIAL;

/// How a transfer attempt ended inside the store.
/// Expected refusals are values, not errors; `Err` is reserved for store failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    Completed,
    AccountMissing(AccountId),
    InsufficientFunds { balance: Cents },
    /// Crediting the destination would exceed the largest storable balance
    BalanceOverflow { balance: Cents },
}

/// Joined projection shared by every account listing.
const ACCOUNT_VIEW_SELECT: &str = r#"
    SELECT a.id, a.balance_cents, c.id AS customer_id, c.name AS customer_name
    FROM accounts a
    JOIN customers c ON c.id = a.customer_id
"#;

/// Transactions with both accounts and both customers expanded in one pass.
const TRANSACTION_VIEW_SELECT: &str = r#"
    SELECT
        t.id, t.amount_cents, t.created_at,
        fa.id AS from_id, fa.balance_cents AS from_balance,
        fc.id AS from_customer_id, fc.name AS from_customer_name,
        ta.id AS to_id, ta.balance_cents AS to_balance,
        tc.id AS to_customer_id, tc.name AS to_customer_name
    FROM transactions t
    JOIN accounts fa ON fa.id = t.from_account_id
    JOIN customers fc ON fc.id = fa.customer_id
    JOIN accounts ta ON ta.id = t.to_account_id
    JOIN customers tc ON tc.id = ta.customer_id
"#;

/// Repository for persisting and querying customers, accounts and transactions.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations. Safe to run more than once.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    // ========================
    // Customer operations
    // ========================

    pub async fn save_customer(&self, customer: &Customer) -> Result<()> {
        sqlx::query("INSERT INTO customers (id, name, created_at) VALUES (?, ?, ?)")
            .bind(customer.id.to_string())
            .bind(&customer.name)
            .bind(customer.created_at.to_rfc3339())
            .execute(&self.pool)
            .await
            .context("Failed to save customer")?;
        Ok(())
    }

    pub async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>> {
        let row = sqlx::query("SELECT id, name, created_at FROM customers WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch customer")?;

        row.as_ref().map(Self::row_to_customer).transpose()
    }

    /// List all customers in insertion order.
    pub async fn list_customers(&self) -> Result<Vec<Customer>> {
        let rows = sqlx::query("SELECT id, name, created_at FROM customers ORDER BY rowid")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list customers")?;

        rows.iter().map(Self::row_to_customer).collect()
    }

    fn row_to_customer(row: &SqliteRow) -> Result<Customer> {
        let id_str: String = row.get("id");
        let created_at_str: String = row.get("created_at");

        Ok(Customer {
            id: Uuid::parse_str(&id_str).context("Invalid customer ID")?,
            name: row.get("name"),
            created_at: parse_timestamp(&created_at_str)?,
        })
    }

    // ========================
    // Account operations
    // ========================

    pub async fn save_account(&self, account: &Account) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, customer_id, balance_cents, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(account.id.to_string())
        .bind(account.customer_id.to_string())
        .bind(account.balance_cents)
        .bind(account.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save account")?;
        Ok(())
    }

    pub async fn get_account(&self, id: AccountId) -> Result<Option<Account>> {
        fetch_account(&self.pool, id).await
    }

    /// Get one account joined with its customer.
    pub async fn get_account_view(&self, id: AccountId) -> Result<Option<AccountView>> {
        let query = format!("{ACCOUNT_VIEW_SELECT} WHERE a.id = ?");
        let row = sqlx::query(&query)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch account")?;

        row.as_ref().map(Self::row_to_account_view).transpose()
    }

    /// List all accounts with their customers, in insertion order.
    pub async fn list_account_views(&self) -> Result<Vec<AccountView>> {
        let query = format!("{ACCOUNT_VIEW_SELECT} ORDER BY a.rowid");
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list accounts")?;

        rows.iter().map(Self::row_to_account_view).collect()
    }

    /// List the accounts owned by one customer.
    pub async fn list_account_views_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<AccountView>> {
        let query = format!("{ACCOUNT_VIEW_SELECT} WHERE a.customer_id = ? ORDER BY a.rowid");
        let rows = sqlx::query(&query)
            .bind(customer_id.to_string())
            .fetch_all(&self.pool)
            .await
            .context("Failed to list accounts for customer")?;

        rows.iter().map(Self::row_to_account_view).collect()
    }

    fn row_to_account_view(row: &SqliteRow) -> Result<AccountView> {
        account_view_from(row, "id", "balance_cents", "customer_id", "customer_name")
    }

    // ========================
    // Transaction operations
    // ========================

    /// List all transactions, fully expanded, in insertion order.
    pub async fn list_transaction_views(&self) -> Result<Vec<TransactionView>> {
        let query = format!("{TRANSACTION_VIEW_SELECT} ORDER BY t.rowid");
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list transactions")?;

        rows.iter().map(Self::row_to_transaction_view).collect()
    }

    /// List transactions where the account is source or destination.
    pub async fn list_transaction_views_for_account(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<TransactionView>> {
        let query = format!(
            "{TRANSACTION_VIEW_SELECT} WHERE t.from_account_id = ? OR t.to_account_id = ? ORDER BY t.rowid"
        );
        let account_id_str = account_id.to_string();
        let rows = sqlx::query(&query)
            .bind(&account_id_str)
            .bind(&account_id_str)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list transactions for account")?;

        rows.iter().map(Self::row_to_transaction_view).collect()
    }

    /// Move money between two accounts and record the transaction.
    ///
    /// The store transaction is opened with `BEGIN IMMEDIATE`, so it holds the
    /// write lock from its first read and concurrent transfers queue on the
    /// busy timeout instead of failing on a lock upgrade.
    /// Returning early drops `tx`, which rolls back anything already written.
    pub async fn apply_transfer(&self, transaction: &Transaction) -> Result<TransferOutcome> {
        let mut tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .context("Failed to begin transfer")?;

        let Some(from_account) = fetch_account(&mut *tx, transaction.from_account).await? else {
            return Ok(TransferOutcome::AccountMissing(transaction.from_account));
        };
        let Some(to_account) = fetch_account(&mut *tx, transaction.to_account).await? else {
            return Ok(TransferOutcome::AccountMissing(transaction.to_account));
        };

        if !from_account.can_cover(transaction.amount_cents) {
            return Ok(TransferOutcome::InsufficientFunds {
                balance: from_account.balance_cents,
            });
        }
        let Some(credited) = to_account
            .balance_cents
            .checked_add(transaction.amount_cents)
        else {
            return Ok(TransferOutcome::BalanceOverflow {
                balance: to_account.balance_cents,
            });
        };

        sqlx::query("UPDATE accounts SET balance_cents = ? WHERE id = ?")
            .bind(from_account.balance_cents - transaction.amount_cents)
            .bind(transaction.from_account.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to debit source account")?;

        sqlx::query("UPDATE accounts SET balance_cents = ? WHERE id = ?")
            .bind(credited)
            .bind(transaction.to_account.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to credit destination account")?;

        sqlx::query(
            r#"
            INSERT INTO transactions (id, from_account_id, to_account_id, amount_cents, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(transaction.id.to_string())
        .bind(transaction.from_account.to_string())
        .bind(transaction.to_account.to_string())
        .bind(transaction.amount_cents)
        .bind(transaction.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await
        .context("Failed to record transaction")?;

        tx.commit().await.context("Failed to commit transfer")?;

        Ok(TransferOutcome::Completed)
    }

    fn row_to_transaction_view(row: &SqliteRow) -> Result<TransactionView> {
        let id_str: String = row.get("id");
        let created_at_str: String = row.get("created_at");

        Ok(TransactionView {
            id: Uuid::parse_str(&id_str).context("Invalid transaction ID")?,
            amount_cents: row.get("amount_cents"),
            from_account: account_view_from(
                row,
                "from_id",
                "from_balance",
                "from_customer_id",
                "from_customer_name",
            )?,
            to_account: account_view_from(
                row,
                "to_id",
                "to_balance",
                "to_customer_id",
                "to_customer_name",
            )?,
            created_at: parse_timestamp(&created_at_str)?,
        })
    }

    // ========================
    // Integrity operations
    // ========================

    /// Gather the counts used by the integrity check.
    pub async fn get_integrity_stats(&self) -> Result<IntegrityStats> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM customers) AS customer_count,
                (SELECT COUNT(*) FROM accounts) AS account_count,
                (SELECT COUNT(*) FROM transactions) AS transaction_count,
                (SELECT COALESCE(SUM(balance_cents), 0) FROM accounts) AS total_balance,
                (SELECT COUNT(*) FROM accounts WHERE balance_cents < 0) AS negative_balances,
                (SELECT COUNT(*) FROM accounts a
                    WHERE NOT EXISTS (SELECT 1 FROM customers c WHERE c.id = a.customer_id)
                ) AS orphan_accounts,
                (SELECT COUNT(*) FROM transactions t
                    WHERE NOT EXISTS (SELECT 1 FROM accounts a WHERE a.id = t.from_account_id)
                       OR NOT EXISTS (SELECT 1 FROM accounts a WHERE a.id = t.to_account_id)
                ) AS dangling_transactions,
                (SELECT COUNT(*) FROM transactions WHERE amount_cents <= 0) AS invalid_amounts,
                (SELECT COUNT(*) FROM transactions WHERE from_account_id = to_account_id) AS self_transfers
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .context("Failed to gather integrity statistics")?;

        Ok(IntegrityStats {
            customer_count: row.get("customer_count"),
            account_count: row.get("account_count"),
            transaction_count: row.get("transaction_count"),
            total_balance: row.get("total_balance"),
            negative_balances: row.get("negative_balances"),
            orphan_accounts: row.get("orphan_accounts"),
            dangling_transactions: row.get("dangling_transactions"),
            invalid_amounts: row.get("invalid_amounts"),
            self_transfers: row.get("self_transfers"),
        })
    }
}

/// Load a single account row through any executor (pool or open transaction).
async fn fetch_account<'e, E>(executor: E, id: AccountId) -> Result<Option<Account>>
where
    E: 'e + Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query(
        "SELECT id, customer_id, balance_cents, created_at FROM accounts WHERE id = ?",
    )
    .bind(id.to_string())
    .fetch_optional(executor)
    .await
    .context("Failed to fetch account")?;

    row.as_ref().map(row_to_account).transpose()
}

fn row_to_account(row: &SqliteRow) -> Result<Account> {
    let id_str: String = row.get("id");
    let customer_id_str: String = row.get("customer_id");
    let created_at_str: String = row.get("created_at");

    Ok(Account {
        id: Uuid::parse_str(&id_str).context("Invalid account ID")?,
        customer_id: Uuid::parse_str(&customer_id_str).context("Invalid customer ID")?,
        balance_cents: row.get("balance_cents"),
        created_at: parse_timestamp(&created_at_str)?,
    })
}

/// Build an account view from aliased columns of a joined row.
fn account_view_from(
    row: &SqliteRow,
    id_col: &str,
    balance_col: &str,
    customer_id_col: &str,
    customer_name_col: &str,
) -> Result<AccountView> {
    let id_str: String = row.get(id_col);
    let customer_id_str: String = row.get(customer_id_col);

    Ok(AccountView {
        id: Uuid::parse_str(&id_str).context("Invalid account ID")?,
        balance_cents: row.get(balance_col),
        customer: CustomerSummary {
            id: Uuid::parse_str(&customer_id_str).context("Invalid customer ID")?,
            name: row.get(customer_name_col),
        },
    })
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)
        .context("Invalid timestamp")?
        .with_timezone(&Utc))
}
