use tracing::{debug, info};

use crate::domain::{
    Account, AccountId, AccountView, Cents, Customer, CustomerId, IntegrityReport, Transaction,
    TransactionView, build_integrity_report,
};
use crate::storage::{Repository, TransferOutcome};

use super::AppError;

/// Application service providing the ledger operations.
/// This is the primary interface for any client (CLI, API, etc.).
pub struct LedgerService {
    repo: Repository,
}

impl LedgerService {
    /// Create a new ledger service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    // ========================
    // Customer operations
    // ========================

    /// Create a new customer.
    pub async fn create_customer(&self, name: &str) -> Result<Customer, AppError> {
        let customer = Customer::new(name)?;
        self.repo.save_customer(&customer).await?;

        info!(customer_id = %customer.id, name = %customer.name, "created customer");
        Ok(customer)
    }

    pub async fn get_customer(&self, id: CustomerId) -> Result<Customer, AppError> {
        self.repo
            .get_customer(id)
            .await?
            .ok_or_else(|| AppError::CustomerNotFound(id.to_string()))
    }

    /// List all customers in insertion order.
    pub async fn list_customers(&self) -> Result<Vec<Customer>, AppError> {
        let customers = self.repo.list_customers().await?;
        debug!(count = customers.len(), "listed customers");
        Ok(customers)
    }

    // ========================
    // Account operations
    // ========================

    /// Open an account for an existing customer.
    pub async fn create_account(
        &self,
        customer_id: CustomerId,
        initial_balance: Cents,
    ) -> Result<AccountView, AppError> {
        let account = Account::open(customer_id, initial_balance)?;
        let customer = self.get_customer(customer_id).await?;

        self.repo.save_account(&account).await?;

        info!(
            account_id = %account.id,
            customer_id = %customer.id,
            balance_cents = account.balance_cents,
            "created account"
        );
        Ok(AccountView::new(&account, customer.summary()))
    }

    /// Get an account with its owning customer.
    pub async fn get_account(&self, id: AccountId) -> Result<AccountView, AppError> {
        self.repo
            .get_account_view(id)
            .await?
            .ok_or_else(|| AppError::AccountNotFound(id.to_string()))
    }

    /// Get the current balance of an account.
    pub async fn get_balance(&self, id: AccountId) -> Result<Cents, AppError> {
        Ok(self.get_account(id).await?.balance_cents)
    }

    /// List all accounts with their customers.
    pub async fn list_accounts(&self) -> Result<Vec<AccountView>, AppError> {
        let accounts = self.repo.list_account_views().await?;
        debug!(count = accounts.len(), "listed accounts");
        Ok(accounts)
    }

    /// List the accounts owned by a customer.
    pub async fn list_customer_accounts(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<AccountView>, AppError> {
        self.get_customer(customer_id).await?;
        Ok(self.repo.list_account_views_for_customer(customer_id).await?)
    }

    // ========================
    // Transaction operations
    // ========================

    /// Move `amount_cents` from one account to another.
    ///
    /// Both balance updates and the transaction record are committed together
    /// or not at all. Returns `true` once committed.
    pub async fn transfer_funds(
        &self,
        from_account_id: AccountId,
        to_account_id: AccountId,
        amount_cents: Cents,
    ) -> Result<bool, AppError> {
        let transaction = Transaction::new(from_account_id, to_account_id, amount_cents)?;

        match self.repo.apply_transfer(&transaction).await? {
            TransferOutcome::Completed => {
                info!(
                    transaction_id = %transaction.id,
                    from = %from_account_id,
                    to = %to_account_id,
                    amount_cents,
                    "transferred funds"
                );
                Ok(true)
            }
            TransferOutcome::AccountMissing(id) => Err(AppError::AccountNotFound(id.to_string())),
            TransferOutcome::InsufficientFunds { balance } => Err(AppError::InsufficientFunds {
                account_id: from_account_id.to_string(),
                balance,
                required: amount_cents,
            }),
            TransferOutcome::BalanceOverflow { balance } => Err(AppError::BalanceOverflow {
                account_id: to_account_id.to_string(),
                balance,
                amount: amount_cents,
            }),
        }
    }

    /// List all transactions with both accounts expanded.
    pub async fn list_transactions(&self) -> Result<Vec<TransactionView>, AppError> {
        let transactions = self.repo.list_transaction_views().await?;
        debug!(count = transactions.len(), "listed transactions");
        Ok(transactions)
    }

    /// Transactions in which the account was source or destination.
    pub async fn account_history(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<TransactionView>, AppError> {
        if self.repo.get_account(account_id).await?.is_none() {
            return Err(AppError::AccountNotFound(account_id.to_string()));
        }
        Ok(self
            .repo
            .list_transaction_views_for_account(account_id)
            .await?)
    }

    // ========================
    // Integrity operations
    // ========================

    /// Check ledger integrity and return a report.
    pub async fn check_integrity(&self) -> Result<IntegrityReport, AppError> {
        let stats = self.repo.get_integrity_stats().await?;
        Ok(build_integrity_report(&stats))
    }
}
