use thiserror::Error;

use crate::domain::{Cents, ValidationError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error(
        "Insufficient funds in account {account_id}: balance {balance} cents, required {required} cents"
    )]
    InsufficientFunds {
        account_id: String,
        balance: Cents,
        required: Cents,
    },

    #[error(
        "Balance overflow in account {account_id}: balance {balance} cents cannot receive {amount} cents"
    )]
    BalanceOverflow {
        account_id: String,
        balance: Cents,
        amount: Cents,
    },

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}
