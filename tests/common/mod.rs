// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use banca::application::LedgerService;
use banca::domain::{AccountId, AccountView, Cents, Customer};
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = LedgerService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Test fixture: Alice with 100.00 and Bob with 0.00
pub struct AliceAndBob {
    pub alice: Customer,
    pub bob: Customer,
    pub alice_account: AccountView,
    pub bob_account: AccountView,
}

impl AliceAndBob {
    pub async fn create(service: &LedgerService) -> Result<Self> {
        let alice = service.create_customer("Alice").await?;
        let alice_account = service.create_account(alice.id, 10000).await?;
        let bob = service.create_customer("Bob").await?;
        let bob_account = service.create_account(bob.id, 0).await?;

        Ok(Self {
            alice,
            bob,
            alice_account,
            bob_account,
        })
    }
}

/// Current balance of an account, read back from the store
pub async fn balance_of(service: &LedgerService, id: AccountId) -> Result<Cents> {
    Ok(service.get_balance(id).await?)
}
