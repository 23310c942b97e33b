mod common;

use anyhow::Result;
use banca::application::{AppError, LedgerService};
use banca::domain::ValidationError;
use common::{AliceAndBob, test_service};
use uuid::Uuid;

#[tokio::test]
async fn test_create_and_list_customers() -> Result<()> {
    let (service, _temp) = test_service().await?;

    assert!(service.list_customers().await?.is_empty());

    let alice = service.create_customer("Alice").await?;
    let bob = service.create_customer("Bob").await?;
    assert_ne!(alice.id, bob.id);

    let customers = service.list_customers().await?;
    let names: Vec<&str> = customers.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Alice", "Bob"]);
    assert_eq!(customers[0].id, alice.id);

    Ok(())
}

#[tokio::test]
async fn test_customers_keep_insertion_order() -> Result<()> {
    let (service, _temp) = test_service().await?;

    for name in ["Zoe", "Adam", "Mia"] {
        service.create_customer(name).await?;
    }

    let customers = service.list_customers().await?;
    let names: Vec<&str> = customers.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Zoe", "Adam", "Mia"]);

    Ok(())
}

#[tokio::test]
async fn test_blank_customer_name_is_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let result = service.create_customer("   ").await;
    assert!(matches!(
        result,
        Err(AppError::Validation(ValidationError::EmptyName))
    ));
    assert!(service.list_customers().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_get_customer() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let alice = service.create_customer("Alice").await?;

    let fetched = service.get_customer(alice.id).await?;
    assert_eq!(fetched.id, alice.id);
    assert_eq!(fetched.name, "Alice");

    let missing = service.get_customer(Uuid::new_v4()).await;
    assert!(matches!(missing, Err(AppError::CustomerNotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_create_account_embeds_customer() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let alice = service.create_customer("Alice").await?;

    let account = service.create_account(alice.id, 10000).await?;
    assert_eq!(account.customer.id, alice.id);
    assert_eq!(account.customer.name, "Alice");
    assert_eq!(account.balance_cents, 10000);

    let fetched = service.get_account(account.id).await?;
    assert_eq!(fetched, account);

    Ok(())
}

#[tokio::test]
async fn test_create_account_for_missing_customer_fails() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let missing = Uuid::new_v4();

    let err = service.create_account(missing, 500).await.unwrap_err();
    assert!(matches!(err, AppError::CustomerNotFound(ref id) if *id == missing.to_string()));
    assert!(err.to_string().starts_with("Customer not found"));

    assert!(service.list_accounts().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_negative_initial_balance_is_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let alice = service.create_customer("Alice").await?;

    let result = service.create_account(alice.id, -100).await;
    assert!(matches!(
        result,
        Err(AppError::Validation(ValidationError::NegativeBalance(-100)))
    ));
    assert!(service.list_accounts().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_list_accounts_joins_customers() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let fx = AliceAndBob::create(&service).await?;
    let second = service.create_account(fx.alice.id, 2500).await?;

    let accounts = service.list_accounts().await?;
    assert_eq!(accounts.len(), 3);
    assert_eq!(accounts[0].id, fx.alice_account.id);
    assert_eq!(accounts[0].customer.name, "Alice");
    assert_eq!(accounts[1].id, fx.bob_account.id);
    assert_eq!(accounts[1].customer.name, "Bob");
    assert_eq!(accounts[2].id, second.id);
    assert_eq!(accounts[2].customer.id, fx.alice.id);

    Ok(())
}

#[tokio::test]
async fn test_list_accounts_is_repeatable() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let fx = AliceAndBob::create(&service).await?;
    service
        .transfer_funds(fx.alice_account.id, fx.bob_account.id, 1234)
        .await?;

    let first = service.list_accounts().await?;
    let second = service.list_accounts().await?;
    assert_eq!(first, second);

    Ok(())
}

#[tokio::test]
async fn test_list_customer_accounts() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let fx = AliceAndBob::create(&service).await?;
    service.create_account(fx.alice.id, 0).await?;

    assert_eq!(service.list_customer_accounts(fx.alice.id).await?.len(), 2);
    assert_eq!(service.list_customer_accounts(fx.bob.id).await?.len(), 1);

    let carol = service.create_customer("Carol").await?;
    assert!(service.list_customer_accounts(carol.id).await?.is_empty());

    let missing = service.list_customer_accounts(Uuid::new_v4()).await;
    assert!(matches!(missing, Err(AppError::CustomerNotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_get_balance_for_missing_account() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let result = service.get_balance(Uuid::new_v4()).await;
    assert!(matches!(result, Err(AppError::AccountNotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_data_survives_reconnect() -> Result<()> {
    let (service, temp) = test_service().await?;
    let fx = AliceAndBob::create(&service).await?;
    service
        .transfer_funds(fx.alice_account.id, fx.bob_account.id, 4000)
        .await?;
    drop(service);

    let db_path = temp.path().join("test.db");
    let reopened = LedgerService::connect(db_path.to_str().unwrap()).await?;

    assert_eq!(reopened.list_customers().await?.len(), 2);
    assert_eq!(reopened.get_balance(fx.alice_account.id).await?, 6000);
    assert_eq!(reopened.list_transactions().await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_init_is_idempotent() -> Result<()> {
    let (service, temp) = test_service().await?;
    service.create_customer("Alice").await?;
    drop(service);

    let db_path = temp.path().join("test.db");
    let again = LedgerService::init(db_path.to_str().unwrap()).await?;
    assert_eq!(again.list_customers().await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_integrity_report_on_fresh_ledger() -> Result<()> {
    let (service, _temp) = test_service().await?;
    AliceAndBob::create(&service).await?;

    let report = service.check_integrity().await?;
    assert!(report.is_healthy());
    assert_eq!(report.customer_count, 2);
    assert_eq!(report.account_count, 2);
    assert_eq!(report.transaction_count, 0);
    assert_eq!(report.total_balance, 10000);

    Ok(())
}
