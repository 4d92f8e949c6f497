use std::env;
use std::str::FromStr;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::{Local, Months};
use uuid::Uuid;

use rust_credit_api::data::db_storage::{PgCreditRepository, PgCustomerRepository};
use rust_credit_api::db::Database;
use rust_credit_api::errors::AppError;
use rust_credit_api::models::{Address, CreditProposal, CreditStatus, NewCustomer, Password};
use rust_credit_api::repository::CustomerRepository;
use rust_credit_api::services::{CreditService, CustomerService};

/// Builds a registration with a random CPF-shaped value. The value does not need a valid
/// check digit here because storage does not validate it.
fn unique_customer() -> NewCustomer {
    let cpf = format!("{:011}", Uuid::new_v4().as_u128() % 100_000_000_000);
    NewCustomer {
        first_name: "Storage".to_string(),
        last_name: "Smoke".to_string(),
        cpf,
        email: "storage.smoke@email.com".to_string(),
        password: Password::new("senha123"),
        income: BigDecimal::from_str("1000.00").unwrap(),
        address: Address {
            zip_code: "12435000".to_string(),
            street: "Smoke Street".to_string(),
        },
    }
}

/// Integration smoke test for the PostgreSQL repositories.
/// Marked ignored so it never runs against a real database by accident; set TEST_DATABASE_URL to run.
#[tokio::test]
#[ignore]
async fn customer_and_credit_round_trip_smoke_test() -> anyhow::Result<()> {
    let db_url = env::var("TEST_DATABASE_URL")
        .or_else(|_| env::var("DATABASE_URL"))
        .map_err(|_| anyhow::anyhow!("Set TEST_DATABASE_URL or DATABASE_URL to run this test"))?;

    let db = Database::new(&db_url, 2).await?;
    db.migrate().await?;

    let directory = Arc::new(PgCustomerRepository::new(db.pool.clone()));
    let customers = CustomerService::new(directory.clone());
    let credits = CreditService::new(
        Arc::new(PgCreditRepository::new(db.pool.clone())),
        customers.clone(),
    );

    let registration = unique_customer();
    let customer = customers.register(registration.clone()).await?;
    assert_eq!(customers.find_by_id(customer.id).await?, customer);

    assert_eq!(
        directory.find_by_cpf(&customer.cpf).await?,
        Some(customer.clone())
    );
    assert_eq!(directory.find_by_cpf("00000000000").await?, None);

    let duplicate = customers.register(registration).await.unwrap_err();
    assert!(matches!(duplicate.root(), AppError::Conflict(_)));

    let credit = credits
        .create(CreditProposal {
            customer_id: customer.id,
            credit_value: BigDecimal::from(5000),
            day_first_installment: Local::now().date_naive() + Months::new(1),
            number_of_installments: 4,
        })
        .await?;
    assert_eq!(credit.status, CreditStatus::InProgress);

    let listed = credits.find_all_by_customer(customer.id).await?;
    assert_eq!(listed, vec![credit.clone()]);

    let found = credits
        .find_by_credit_code(customer.id, credit.credit_code)
        .await?;
    assert_eq!(found, credit);

    customers.delete(customer.id).await?;
    assert!(credits.find_all_by_customer(customer.id).await?.is_empty());
    Ok(())
}
