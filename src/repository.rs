//! Storage contracts for customers and credits.
//!
//! Both contracts report uniqueness violations (cpf, credit code) as
//! `AppError::Conflict`; the services never pre-check uniqueness.

use crate::errors::AppResult;
use crate::models::{Credit, Customer, NewCredit, NewCustomer};
use async_trait::async_trait;
use uuid::Uuid;

/// Customer directory.
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Persists a new customer and returns it with its assigned id.
    async fn save(&self, customer: NewCustomer) -> AppResult<Customer>;

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Customer>>;

    async fn find_by_cpf(&self, cpf: &str) -> AppResult<Option<Customer>>;

    /// Writes back every mutable field of an already persisted customer.
    async fn update(&self, customer: &Customer) -> AppResult<Customer>;

    async fn delete(&self, customer: &Customer) -> AppResult<()>;
}

/// Credit ledger.
#[async_trait]
pub trait CreditRepository: Send + Sync {
    /// Persists a new credit and returns it with its assigned id.
    async fn save(&self, credit: NewCredit) -> AppResult<Credit>;

    async fn find_by_credit_code(&self, credit_code: Uuid) -> AppResult<Option<Credit>>;

    /// Credits owned by `customer_id`, in storage order.
    async fn find_all_by_customer_id(&self, customer_id: i64) -> AppResult<Vec<Credit>>;
}
