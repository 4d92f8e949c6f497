//! In-memory implementation of both storage contracts.
//!
//! One `InMemoryStore` backs both repositories so that the cpf and credit code
//! uniqueness rules and the customer delete cascade behave like the
//! PostgreSQL schema. Cloning the store shares the same state.

use crate::errors::{AppError, AppResult};
use crate::models::{Credit, Customer, NewCredit, NewCustomer};
use crate::repository::{CreditRepository, CustomerRepository};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default)]
struct StoreState {
    customers: BTreeMap<i64, Customer>,
    credits: BTreeMap<i64, Credit>,
    next_customer_id: i64,
    next_credit_id: i64,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored credits, across all customers.
    pub async fn credit_count(&self) -> usize {
        self.state.read().await.credits.len()
    }
}

#[async_trait]
impl CustomerRepository for InMemoryStore {
    async fn save(&self, customer: NewCustomer) -> AppResult<Customer> {
        let mut state = self.state.write().await;
        if state.customers.values().any(|c| c.cpf == customer.cpf) {
            return Err(AppError::Conflict(
                "Unique constraint customers_cpf_key violated".to_string(),
            ));
        }

        state.next_customer_id += 1;
        let id = state.next_customer_id;
        let saved = Customer::from_new(id, customer);
        state.customers.insert(id, saved.clone());
        Ok(saved)
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Customer>> {
        Ok(self.state.read().await.customers.get(&id).cloned())
    }

    async fn find_by_cpf(&self, cpf: &str) -> AppResult<Option<Customer>> {
        Ok(self
            .state
            .read()
            .await
            .customers
            .values()
            .find(|c| c.cpf == cpf)
            .cloned())
    }

    async fn update(&self, customer: &Customer) -> AppResult<Customer> {
        let mut state = self.state.write().await;
        let stored = state
            .customers
            .get_mut(&customer.id)
            .ok_or_else(|| AppError::NotFound(format!("Id {} not found", customer.id)))?;

        stored.first_name = customer.first_name.clone();
        stored.last_name = customer.last_name.clone();
        stored.income = customer.income.clone();
        stored.address = customer.address.clone();
        Ok(stored.clone())
    }

    async fn delete(&self, customer: &Customer) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.customers.remove(&customer.id);
        state.credits.retain(|_, credit| credit.customer_id != customer.id);
        Ok(())
    }
}

#[async_trait]
impl CreditRepository for InMemoryStore {
    async fn save(&self, credit: NewCredit) -> AppResult<Credit> {
        let mut state = self.state.write().await;
        if !state.customers.contains_key(&credit.customer_id) {
            return Err(AppError::InternalError(format!(
                "credit references missing customer {}",
                credit.customer_id
            )));
        }
        if state
            .credits
            .values()
            .any(|c| c.credit_code == credit.credit_code)
        {
            return Err(AppError::Conflict(
                "Unique constraint credits_credit_code_key violated".to_string(),
            ));
        }

        state.next_credit_id += 1;
        let id = state.next_credit_id;
        let saved = Credit::from_new(id, credit);
        state.credits.insert(id, saved.clone());
        Ok(saved)
    }

    async fn find_by_credit_code(&self, credit_code: Uuid) -> AppResult<Option<Credit>> {
        Ok(self
            .state
            .read()
            .await
            .credits
            .values()
            .find(|c| c.credit_code == credit_code)
            .cloned())
    }

    async fn find_all_by_customer_id(&self, customer_id: i64) -> AppResult<Vec<Credit>> {
        Ok(self
            .state
            .read()
            .await
            .credits
            .values()
            .filter(|c| c.customer_id == customer_id)
            .cloned()
            .collect())
    }
}
