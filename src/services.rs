use crate::errors::{AppError, AppResult};
use crate::models::{Credit, CreditProposal, Customer, CustomerPatch, NewCredit, NewCustomer};
use crate::repository::{CreditRepository, CustomerRepository};
use std::sync::Arc;
use uuid::Uuid;

/// Registration, lookup, update and removal of customers.
#[derive(Clone)]
pub struct CustomerService {
    repository: Arc<dyn CustomerRepository>,
}

impl CustomerService {
    pub fn new(repository: Arc<dyn CustomerRepository>) -> Self {
        Self { repository }
    }

    /// Persists a new customer. A duplicate cpf fails with `Conflict`, raised by storage.
    pub async fn register(&self, customer: NewCustomer) -> AppResult<Customer> {
        self.repository.save(customer).await
    }

    /// Resolves a customer id. Every other customer lookup goes through here so
    /// that a missing id always fails the same way.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Customer> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Id {} not found", id)))
    }

    pub async fn update(&self, id: i64, patch: CustomerPatch) -> AppResult<Customer> {
        let mut customer = self.find_by_id(id).await?;
        customer.apply(patch);
        self.repository.update(&customer).await
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let customer = self.find_by_id(id).await?;
        self.repository.delete(&customer).await
    }
}

/// Opening and lookup of credits.
#[derive(Clone)]
pub struct CreditService {
    repository: Arc<dyn CreditRepository>,
    customers: CustomerService,
}

impl CreditService {
    pub fn new(repository: Arc<dyn CreditRepository>, customers: CustomerService) -> Self {
        Self {
            repository,
            customers,
        }
    }

    /// Opens a credit for an existing customer.
    ///
    /// Fails with the customer lookup's `NotFound` before anything is written.
    pub async fn create(&self, proposal: CreditProposal) -> AppResult<Credit> {
        self.create_with_owner(proposal).await.map(|(credit, _)| credit)
    }

    /// Same as [`create`](Self::create), also handing back the owner it resolved.
    pub async fn create_with_owner(&self, proposal: CreditProposal) -> AppResult<(Credit, Customer)> {
        let owner = self.customers.find_by_id(proposal.customer_id).await?;
        let credit = NewCredit::open(CreditProposal {
            customer_id: owner.id,
            ..proposal
        });
        let credit = self.repository.save(credit).await?;
        Ok((credit, owner))
    }

    /// Credits owned by `customer_id`. The customer is not required to exist;
    /// an unknown id yields an empty list.
    pub async fn find_all_by_customer(&self, customer_id: i64) -> AppResult<Vec<Credit>> {
        self.repository.find_all_by_customer_id(customer_id).await
    }

    /// Resolves a credit by code, then checks it belongs to `customer_id`.
    ///
    /// The code is looked up globally first so that a credit owned by someone
    /// else ("Contact admin") is told apart from a code that does not exist.
    pub async fn find_by_credit_code(&self, customer_id: i64, credit_code: Uuid) -> AppResult<Credit> {
        let credit = self
            .repository
            .find_by_credit_code(credit_code)
            .await?
            .ok_or_else(|| {
                AppError::InvalidArgument(format!("CreditCode {} not found", credit_code))
            })?;

        if credit.customer_id != customer_id {
            return Err(AppError::InvalidArgument("Contact admin".to_string()));
        }
        Ok(credit)
    }
}
