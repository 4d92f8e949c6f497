use crate::errors::{AppError, AppResult, ResultExt};
use crate::models::{Address, Credit, CreditStatus, Customer, NewCredit, NewCustomer, Password};
use crate::repository::{CreditRepository, CustomerRepository};
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use uuid::Uuid;

const CUSTOMER_COLUMNS: &str =
    "id, first_name, last_name, cpf, email, password, income, zip_code, street";

const CREDIT_COLUMNS: &str = "id, credit_code, credit_value, day_first_installment, \
     number_of_installments, status, customer_id";

#[derive(Debug, FromRow)]
struct CustomerRow {
    id: i64,
    first_name: String,
    last_name: String,
    cpf: String,
    email: String,
    password: String,
    income: BigDecimal,
    zip_code: String,
    street: String,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            cpf: row.cpf,
            email: row.email,
            password: Password::new(row.password),
            income: row.income,
            address: Address {
                zip_code: row.zip_code,
                street: row.street,
            },
        }
    }
}

#[derive(Debug, FromRow)]
struct CreditRow {
    id: i64,
    credit_code: Uuid,
    credit_value: BigDecimal,
    day_first_installment: NaiveDate,
    number_of_installments: i32,
    status: String,
    customer_id: i64,
}

impl TryFrom<CreditRow> for Credit {
    type Error = AppError;

    fn try_from(row: CreditRow) -> Result<Self, Self::Error> {
        let status = CreditStatus::from_str(&row.status).map_err(AppError::InternalError)?;
        Ok(Credit {
            id: row.id,
            credit_code: row.credit_code,
            credit_value: row.credit_value,
            day_first_installment: row.day_first_installment,
            number_of_installments: row.number_of_installments,
            status,
            customer_id: row.customer_id,
        })
    }
}

/// PostgreSQL-backed customer directory.
#[derive(Clone)]
pub struct PgCustomerRepository {
    pool: PgPool,
}

impl PgCustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerRepository for PgCustomerRepository {
    async fn save(&self, customer: NewCustomer) -> AppResult<Customer> {
        // A duplicate cpf surfaces as a unique violation and converts to Conflict.
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            r#"
            INSERT INTO customers (first_name, last_name, cpf, email, password, income, zip_code, street)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            CUSTOMER_COLUMNS
        ))
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(&customer.cpf)
        .bind(&customer.email)
        .bind(customer.password.expose())
        .bind(&customer.income)
        .bind(&customer.address.zip_code)
        .bind(&customer.address.street)
        .fetch_one(&self.pool)
        .await
        .context("inserting customer")?;

        tracing::debug!("Inserted customer {}", row.id);
        Ok(row.into())
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Customer>> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {} FROM customers WHERE id = $1",
            CUSTOMER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("loading customer {}", id))?;

        Ok(row.map(Customer::from))
    }

    async fn find_by_cpf(&self, cpf: &str) -> AppResult<Option<Customer>> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {} FROM customers WHERE cpf = $1",
            CUSTOMER_COLUMNS
        ))
        .bind(cpf)
        .fetch_optional(&self.pool)
        .await
        .context("loading customer by cpf")?;

        Ok(row.map(Customer::from))
    }

    async fn update(&self, customer: &Customer) -> AppResult<Customer> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            r#"
            UPDATE customers
            SET first_name = $2,
                last_name = $3,
                income = $4,
                zip_code = $5,
                street = $6
            WHERE id = $1
            RETURNING {}
            "#,
            CUSTOMER_COLUMNS
        ))
        .bind(customer.id)
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(&customer.income)
        .bind(&customer.address.zip_code)
        .bind(&customer.address.street)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("updating customer {}", customer.id))?
        .ok_or_else(|| AppError::NotFound(format!("Id {} not found", customer.id)))?;

        Ok(row.into())
    }

    async fn delete(&self, customer: &Customer) -> AppResult<()> {
        // credits.customer_id is ON DELETE CASCADE
        sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(customer.id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("deleting customer {}", customer.id))?;

        tracing::debug!("Deleted customer {}", customer.id);
        Ok(())
    }
}

/// PostgreSQL-backed credit ledger.
#[derive(Clone)]
pub struct PgCreditRepository {
    pool: PgPool,
}

impl PgCreditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CreditRepository for PgCreditRepository {
    async fn save(&self, credit: NewCredit) -> AppResult<Credit> {
        let row = sqlx::query_as::<_, CreditRow>(&format!(
            r#"
            INSERT INTO credits (credit_code, credit_value, day_first_installment, number_of_installments, status, customer_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            CREDIT_COLUMNS
        ))
        .bind(credit.credit_code)
        .bind(&credit.credit_value)
        .bind(credit.day_first_installment)
        .bind(credit.number_of_installments)
        .bind(credit.status.as_str())
        .bind(credit.customer_id)
        .fetch_one(&self.pool)
        .await
        .context("inserting credit")?;

        tracing::debug!("Inserted credit {} for customer {}", row.credit_code, row.customer_id);
        Credit::try_from(row)
    }

    async fn find_by_credit_code(&self, credit_code: Uuid) -> AppResult<Option<Credit>> {
        let row = sqlx::query_as::<_, CreditRow>(&format!(
            "SELECT {} FROM credits WHERE credit_code = $1",
            CREDIT_COLUMNS
        ))
        .bind(credit_code)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("loading credit {}", credit_code))?;

        row.map(Credit::try_from).transpose()
    }

    async fn find_all_by_customer_id(&self, customer_id: i64) -> AppResult<Vec<Credit>> {
        let rows = sqlx::query_as::<_, CreditRow>(&format!(
            "SELECT {} FROM credits WHERE customer_id = $1 ORDER BY id ASC",
            CREDIT_COLUMNS
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("listing credits of customer {}", customer_id))?;

        rows.into_iter().map(Credit::try_from).collect()
    }
}
