use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

// ============ Domain Models ============

/// Postal address owned by exactly one customer. Stored inline with the customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub zip_code: String,
    pub street: String,
}

/// Opaque customer secret. Stored as given, never printed.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Password(String);

impl Password {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// A customer as submitted for registration, before an id is assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCustomer {
    pub first_name: String,
    pub last_name: String,
    /// National tax id, unique across all customers.
    pub cpf: String,
    pub email: String,
    pub password: Password,
    pub income: BigDecimal,
    pub address: Address,
}

/// A persisted customer.
///
/// Owned credits are not held here; they are looked up by customer id.
#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub cpf: String,
    pub email: String,
    pub password: Password,
    pub income: BigDecimal,
    pub address: Address,
}

impl Customer {
    /// Attaches a freshly assigned id to a registration.
    pub fn from_new(id: i64, new: NewCustomer) -> Self {
        Self {
            id,
            first_name: new.first_name,
            last_name: new.last_name,
            cpf: new.cpf,
            email: new.email,
            password: new.password,
            income: new.income,
            address: new.address,
        }
    }

    /// Applies the mutable subset of fields. Id, cpf, email and password never change here.
    pub fn apply(&mut self, patch: CustomerPatch) {
        self.first_name = patch.first_name;
        self.last_name = patch.last_name;
        self.income = patch.income;
        self.address.zip_code = patch.zip_code;
        self.address.street = patch.street;
    }
}

/// Changeable customer fields.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerPatch {
    pub first_name: String,
    pub last_name: String,
    pub income: BigDecimal,
    pub zip_code: String,
    pub street: String,
}

/// Credit proposal status. Only `InProgress` is ever assigned; the other
/// states are reserved for an approval workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CreditStatus {
    InProgress,
    Approved,
    Rejected,
}

impl CreditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreditStatus::InProgress => "IN_PROGRESS",
            CreditStatus::Approved => "APPROVED",
            CreditStatus::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for CreditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CreditStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IN_PROGRESS" => Ok(CreditStatus::InProgress),
            "APPROVED" => Ok(CreditStatus::Approved),
            "REJECTED" => Ok(CreditStatus::Rejected),
            other => Err(format!("Unknown credit status: {}", other)),
        }
    }
}

/// What a caller submits to open a credit for an existing customer.
#[derive(Debug, Clone, PartialEq)]
pub struct CreditProposal {
    pub customer_id: i64,
    pub credit_value: BigDecimal,
    pub day_first_installment: NaiveDate,
    pub number_of_installments: i32,
}

/// A credit ready to be persisted: code generated, status set, id not yet assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCredit {
    pub credit_code: Uuid,
    pub credit_value: BigDecimal,
    pub day_first_installment: NaiveDate,
    pub number_of_installments: i32,
    pub status: CreditStatus,
    pub customer_id: i64,
}

impl NewCredit {
    /// Opens a proposal: a random 128-bit credit code and `InProgress` status.
    pub fn open(proposal: CreditProposal) -> Self {
        Self {
            credit_code: Uuid::new_v4(),
            credit_value: proposal.credit_value,
            day_first_installment: proposal.day_first_installment,
            number_of_installments: proposal.number_of_installments,
            status: CreditStatus::InProgress,
            customer_id: proposal.customer_id,
        }
    }
}

/// A persisted credit, owned by exactly one customer.
#[derive(Debug, Clone, PartialEq)]
pub struct Credit {
    pub id: i64,
    pub credit_code: Uuid,
    pub credit_value: BigDecimal,
    pub day_first_installment: NaiveDate,
    pub number_of_installments: i32,
    pub status: CreditStatus,
    pub customer_id: i64,
}

impl Credit {
    pub fn from_new(id: i64, new: NewCredit) -> Self {
        Self {
            id,
            credit_code: new.credit_code,
            credit_value: new.credit_value,
            day_first_installment: new.day_first_installment,
            number_of_installments: new.number_of_installments,
            status: new.status,
            customer_id: new.customer_id,
        }
    }
}

// ============ API Request Models ============

/// Money fields accepted as a JSON string or number.
///
/// Numbers are read through their shortest decimal text, so `5000.10` becomes
/// `5000.1` and not the full binary expansion of the `f64`.
mod money {
    use bigdecimal::BigDecimal;
    use serde::de::{self, Deserializer, Unexpected, Visitor};
    use std::fmt;
    use std::str::FromStr;

    struct MoneyVisitor;

    impl<'de> Visitor<'de> for MoneyVisitor {
        type Value = BigDecimal;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a decimal amount as a number or a string")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<BigDecimal, E> {
            BigDecimal::from_str(v.trim()).map_err(|_| E::invalid_value(Unexpected::Str(v), &self))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<BigDecimal, E> {
            Ok(BigDecimal::from(v))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<BigDecimal, E> {
            Ok(BigDecimal::from(v))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<BigDecimal, E> {
            if !v.is_finite() {
                return Err(E::invalid_value(Unexpected::Float(v), &self));
            }
            BigDecimal::from_str(&v.to_string())
                .map_err(|_| E::invalid_value(Unexpected::Float(v), &self))
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigDecimal, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

/// Customer registration payload.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDto {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub cpf: String,
    #[serde(deserialize_with = "money::deserialize")]
    #[schema(value_type = String, example = "1000.00")]
    pub income: BigDecimal,
    #[serde(default)]
    pub email: String,
    #[serde(default = "empty_password")]
    #[schema(value_type = String)]
    pub password: Password,
    #[serde(default)]
    pub zip_code: String,
    #[serde(default)]
    pub street: String,
}

fn empty_password() -> Password {
    Password::new("")
}

impl CustomerDto {
    pub fn into_new_customer(self) -> NewCustomer {
        NewCustomer {
            first_name: self.first_name,
            last_name: self.last_name,
            cpf: self.cpf,
            email: self.email,
            password: self.password,
            income: self.income,
            address: Address {
                zip_code: self.zip_code,
                street: self.street,
            },
        }
    }
}

/// Customer update payload.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerUpdateDto {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(deserialize_with = "money::deserialize")]
    #[schema(value_type = String, example = "5000.00")]
    pub income: BigDecimal,
    #[serde(default)]
    pub zip_code: String,
    #[serde(default)]
    pub street: String,
}

impl CustomerUpdateDto {
    pub fn into_patch(self) -> CustomerPatch {
        CustomerPatch {
            first_name: self.first_name,
            last_name: self.last_name,
            income: self.income,
            zip_code: self.zip_code,
            street: self.street,
        }
    }
}

/// Credit proposal payload.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreditDto {
    #[serde(deserialize_with = "money::deserialize")]
    #[schema(value_type = String, example = "5000.00")]
    pub credit_value: BigDecimal,
    pub day_first_installment: NaiveDate,
    pub number_of_installments: i32,
    pub customer_id: i64,
}

impl CreditDto {
    pub fn into_proposal(self) -> CreditProposal {
        CreditProposal {
            customer_id: self.customer_id,
            credit_value: self.credit_value,
            day_first_installment: self.day_first_installment,
            number_of_installments: self.number_of_installments,
        }
    }
}

/// `?customerId=` query parameter.
#[derive(Debug, Clone, Copy, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CustomerIdQuery {
    /// Id of the customer the request acts on behalf of.
    pub customer_id: i64,
}

// ============ API Response Models ============

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerView {
    pub first_name: String,
    pub last_name: String,
    pub cpf: String,
    #[schema(value_type = String, example = "1000.00")]
    pub income: BigDecimal,
    pub email: String,
    pub zip_code: String,
    pub street: String,
    pub id: i64,
}

impl From<&Customer> for CustomerView {
    fn from(customer: &Customer) -> Self {
        Self {
            first_name: customer.first_name.clone(),
            last_name: customer.last_name.clone(),
            cpf: customer.cpf.clone(),
            income: customer.income.clone(),
            email: customer.email.clone(),
            zip_code: customer.address.zip_code.clone(),
            street: customer.address.street.clone(),
            id: customer.id,
        }
    }
}

/// Full credit detail, including a summary of the owning customer.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreditView {
    pub credit_code: Uuid,
    #[schema(value_type = String, example = "5000.00")]
    pub credit_value: BigDecimal,
    pub number_of_installments: i32,
    pub status: CreditStatus,
    pub email_customer: String,
    #[schema(value_type = String, example = "1000.00")]
    pub income_customer: BigDecimal,
}

impl CreditView {
    pub fn new(credit: &Credit, owner: &Customer) -> Self {
        Self {
            credit_code: credit.credit_code,
            credit_value: credit.credit_value.clone(),
            number_of_installments: credit.number_of_installments,
            status: credit.status,
            email_customer: owner.email.clone(),
            income_customer: owner.income.clone(),
        }
    }
}

/// Credit summary used in per-customer listings.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreditListView {
    pub credit_code: Uuid,
    #[schema(value_type = String, example = "5000.00")]
    pub credit_value: BigDecimal,
    pub number_of_installments: i32,
}

impl From<&Credit> for CreditListView {
    fn from(credit: &Credit) -> Self {
        Self {
            credit_code: credit.credit_code,
            credit_value: credit.credit_value.clone(),
            number_of_installments: credit.number_of_installments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proposal() -> CreditProposal {
        CreditProposal {
            customer_id: 1,
            credit_value: BigDecimal::from_str("5000.00").unwrap(),
            day_first_installment: NaiveDate::from_ymd_opt(2030, 2, 3).unwrap(),
            number_of_installments: 4,
        }
    }

    #[test]
    fn opened_credit_is_in_progress_with_fresh_code() {
        let first = NewCredit::open(proposal());
        let second = NewCredit::open(proposal());

        assert_eq!(first.status, CreditStatus::InProgress);
        assert!(!first.credit_code.is_nil());
        assert_ne!(first.credit_code, second.credit_code);
    }

    #[test]
    fn status_round_trips_through_its_wire_name() {
        for status in [
            CreditStatus::InProgress,
            CreditStatus::Approved,
            CreditStatus::Rejected,
        ] {
            assert_eq!(CreditStatus::from_str(status.as_str()), Ok(status));
        }
        assert!(CreditStatus::from_str("PENDING").is_err());
        assert_eq!(
            serde_json::to_value(CreditStatus::InProgress).unwrap(),
            serde_json::json!("IN_PROGRESS")
        );
    }

    #[test]
    fn patch_leaves_identity_fields_untouched() {
        let mut customer = Customer {
            id: 3,
            first_name: "Matheus".to_string(),
            last_name: "Dev".to_string(),
            cpf: "32632437059".to_string(),
            email: "matheus.dev@email.com".to_string(),
            password: Password::new("senha123"),
            income: BigDecimal::from(1000),
            address: Address {
                zip_code: "12435000".to_string(),
                street: "Matheus Street".to_string(),
            },
        };

        customer.apply(CustomerPatch {
            first_name: "MatheusUpdate".to_string(),
            last_name: "DevUpdate".to_string(),
            income: BigDecimal::from(5000),
            zip_code: "45656000".to_string(),
            street: "Matheus Street Updated".to_string(),
        });

        assert_eq!(customer.id, 3);
        assert_eq!(customer.cpf, "32632437059");
        assert_eq!(customer.email, "matheus.dev@email.com");
        assert_eq!(customer.password.expose(), "senha123");
        assert_eq!(customer.first_name, "MatheusUpdate");
        assert_eq!(customer.address.street, "Matheus Street Updated");
    }

    #[test]
    fn password_is_redacted_in_debug_output() {
        let password = Password::new("senha123");
        assert_eq!(format!("{:?}", password), "[REDACTED]");
    }

    #[test]
    fn customer_dto_reads_camel_case_and_numeric_income() {
        let dto: CustomerDto = serde_json::from_value(serde_json::json!({
            "firstName": "Matheus",
            "lastName": "Dev",
            "cpf": "32632437059",
            "income": 1000.0,
            "email": "matheus.dev@email.com",
            "password": "senha123",
            "zipCode": "12435000",
            "street": "Matheus Street"
        }))
        .unwrap();

        let new = dto.into_new_customer();
        assert_eq!(new.income, BigDecimal::from(1000));
        assert_eq!(new.address.zip_code, "12435000");
    }

    #[test]
    fn money_from_json_number_keeps_its_decimal_text() {
        let dto: CreditDto = serde_json::from_value(serde_json::json!({
            "creditValue": 5000.10,
            "dayFirstInstallment": "2030-02-03",
            "numberOfInstallments": 4,
            "customerId": 1
        }))
        .unwrap();

        assert_eq!(dto.credit_value, BigDecimal::from_str("5000.1").unwrap());
        assert_eq!(dto.credit_value.to_string(), "5000.1");
    }

    #[test]
    fn money_accepts_strings_and_integers() {
        let from_string: CustomerUpdateDto = serde_json::from_value(serde_json::json!({
            "firstName": "A",
            "lastName": "B",
            "income": "1234.56",
            "zipCode": "1",
            "street": "S"
        }))
        .unwrap();
        assert_eq!(from_string.income.to_string(), "1234.56");

        let from_integer: CustomerUpdateDto = serde_json::from_value(serde_json::json!({
            "income": 7000
        }))
        .unwrap();
        assert_eq!(from_integer.income, BigDecimal::from(7000));

        let garbage = serde_json::from_value::<CustomerUpdateDto>(serde_json::json!({
            "income": "a lot"
        }));
        assert!(garbage.is_err());
    }
}
