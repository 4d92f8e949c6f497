//! Field validation for request payloads.
//!
//! Runs at the API boundary; the services assume their inputs already passed.

use crate::errors::AppError;
use crate::models::{CreditDto, CustomerDto, CustomerUpdateDto};
use bigdecimal::{BigDecimal, Zero};
use chrono::{Local, NaiveDate};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Inclusive bounds for the number of installments.
pub const MIN_INSTALLMENTS: i32 = 1;
pub const MAX_INSTALLMENTS: i32 = 48;

/// Implemented by every payload accepted through `ValidatedJson`.
pub trait Validate {
    /// Returns every failing field with its message, or `Ok` when the payload is acceptable.
    fn validate(&self) -> Result<(), AppError>;
}

/// Collects failures per field; the first message recorded for a field wins.
#[derive(Debug, Default)]
struct Violations(BTreeMap<String, String>);

impl Violations {
    fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.0
                .entry(field.to_string())
                .or_insert_with(|| message.to_string());
        }
    }

    fn present(&mut self, value: &str, field: &str, message: &str) {
        self.check(!value.trim().is_empty(), field, message);
    }

    fn finish(self) -> Result<(), AppError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self.0))
        }
    }
}

/// Validate a Brazilian CPF.
///
/// Accepts 11 bare digits or the `ddd.ddd.ddd-dd` mask. Rejects sequences of a
/// single repeated digit and numbers whose two mod-11 check digits do not match.
pub fn is_valid_cpf(raw: &str) -> bool {
    if !cpf_regex().is_match(raw) {
        return false;
    }

    let digits: Vec<u32> = raw.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() != 11 {
        return false;
    }
    if digits.iter().all(|d| *d == digits[0]) {
        return false;
    }

    let check_digit = |len: usize| -> u32 {
        let weight_start = len as u32 + 1;
        let sum: u32 = digits[..len]
            .iter()
            .enumerate()
            .map(|(i, d)| d * (weight_start - i as u32))
            .sum();
        let rest = (sum * 10) % 11;
        if rest == 10 {
            0
        } else {
            rest
        }
    };

    check_digit(9) == digits[9] && check_digit(10) == digits[10]
}

fn cpf_regex() -> &'static Regex {
    static CPF: OnceLock<Regex> = OnceLock::new();
    CPF.get_or_init(|| {
        Regex::new(r"^(?:[0-9]{3}\.[0-9]{3}\.[0-9]{3}-[0-9]{2}|[0-9]{11})$")
            .expect("cpf pattern is a valid regex")
    })
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    // RFC 5322 simplified: local@domain.tld
    EMAIL.get_or_init(|| {
        Regex::new(
            r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$",
        )
        .expect("email pattern is a valid regex")
    })
}

/// Validate an email address format.
pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

/// True when `day` is strictly after `today`.
pub fn is_future_date(day: NaiveDate, today: NaiveDate) -> bool {
    day > today
}

pub fn is_valid_installment_count(count: i32) -> bool {
    (MIN_INSTALLMENTS..=MAX_INSTALLMENTS).contains(&count)
}

impl Validate for CustomerDto {
    fn validate(&self) -> Result<(), AppError> {
        let mut v = Violations::default();
        v.present(&self.first_name, "firstName", "First name must to be present");
        v.present(&self.last_name, "lastName", "Last name must to be present");
        v.present(&self.cpf, "cpf", "CPF must to be present");
        v.check(is_valid_cpf(&self.cpf), "cpf", "CPF invalid");
        v.present(&self.email, "email", "Email must to be present");
        v.check(is_valid_email(&self.email), "email", "Email invalid");
        v.present(self.password.expose(), "password", "Password must to be present");
        v.present(&self.zip_code, "zipCode", "Zip code must to be present");
        v.present(&self.street, "street", "Street must to be present");
        v.check(
            self.income >= BigDecimal::zero(),
            "income",
            "Income must be non-negative",
        );
        v.finish()
    }
}

impl Validate for CustomerUpdateDto {
    fn validate(&self) -> Result<(), AppError> {
        let mut v = Violations::default();
        v.present(&self.first_name, "firstName", "First name must to be present");
        v.present(&self.last_name, "lastName", "Last name must to be present");
        v.present(&self.zip_code, "zipCode", "Zip code must to be present");
        v.present(&self.street, "street", "Street must to be present");
        v.check(
            self.income >= BigDecimal::zero(),
            "income",
            "Income must be non-negative",
        );
        v.finish()
    }
}

impl Validate for CreditDto {
    fn validate(&self) -> Result<(), AppError> {
        let today = Local::now().date_naive();
        let mut v = Violations::default();
        v.check(
            self.credit_value > BigDecimal::zero(),
            "creditValue",
            "Credit value must be positive",
        );
        v.check(
            is_future_date(self.day_first_installment, today),
            "dayFirstInstallment",
            "Day of first installment must to be in the future",
        );
        v.check(
            is_valid_installment_count(self.number_of_installments),
            "numberOfInstallments",
            "The maximum number of installments allowed is between 1 and 48",
        );
        v.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Password;
    use chrono::Duration;
    use std::str::FromStr;

    fn customer_dto() -> CustomerDto {
        CustomerDto {
            first_name: "Matheus".to_string(),
            last_name: "Dev".to_string(),
            cpf: "32632437059".to_string(),
            income: BigDecimal::from_str("1000.00").unwrap(),
            email: "matheus.dev@email.com".to_string(),
            password: Password::new("senha123"),
            zip_code: "12435000".to_string(),
            street: "Matheus Street".to_string(),
        }
    }

    fn credit_dto(installments: i32, days_ahead: i64) -> CreditDto {
        CreditDto {
            credit_value: BigDecimal::from_str("5000.00").unwrap(),
            day_first_installment: Local::now().date_naive() + Duration::days(days_ahead),
            number_of_installments: installments,
            customer_id: 1,
        }
    }

    fn failing_fields(err: AppError) -> Vec<String> {
        match err {
            AppError::Validation(details) => details.into_keys().collect(),
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_cpfs() {
        assert!(is_valid_cpf("32632437059"));
        assert!(is_valid_cpf("326.324.370-59"));
        assert!(is_valid_cpf("52998224725"));
    }

    #[test]
    fn test_invalid_cpfs() {
        assert!(!is_valid_cpf(""));
        assert!(!is_valid_cpf("32632437058"));
        assert!(!is_valid_cpf("3263243705"));
        assert!(!is_valid_cpf("11111111111"));
        assert!(!is_valid_cpf("3263243705a"));
    }

    #[test]
    fn test_cpf_separators_only_in_mask_positions() {
        assert!(!is_valid_cpf("3-2.6.3...2437059"));
        assert!(!is_valid_cpf("326324370-59"));
        assert!(!is_valid_cpf("326.324.37059"));
        assert!(!is_valid_cpf("326-324-370.59"));
        assert!(!is_valid_cpf(" 32632437059"));
    }

    #[test]
    fn test_emails() {
        assert!(is_valid_email("matheus.dev@email.com"));
        assert!(is_valid_email("user+tag@example.co.uk"));
        assert!(!is_valid_email("matheus.dev"));
        assert!(!is_valid_email("user@localhost"));
        assert!(!is_valid_email("user @example.com"));
    }

    #[test]
    fn valid_customer_passes() {
        assert!(customer_dto().validate().is_ok());
    }

    #[test]
    fn empty_first_name_is_reported() {
        let mut dto = customer_dto();
        dto.first_name = String::new();
        assert_eq!(failing_fields(dto.validate().unwrap_err()), vec!["firstName"]);
    }

    #[test]
    fn every_failing_field_is_reported() {
        let mut dto = customer_dto();
        dto.cpf = "123".to_string();
        dto.email = "nope".to_string();
        dto.income = BigDecimal::from(-1);
        assert_eq!(
            failing_fields(dto.validate().unwrap_err()),
            vec!["cpf", "email", "income"]
        );
    }

    #[test]
    fn update_requires_street() {
        let dto = CustomerUpdateDto {
            first_name: "A".to_string(),
            last_name: "B".to_string(),
            income: BigDecimal::from(10),
            zip_code: "45656000".to_string(),
            street: "   ".to_string(),
        };
        assert_eq!(failing_fields(dto.validate().unwrap_err()), vec!["street"]);
    }

    #[test]
    fn installment_bounds_are_inclusive() {
        assert!(credit_dto(1, 30).validate().is_ok());
        assert!(credit_dto(48, 30).validate().is_ok());
        assert_eq!(
            failing_fields(credit_dto(0, 30).validate().unwrap_err()),
            vec!["numberOfInstallments"]
        );
        assert_eq!(
            failing_fields(credit_dto(49, 30).validate().unwrap_err()),
            vec!["numberOfInstallments"]
        );
    }

    #[test]
    fn first_installment_must_be_after_today() {
        assert_eq!(
            failing_fields(credit_dto(4, 0).validate().unwrap_err()),
            vec!["dayFirstInstallment"]
        );
        assert!(credit_dto(4, 1).validate().is_ok());
    }

    #[test]
    fn credit_value_must_be_positive() {
        let mut dto = credit_dto(4, 30);
        dto.credit_value = BigDecimal::zero();
        assert_eq!(failing_fields(dto.validate().unwrap_err()), vec!["creditValue"]);
    }
}
