/// Property-based tests using proptest
/// Tests invariants of CPF and installment validation for all inputs
use proptest::prelude::*;
use rust_credit_api::validation::{is_valid_cpf, is_valid_email, is_valid_installment_count};

/// Appends the two mod-11 check digits to a 9-digit base.
fn with_check_digits(base: &[u32]) -> Vec<u32> {
    let mut digits = base.to_vec();
    for len in [9usize, 10] {
        let sum: u32 = digits[..len]
            .iter()
            .enumerate()
            .map(|(i, d)| d * (len as u32 + 1 - i as u32))
            .sum();
        let rest = (sum * 10) % 11;
        digits.push(if rest == 10 { 0 } else { rest });
    }
    digits
}

fn to_string(digits: &[u32]) -> String {
    digits
        .iter()
        .map(|d| char::from_digit(*d, 10).unwrap())
        .collect()
}

// Property: CPF validation should never panic
proptest! {
    #[test]
    fn cpf_validation_never_panics(cpf in "\\PC*") {
        let _ = is_valid_cpf(&cpf);
    }

    #[test]
    fn generated_cpfs_are_accepted(base in prop::collection::vec(0u32..10, 9)) {
        prop_assume!(base.iter().any(|d| *d != base[0]));
        let cpf = to_string(&with_check_digits(&base));
        prop_assert!(is_valid_cpf(&cpf), "generated CPF rejected: {}", cpf);
    }

    #[test]
    fn formatting_does_not_change_the_verdict(cpf in "[0-9]{11}") {
        let formatted = format!("{}.{}.{}-{}",
            &cpf[0..3], &cpf[3..6], &cpf[6..9], &cpf[9..11]);
        prop_assert_eq!(is_valid_cpf(&formatted), is_valid_cpf(&cpf));
    }

    #[test]
    fn corrupted_last_digit_is_rejected(
        base in prop::collection::vec(0u32..10, 9),
        bump in 1u32..10
    ) {
        prop_assume!(base.iter().any(|d| *d != base[0]));
        let mut digits = with_check_digits(&base);
        digits[10] = (digits[10] + bump) % 10;
        prop_assert!(!is_valid_cpf(&to_string(&digits)));
    }

    #[test]
    fn repeated_digit_cpfs_are_rejected(d in 0u32..10) {
        let cpf = to_string(&[d; 11]);
        prop_assert!(!is_valid_cpf(&cpf));
    }

    #[test]
    fn wrong_length_cpfs_are_rejected(cpf in "[0-9]{0,10}|[0-9]{12,20}") {
        prop_assert!(!is_valid_cpf(&cpf));
    }
}

// Property: installment bounds
proptest! {
    #[test]
    fn installments_accepted_only_between_1_and_48(count in -100i32..200) {
        prop_assert_eq!(is_valid_installment_count(count), (1..=48).contains(&count));
    }
}

// Property: Email validation should never panic
proptest! {
    #[test]
    fn email_validation_never_panics(email in "\\PC*") {
        let _ = is_valid_email(&email);
    }

    #[test]
    fn simple_addresses_are_accepted(
        local in "[a-z][a-z0-9]{0,10}",
        domain in "[a-z]{1,10}",
        tld in "[a-z]{2,4}"
    ) {
        let email = format!("{}@{}.{}", local, domain, tld);
        prop_assert!(is_valid_email(&email), "rejected: {}", email);
    }
}
