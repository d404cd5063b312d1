//! Read-only claim and policy records the agent's tools look up.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::domain::claim::{Claim, ClaimId, ClaimStatus};
use crate::domain::policy::{Policy, PolicyNumber, PolicyStatus};

#[derive(Clone, Debug, Default)]
pub struct ClaimDirectory {
    claims: HashMap<String, Claim>,
    policies: HashMap<String, Policy>,
}

impl ClaimDirectory {
    pub fn new(claims: Vec<Claim>, policies: Vec<Policy>) -> Self {
        let claims = claims.into_iter().map(|claim| (normalize_key(&claim.claim_id.0), claim));
        let policies = policies
            .into_iter()
            .map(|policy| (normalize_key(&policy.policy_number.0), policy));

        Self { claims: claims.collect(), policies: policies.collect() }
    }

    /// The demo book of business served by the notification agent.
    pub fn with_fixtures() -> Self {
        Self::new(
            vec![
                Claim {
                    claim_id: ClaimId("CLM-001".to_string()),
                    status: ClaimStatus::Approved,
                    claim_type: "auto_accident".to_string(),
                    claim_amount: Decimal::new(5_000_00, 2),
                    approved_amount: Decimal::new(4_500_00, 2),
                    filed_date: date(2025, 10, 15),
                    updated_date: date(2025, 10, 25),
                },
                Claim {
                    claim_id: ClaimId("CLM-002".to_string()),
                    status: ClaimStatus::PendingReview,
                    claim_type: "property_damage".to_string(),
                    claim_amount: Decimal::new(12_000_00, 2),
                    approved_amount: Decimal::ZERO,
                    filed_date: date(2025, 10, 20),
                    updated_date: date(2025, 10, 20),
                },
            ],
            vec![
                Policy {
                    policy_number: PolicyNumber("POL-12345".to_string()),
                    policy_type: "auto_insurance".to_string(),
                    status: PolicyStatus::Active,
                    premium: Decimal::new(1_200_00, 2),
                    coverage_amount: Decimal::new(100_000_00, 2),
                    start_date: date(2025, 1, 1),
                    renewal_date: date(2026, 1, 1),
                },
                Policy {
                    policy_number: PolicyNumber("POL-67890".to_string()),
                    policy_type: "home_insurance".to_string(),
                    status: PolicyStatus::PendingRenewal,
                    premium: Decimal::new(1_800_00, 2),
                    coverage_amount: Decimal::new(500_000_00, 2),
                    start_date: date(2024, 11, 1),
                    renewal_date: date(2025, 11, 1),
                },
            ],
        )
    }

    pub fn claim(&self, claim_id: &str) -> Option<&Claim> {
        self.claims.get(&normalize_key(claim_id))
    }

    pub fn policy(&self, policy_number: &str) -> Option<&Policy> {
        self.policies.get(&normalize_key(policy_number))
    }
}

/// Human-facing label for snake_case identifiers, e.g. `auto_accident` -> `Auto Accident`.
pub fn title_case(raw: &str) -> String {
    raw.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Renders an amount as `$12,000.00`.
pub fn format_money(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let fixed = format!("{:.2}", rounded.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if negative { "-" } else { "" };
    format!("{sign}${grouped}.{fraction}")
}

fn normalize_key(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::{format_money, title_case, ClaimDirectory};
    use crate::domain::claim::ClaimStatus;

    #[test]
    fn fixture_claims_are_found_case_insensitively() {
        let directory = ClaimDirectory::with_fixtures();

        let claim = directory.claim(" clm-002 ").expect("claim exists");
        assert_eq!(claim.status, ClaimStatus::PendingReview);
        assert_eq!(claim.claim_amount, Decimal::new(12_000_00, 2));
        assert!(directory.claim("CLM-999").is_none());
    }

    #[test]
    fn renewal_countdown_is_relative_to_today() {
        let directory = ClaimDirectory::with_fixtures();
        let policy = directory.policy("POL-67890").expect("policy exists");

        let today = NaiveDate::from_ymd_opt(2025, 10, 28).expect("valid date");
        assert_eq!(policy.days_until_renewal(today), 4);

        let after = NaiveDate::from_ymd_opt(2025, 11, 3).expect("valid date");
        assert_eq!(policy.days_until_renewal(after), -2);
    }

    #[test]
    fn money_is_grouped_with_two_decimals() {
        assert_eq!(format_money(Decimal::new(5_000_00, 2)), "$5,000.00");
        assert_eq!(format_money(Decimal::new(500_000_00, 2)), "$500,000.00");
        assert_eq!(format_money(Decimal::new(995, 1)), "$99.50");
        assert_eq!(format_money(Decimal::ZERO), "$0.00");
    }

    #[test]
    fn snake_case_labels_are_title_cased() {
        assert_eq!(title_case("auto_accident"), "Auto Accident");
        assert_eq!(title_case("pending_review"), "Pending Review");
        assert_eq!(title_case("general"), "General");
    }
}
