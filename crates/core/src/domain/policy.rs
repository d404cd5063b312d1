use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyNumber(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyStatus {
    Active,
    PendingRenewal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub policy_number: PolicyNumber,
    pub policy_type: String,
    pub status: PolicyStatus,
    pub premium: Decimal,
    pub coverage_amount: Decimal,
    pub start_date: NaiveDate,
    pub renewal_date: NaiveDate,
}

impl Policy {
    /// Whole days from `today` until renewal; negative once the date has passed.
    pub fn days_until_renewal(&self, today: NaiveDate) -> i64 {
        (self.renewal_date - today).num_days()
    }
}
