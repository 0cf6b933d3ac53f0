use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Status of a reader's account at the external payment processor.
#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PayoutAccountStatus {
    #[default]
    Pending,
    Active,
    Restricted,
}

impl PayoutAccountStatus {
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(PayoutAccountStatus::Pending),
            "active" => Some(PayoutAccountStatus::Active),
            "restricted" => Some(PayoutAccountStatus::Restricted),
            _ => None,
        }
    }
}

impl Display for PayoutAccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            PayoutAccountStatus::Pending => "pending",
            PayoutAccountStatus::Active => "active",
            PayoutAccountStatus::Restricted => "restricted",
        };
        write!(f, "{}", status)
    }
}
