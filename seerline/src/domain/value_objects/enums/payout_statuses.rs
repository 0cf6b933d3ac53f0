use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PayoutStatus {
    Processing,
    Completed,
    Failed,
}

impl PayoutStatus {
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "processing" => Some(PayoutStatus::Processing),
            "completed" => Some(PayoutStatus::Completed),
            "failed" => Some(PayoutStatus::Failed),
            _ => None,
        }
    }
}

impl Display for PayoutStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            PayoutStatus::Processing => "processing",
            PayoutStatus::Completed => "completed",
            PayoutStatus::Failed => "failed",
        };
        write!(f, "{}", status)
    }
}
