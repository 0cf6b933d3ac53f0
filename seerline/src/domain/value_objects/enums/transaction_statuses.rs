use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    #[default]
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl TransactionStatus {
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(TransactionStatus::Pending),
            "completed" => Some(TransactionStatus::Completed),
            "failed" => Some(TransactionStatus::Failed),
            "refunded" => Some(TransactionStatus::Refunded),
            _ => None,
        }
    }
}

impl Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
            TransactionStatus::Refunded => "refunded",
        };
        write!(f, "{}", status)
    }
}
