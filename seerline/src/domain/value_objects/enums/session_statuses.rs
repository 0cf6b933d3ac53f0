use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Pending,
    Active,
    Completed,
    Cancelled,
    Disputed,
}

impl SessionStatus {
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(SessionStatus::Pending),
            "active" => Some(SessionStatus::Active),
            "completed" => Some(SessionStatus::Completed),
            "cancelled" => Some(SessionStatus::Cancelled),
            "disputed" => Some(SessionStatus::Disputed),
            _ => None,
        }
    }

    /// Completed, cancelled and disputed rows never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionStatus::Completed | SessionStatus::Cancelled | SessionStatus::Disputed
        )
    }
}

impl Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
            SessionStatus::Disputed => "disputed",
        };
        write!(f, "{}", status)
    }
}
