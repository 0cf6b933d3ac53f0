use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Reader presence. Session status is the durable fact; this is the fast
/// index for "can I take a request now?" and must stay a separate flag.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReaderStatus {
    Offline,
    Online,
    Busy,
    InSession,
}

impl ReaderStatus {
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "offline" => Some(ReaderStatus::Offline),
            "online" => Some(ReaderStatus::Online),
            "busy" => Some(ReaderStatus::Busy),
            "in_session" => Some(ReaderStatus::InSession),
            _ => None,
        }
    }

    /// Transitions a reader may perform on their own status. The
    /// orchestrator-owned edges (online -> in_session -> online) are not
    /// reachable from here.
    pub fn can_self_transition_to(&self, next: ReaderStatus) -> bool {
        matches!(
            (self, next),
            (ReaderStatus::Offline, ReaderStatus::Online)
                | (ReaderStatus::Online, ReaderStatus::Offline)
                | (ReaderStatus::Online, ReaderStatus::Busy)
                | (ReaderStatus::Busy, ReaderStatus::Online)
                | (ReaderStatus::Busy, ReaderStatus::Offline)
        )
    }
}

impl Display for ReaderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            ReaderStatus::Offline => "offline",
            ReaderStatus::Online => "online",
            ReaderStatus::Busy => "busy",
            ReaderStatus::InSession => "in_session",
        };
        write!(f, "{}", status)
    }
}
