use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    Chat,
    Voice,
    Video,
}

impl SessionType {
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "chat" => Some(SessionType::Chat),
            "voice" => Some(SessionType::Voice),
            "video" => Some(SessionType::Video),
            _ => None,
        }
    }
}

impl Display for SessionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let session_type = match self {
            SessionType::Chat => "chat",
            SessionType::Voice => "voice",
            SessionType::Video => "video",
        };
        write!(f, "{}", session_type)
    }
}
