use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Client,
    Reader,
    Admin,
}

impl Role {
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "client" => Some(Role::Client),
            "reader" => Some(Role::Reader),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let role = match self {
            Role::Client => "client",
            Role::Reader => "reader",
            Role::Admin => "admin",
        };
        write!(f, "{}", role)
    }
}
