use uuid::Uuid;

/// Shared channel carrying every reader presence transition.
pub const READERS_STATUS_CHANNEL: &str = "readers:status";

/// Per-session channel: `session-started`, `message`, `session-ended`.
pub fn session_channel(session_id: Uuid) -> String {
    format!("reading:{}", session_id)
}

/// Per-user inbox channel; every publish here is mirrored by a durable
/// notification row.
pub fn notifications_channel(user_id: Uuid) -> String {
    format!("notifications:{}", user_id)
}

/// RTC room name for a session. Session ids are never reused, so neither
/// are channel names.
pub fn allocate_rtc_channel(session_id: Uuid) -> String {
    format!("rtc_{}", session_id.simple())
}
