pub mod client_profiles;
pub mod messages;
pub mod notifications;
pub mod payouts;
pub mod reader_profiles;
pub mod reviews;
pub mod sessions;
pub mod transactions;
pub mod users;
