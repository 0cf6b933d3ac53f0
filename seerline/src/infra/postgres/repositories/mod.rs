pub mod client_profiles;
pub mod ledger;
pub mod notifications;
pub mod payouts;
pub mod reader_profiles;
pub mod reviews;
pub mod sessions;
pub mod users;
