pub mod enums;
pub mod ledger;
pub mod money;
pub mod notifications;
pub mod presence;
pub mod reviews;
pub mod sessions;
pub mod users;
