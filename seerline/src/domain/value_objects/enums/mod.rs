pub mod payout_account_statuses;
pub mod payout_statuses;
pub mod reader_statuses;
pub mod roles;
pub mod session_statuses;
pub mod session_types;
pub mod transaction_statuses;
pub mod transaction_types;
