use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Deposit,
    ReadingPayment,
    ReadingEarning,
    Payout,
    Refund,
    Gift,
    ShopPurchase,
}

impl TransactionType {
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "deposit" => Some(TransactionType::Deposit),
            "reading_payment" => Some(TransactionType::ReadingPayment),
            "reading_earning" => Some(TransactionType::ReadingEarning),
            "payout" => Some(TransactionType::Payout),
            "refund" => Some(TransactionType::Refund),
            "gift" => Some(TransactionType::Gift),
            "shop_purchase" => Some(TransactionType::ShopPurchase),
            _ => None,
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let transaction_type = match self {
            TransactionType::Deposit => "deposit",
            TransactionType::ReadingPayment => "reading_payment",
            TransactionType::ReadingEarning => "reading_earning",
            TransactionType::Payout => "payout",
            TransactionType::Refund => "refund",
            TransactionType::Gift => "gift",
            TransactionType::ShopPurchase => "shop_purchase",
        };
        write!(f, "{}", transaction_type)
    }
}
