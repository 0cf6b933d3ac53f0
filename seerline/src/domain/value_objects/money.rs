use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Default operator share of every session total.
pub const PLATFORM_FEE_RATE: Decimal = Decimal::from_parts(30, 0, 0, false, 2);

/// Client balance required to request a session: the minimum one-minute
/// charge plus two minutes of slack for ring/connect time.
pub const RESERVE_MINUTES: i64 = 3;

pub fn fee_rate_from_percent(percent: u32) -> Decimal {
    Decimal::from(percent) / Decimal::from(100)
}

pub fn round_half_even(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

/// Outcome of billing a completed session. Earnings are derived by
/// subtraction so that `reader_earnings + platform_fee == total_amount`
/// holds exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionCharge {
    pub duration_seconds: i64,
    pub minutes_billed: i64,
    pub total_amount: Decimal,
    pub platform_fee: Decimal,
    pub reader_earnings: Decimal,
    pub fee_rate: Decimal,
}

impl SessionCharge {
    /// Billing is per whole started minute with a one-second floor, so a
    /// zero-length wall-clock interval still bills one minute.
    pub fn compute(elapsed_seconds: i64, rate_per_min: Decimal, fee_rate: Decimal) -> Self {
        let duration_seconds = elapsed_seconds.max(1);
        let minutes_billed = (duration_seconds + 59) / 60;
        let total_amount = Decimal::from(minutes_billed) * rate_per_min;
        let platform_fee = round_half_even(total_amount * fee_rate);
        let reader_earnings = total_amount - platform_fee;

        Self {
            duration_seconds,
            minutes_billed,
            total_amount,
            platform_fee,
            reader_earnings,
            fee_rate,
        }
    }

    /// Re-splits the charge against what was actually collectable. Used
    /// when the client balance at settlement no longer covers the full
    /// amount; the fee/earnings split is preserved on the collected
    /// figure.
    pub fn scale_to_collected(&self, collected: Decimal) -> (Decimal, Decimal) {
        let platform_fee = round_half_even(collected * self.fee_rate);
        let reader_earnings = collected - platform_fee;
        (platform_fee, reader_earnings)
    }
}
