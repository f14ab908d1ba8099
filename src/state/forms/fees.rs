//! Transfer fee schedule

use super::rules::parse_amount;

/// Flat fee by inclusive upper bound of the amount
const FEE_TIERS: [(u64, u64); 4] = [(100, 5), (500, 15), (1_000, 25), (5_000, 50)];

/// Fee above the last tier
const TOP_FEE: u64 = 100;

/// Flat fee for an amount. Nothing is charged on a zero amount.
pub fn derive_fees(amount: u64) -> u64 {
    if amount == 0 {
        return 0;
    }
    FEE_TIERS
        .iter()
        .find(|(bound, _)| amount <= *bound)
        .map_or(TOP_FEE, |(_, fee)| *fee)
}

pub fn derive_total(amount: u64, fee: u64) -> u64 {
    amount.saturating_add(fee)
}

/// Amount with its derived fee and total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Quote {
    pub amount: u64,
    pub fee: u64,
    pub total: u64,
}

impl Quote {
    pub fn for_amount(amount: u64) -> Self {
        let fee = derive_fees(amount);
        Self {
            amount,
            fee,
            total: derive_total(amount, fee),
        }
    }

    /// Quote for raw operator input; all zero when empty or not a number
    pub fn from_input(raw: &str) -> Self {
        parse_amount(raw).map_or_else(Self::default, Self::for_amount)
    }
}
