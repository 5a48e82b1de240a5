//! Deal size classification

use crate::normalize::parse_number;

/// Store-type marker (lowercase) whose amount is rescaled before bucketing
pub const PHYSICAL_STORE_MARKER: &str = "physical store";

/// Divisor applied to physical-store amounts
pub const PHYSICAL_STORE_RATIO: f64 = 0.05;

/// Deal size bucket, ordered by lower bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DealSize {
    UpTo50k,
    From50kTo100k,
    From100kTo300k,
    From300kTo500k,
    From500kTo1M,
    From1MTo5M,
    From5MTo10M,
    Over10M,
}

impl DealSize {
    pub const ALL: [DealSize; 8] = [
        Self::UpTo50k,
        Self::From50kTo100k,
        Self::From100kTo300k,
        Self::From300kTo500k,
        Self::From500kTo1M,
        Self::From1MTo5M,
        Self::From5MTo10M,
        Self::Over10M,
    ];

    /// Inclusive lower bound
    pub fn lower_bound(self) -> f64 {
        match self {
            Self::UpTo50k => 0.0,
            Self::From50kTo100k => 50_000.0,
            Self::From100kTo300k => 100_000.0,
            Self::From300kTo500k => 300_000.0,
            Self::From500kTo1M => 500_000.0,
            Self::From1MTo5M => 1_000_000.0,
            Self::From5MTo10M => 5_000_000.0,
            Self::Over10M => 10_000_000.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::UpTo50k => "0 - 50.000 €",
            Self::From50kTo100k => "50.000 € - 100.000 €",
            Self::From100kTo300k => "100.000 € - 300.000 €",
            Self::From300kTo500k => "300.000 € - 500.000 €",
            Self::From500kTo1M => "500.000 € - 1M €",
            Self::From1MTo5M => "1M € - 5M €",
            Self::From5MTo10M => "5M € - 10M €",
            Self::Over10M => "Oltre 10M €",
        }
    }

    /// Bucket of an already-adjusted amount; negatives land in the first bucket
    pub fn from_amount(amount: f64) -> Self {
        Self::ALL
            .into_iter()
            .rev()
            .find(|bucket| amount >= bucket.lower_bound())
            .unwrap_or(Self::UpTo50k)
    }
}

/// Bucket of a numeric amount for the given store type
pub fn classify_amount(amount: f64, store_type: &str) -> DealSize {
    let adjusted = if store_type.to_lowercase().contains(PHYSICAL_STORE_MARKER) {
        amount / PHYSICAL_STORE_RATIO
    } else {
        amount
    };
    DealSize::from_amount(adjusted)
}

/// Bucket of a raw amount, `None` when the amount is empty or unparsable
pub fn classify_deal_size(raw_amount: &str, store_type: &str) -> Option<DealSize> {
    parse_number(raw_amount).map(|amount| classify_amount(amount, store_type))
}
