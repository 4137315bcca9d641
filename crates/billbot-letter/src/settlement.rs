//! Settlement offer arithmetic.

use billbot_core::round_whole;
use serde::{Deserialize, Serialize};

pub const DEFAULT_OFFER_FRACTION: f64 = 0.28;
pub const DEFAULT_INSTALLMENTS: u32 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SettlementTerms {
    /// Share of the original bill offered, in (0, 1].
    pub offer_fraction: f64,
    /// Months in a payment plan.
    pub installments: u32,
}

impl Default for SettlementTerms {
    fn default() -> Self {
        Self {
            offer_fraction: DEFAULT_OFFER_FRACTION,
            installments: DEFAULT_INSTALLMENTS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    pub original: u64,
    pub offer: u64,
    pub savings: u64,
    /// Whole percent; 0 when the original is 0.
    pub savings_percent: u64,
    pub monthly: u64,
}

impl Settlement {
    pub fn compute(total: u64) -> Self {
        SettlementTerms::default().settle(total)
    }
}

impl SettlementTerms {
    pub fn settle(&self, total: u64) -> Settlement {
        let offer = round_whole(total as f64 * self.offer_fraction).min(total);
        let savings = total - offer;
        let savings_percent = if total == 0 {
            0
        } else {
            round_whole(savings as f64 / total as f64 * 100.0)
        };
        let monthly = round_whole(offer as f64 / f64::from(self.installments.max(1)));
        Settlement {
            original: total,
            offer,
            savings,
            savings_percent,
            monthly,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typical_bill() {
        let s = Settlement::compute(933);
        assert_eq!(s.offer, 261);
        assert_eq!(s.savings, 672);
        assert_eq!(s.savings_percent, 72);
        assert_eq!(s.monthly, 22);
    }

    #[test]
    fn fallback_bill() {
        let s = Settlement::compute(5929);
        assert_eq!(s.offer, 1660);
        assert_eq!(s.savings_percent, 72);
    }

    #[test]
    fn zero_total() {
        let s = Settlement::compute(0);
        assert_eq!(s, Settlement {
            original: 0,
            offer: 0,
            savings: 0,
            savings_percent: 0,
            monthly: 0,
        });
    }

    #[test]
    fn custom_terms() {
        let terms = SettlementTerms {
            offer_fraction: 0.5,
            installments: 0,
        };
        let s = terms.settle(1000);
        assert_eq!(s.offer, 500);
        assert_eq!(s.monthly, 500);
    }
}
