//! Assembles the [`AnalyzedBill`] record from metadata, charges and flags.

use std::sync::Arc;

use billbot_core::bill::DEFAULT_PROVIDER_NAME;
use billbot_core::clock::short_date;
use billbot_core::{
    AnalyzedBill, BillMetadata, BillSource, Charge, Clock, Entropy, FlaggedCharge, Provider,
    SystemClock, ThreadEntropy, total_of,
};
use tracing::{info, warn};

use crate::classifier::OverchargeClassifier;

/// Stand-in charges used when nothing could be extracted.
pub const FALLBACK_CHARGES: &[(&str, &str, f64)] = &[
    ("Emergency Room Visit Level 5", "E0005", 3200.0),
    ("Facility Fee", "FAC01", 847.0),
    ("Laboratory Processing", "LAB12", 395.0),
    ("Medical Supplies", "SUP99", 287.0),
    ("Physician Services", "PHY01", 1200.0),
];

const ACCOUNT_PREFIX_FALLBACK: &str = "ACC";
const BASE36: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

pub fn fallback_charges() -> Vec<Charge> {
    FALLBACK_CHARGES
        .iter()
        .map(|&(desc, code, amount)| Charge::new(desc, Some(code.to_string()), amount))
        .collect()
}

pub struct BillAggregator {
    classifier: Arc<OverchargeClassifier>,
    clock: Arc<dyn Clock>,
    entropy: Arc<dyn Entropy>,
}

impl Default for BillAggregator {
    fn default() -> Self {
        Self::new(
            Arc::new(OverchargeClassifier::default()),
            Arc::new(SystemClock),
            Arc::new(ThreadEntropy),
        )
    }
}

impl BillAggregator {
    pub fn new(
        classifier: Arc<OverchargeClassifier>,
        clock: Arc<dyn Clock>,
        entropy: Arc<dyn Entropy>,
    ) -> Self {
        Self {
            classifier,
            clock,
            entropy,
        }
    }

    pub fn classifier(&self) -> &OverchargeClassifier {
        &self.classifier
    }

    /// Build the bill record.
    ///
    /// An empty charge list is replaced by [`FALLBACK_CHARGES`] and the bill
    /// is marked [`BillSource::Fallback`]. When `flagged` is `None` or empty
    /// the classifier runs over the final charge list.
    pub fn aggregate(
        &self,
        metadata: BillMetadata,
        charges: Vec<Charge>,
        flagged: Option<Vec<FlaggedCharge>>,
    ) -> AnalyzedBill {
        let (charges, source) = if charges.is_empty() {
            warn!("no charges extracted, using fallback charge set");
            (fallback_charges(), BillSource::Fallback)
        } else {
            (charges, BillSource::Extracted)
        };

        let flagged_charges = match flagged {
            Some(flags) if !flags.is_empty() => flags,
            _ => self.classifier.flag(&charges),
        };

        let provider_name = metadata
            .provider_name
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PROVIDER_NAME.to_string());
        let account_number = metadata
            .account_number
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| self.generate_account_number(&provider_name));
        let bill_date = metadata
            .bill_date
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| short_date(self.clock.today()));
        let service_date = metadata
            .service_date
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| bill_date.clone());

        let bill = AnalyzedBill {
            provider: Provider {
                name: provider_name,
                address: metadata.provider_address,
            },
            account_number,
            bill_date,
            service_date,
            total_amount: total_of(&charges),
            stated_total: metadata.stated_total,
            charges,
            flagged_charges,
            source,
        };

        info!(
            account = %bill.account_number,
            charges = bill.charges.len(),
            flags = bill.flagged_charges.len(),
            total = bill.total_amount,
            source = bill.source.as_str(),
            "bill aggregated"
        );
        if let Some(stated) = bill.stated_total {
            if (stated.round() as i64 - bill.total_amount as i64).abs() > 1 {
                warn!(
                    stated,
                    computed = bill.total_amount,
                    "stated total differs from extracted charges"
                );
            }
        }

        bill
    }

    /// `{initials}{8 digits of epoch millis}{2 base-36 chars}`.
    fn generate_account_number(&self, provider_name: &str) -> String {
        let mut prefix: String = provider_name
            .split_whitespace()
            .filter_map(|w| w.chars().next())
            .filter(|c| c.is_ascii_alphabetic())
            .map(|c| c.to_ascii_uppercase())
            .collect();
        if prefix.is_empty() {
            prefix = ACCOUNT_PREFIX_FALLBACK.to_string();
        }

        let millis = self.clock.now().timestamp_millis().rem_euclid(100_000_000);
        let bits = self.entropy.next_u64();
        let a = BASE36[(bits % 36) as usize] as char;
        let b = BASE36[((bits / 36) % 36) as usize] as char;

        format!("{prefix}{millis:08}{a}{b}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use billbot_core::{FixedClock, SeededEntropy};

    fn aggregator() -> BillAggregator {
        BillAggregator::new(
            Arc::new(OverchargeClassifier::default()),
            Arc::new(FixedClock::on(2026, 10, 16).unwrap()),
            Arc::new(SeededEntropy::new(7)),
        )
    }

    #[test]
    fn totals_and_flags_extracted_charges() {
        let charges = vec![
            Charge::new("Facility Fee", None, 847.0),
            Charge::new("Ibuprofen 800mg", None, 86.0),
        ];
        let bill = aggregator().aggregate(BillMetadata::default(), charges, None);
        assert_eq!(bill.total_amount, 933);
        assert_eq!(bill.flagged_charges.len(), 2);
        assert_eq!(bill.source, BillSource::Extracted);
    }

    #[test]
    fn empty_charges_use_fallback() {
        let bill = aggregator().aggregate(BillMetadata::default(), vec![], None);
        assert_eq!(bill.total_amount, 5929);
        assert_eq!(bill.charges.len(), 5);
        assert!(bill.is_fallback());
        assert!(!bill.flagged_charges.is_empty());
    }

    #[test]
    fn defaults_fill_missing_metadata() {
        let bill = aggregator().aggregate(
            BillMetadata::default(),
            vec![Charge::new("X-Ray", None, 450.0)],
            None,
        );
        assert_eq!(bill.provider.name, DEFAULT_PROVIDER_NAME);
        assert_eq!(bill.bill_date, "10/16/2026");
        assert_eq!(bill.service_date, "10/16/2026");
        assert!(bill.account_number.starts_with("GHS"));
        assert_eq!(bill.account_number.len(), 3 + 8 + 2);
    }

    #[test]
    fn supplied_metadata_is_kept() {
        let meta = BillMetadata {
            provider_name: Some("Regional Medical Center".into()),
            provider_address: Some("1 Main St".into()),
            account_number: Some("MED-1".into()),
            bill_date: Some("02/01/2026".into()),
            service_date: None,
            stated_total: Some(450.0),
        };
        let bill = aggregator().aggregate(meta, vec![Charge::new("X-Ray", None, 450.0)], None);
        assert_eq!(bill.account_number, "MED-1");
        assert_eq!(bill.service_date, "02/01/2026");
        assert_eq!(bill.provider.address.as_deref(), Some("1 Main St"));
        assert_eq!(bill.stated_total, Some(450.0));
    }

    #[test]
    fn supplied_flags_bypass_classifier() {
        let charge = Charge::new("Facility Fee", None, 847.0);
        let flag = FlaggedCharge::new(
            charge.clone(),
            billbot_core::FlagKind::VagueHighValue,
            None,
            "manual",
            0.5,
        );
        let bill = aggregator().aggregate(BillMetadata::default(), vec![charge], Some(vec![flag]));
        assert_eq!(bill.flagged_charges.len(), 1);
        assert_eq!(bill.flagged_charges[0].flag_reason, "manual");
    }

    #[test]
    fn account_numbers_are_reproducible_with_seed() {
        let a = aggregator().generate_account_number("Regional Medical Center");
        let b = aggregator().generate_account_number("Regional Medical Center");
        assert_eq!(a, b);
        assert!(a.starts_with("RMC"));
    }

    #[test]
    fn account_prefix_falls_back() {
        let n = aggregator().generate_account_number("123 456");
        assert!(n.starts_with("ACC"));
    }
}
