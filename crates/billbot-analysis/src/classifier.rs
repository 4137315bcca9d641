//! Keyword and heuristic overcharge flagging.
//!
//! Every charge is tested against the [`ReferenceTable`] by lowercase
//! substring containment. Under [`MatchPolicy::Union`] each matching keyword
//! emits its own flag, so "Emergency Room Lab Processing" can be flagged three
//! times; [`MatchPolicy::BestMatch`] keeps only the strongest keyword. A
//! separate heuristic flags large charges with vague descriptions. Keyword
//! flags always precede the vague flag for the same charge.

use std::collections::BTreeMap;

use billbot_core::{Charge, FlagKind, FlaggedCharge};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::reference::{ReferenceEntry, ReferenceTable};

pub const DEFAULT_VAGUE_THRESHOLD: f64 = 500.0;
pub const DEFAULT_VAGUE_POTENTIAL: f64 = 0.70;
pub const DEFAULT_VAGUE_TERMS: &[&str] = &["misc", "other", "general", "supplies"];

pub const VAGUE_REASON: &str = "Vague high-value charge";

/// How many keyword flags a single charge may produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// One flag per matching keyword.
    #[default]
    Union,
    /// At most one keyword flag: highest potential, ties to table order.
    BestMatch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClassifierConfig {
    pub policy: MatchPolicy,
    /// Charges strictly above this amount are eligible for the vague flag.
    pub vague_threshold: f64,
    pub vague_terms: Vec<String>,
    pub vague_potential: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            policy: MatchPolicy::default(),
            vague_threshold: DEFAULT_VAGUE_THRESHOLD,
            vague_terms: DEFAULT_VAGUE_TERMS.iter().map(|s| s.to_string()).collect(),
            vague_potential: DEFAULT_VAGUE_POTENTIAL,
        }
    }
}

/// Roll-up of a flag set, keyed by reason.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlagSummary {
    pub flags: usize,
    pub keyword_flags: usize,
    pub vague_flags: usize,
    pub total_overcharge: f64,
    pub by_reason: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Default)]
pub struct OverchargeClassifier {
    table: ReferenceTable,
    config: ClassifierConfig,
}

impl OverchargeClassifier {
    pub fn new(table: ReferenceTable, config: ClassifierConfig) -> Self {
        Self { table, config }
    }

    pub fn table(&self) -> &ReferenceTable {
        &self.table
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Flag every charge, preserving charge order.
    pub fn flag(&self, charges: &[Charge]) -> Vec<FlaggedCharge> {
        let flagged: Vec<FlaggedCharge> = charges.iter().flat_map(|c| self.flag_one(c)).collect();
        debug!(
            charges = charges.len(),
            flags = flagged.len(),
            policy = ?self.config.policy,
            "classification complete"
        );
        flagged
    }

    /// Flags for a single charge: keyword flags first, then the vague flag.
    pub fn flag_one(&self, charge: &Charge) -> Vec<FlaggedCharge> {
        let lower = charge.description.to_lowercase();
        let mut out = Vec::new();

        match self.config.policy {
            MatchPolicy::Union => {
                for entry in self.table.matches(&lower) {
                    out.push(keyword_flag(charge, entry));
                }
            }
            MatchPolicy::BestMatch => {
                let best = self.table.matches(&lower).fold(
                    None::<&ReferenceEntry>,
                    |best, entry| match best {
                        Some(b) if b.negotiable >= entry.negotiable => Some(b),
                        _ => Some(entry),
                    },
                );
                if let Some(entry) = best {
                    out.push(keyword_flag(charge, entry));
                }
            }
        }

        if self.is_vague(charge, &lower) {
            out.push(FlaggedCharge::new(
                charge.clone(),
                FlagKind::VagueHighValue,
                None,
                VAGUE_REASON,
                self.config.vague_potential,
            ));
        }

        out
    }

    fn is_vague(&self, charge: &Charge, lower: &str) -> bool {
        charge.amount > self.config.vague_threshold
            && self
                .config
                .vague_terms
                .iter()
                .any(|t| lower.contains(t.as_str()))
    }
}

fn keyword_flag(charge: &Charge, entry: &ReferenceEntry) -> FlaggedCharge {
    FlaggedCharge::new(
        charge.clone(),
        FlagKind::Keyword,
        Some(entry.keyword.clone()),
        format!("Common overcharge: {}", entry.keyword),
        entry.negotiable,
    )
}

/// Count flags and sum their overcharge.
pub fn summarize(flags: &[FlaggedCharge]) -> FlagSummary {
    let mut summary = FlagSummary::default();
    for flag in flags {
        summary.flags += 1;
        match flag.kind {
            FlagKind::Keyword => summary.keyword_flags += 1,
            FlagKind::VagueHighValue => summary.vague_flags += 1,
        }
        summary.total_overcharge += flag.overcharge();
        *summary.by_reason.entry(flag.flag_reason.clone()).or_default() += 1;
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn charge(desc: &str, amount: f64) -> Charge {
        Charge::new(desc, None, amount)
    }

    fn classifier(policy: MatchPolicy) -> OverchargeClassifier {
        OverchargeClassifier::new(
            ReferenceTable::builtin(),
            ClassifierConfig {
                policy,
                ..Default::default()
            },
        )
    }

    #[test]
    fn facility_fee_and_ibuprofen() {
        let flags = OverchargeClassifier::default().flag(&[
            charge("Facility Fee", 847.0),
            charge("Ibuprofen 800mg", 86.0),
        ]);
        assert_eq!(flags.len(), 2);
        assert_eq!(flags[0].flag_reason, "Common overcharge: facility fee");
        assert!((flags[0].estimated_fair_price - 203.28).abs() < 1e-6);
        assert_eq!(flags[1].matched_keyword.as_deref(), Some("ibuprofen"));
        assert!((flags[1].estimated_fair_price - 1.72).abs() < 1e-6);
    }

    #[test]
    fn vague_high_value_only() {
        let flags = OverchargeClassifier::default().flag(&[charge("Miscellaneous Equipment", 600.0)]);
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].kind, FlagKind::VagueHighValue);
        assert_eq!(flags[0].flag_reason, VAGUE_REASON);
        assert!((flags[0].estimated_fair_price - 180.0).abs() < 1e-6);
    }

    #[test]
    fn vague_threshold_is_strict() {
        let flags = OverchargeClassifier::default().flag(&[charge("General Services", 500.0)]);
        assert!(flags.is_empty());
    }

    #[test]
    fn keyword_precedes_vague_flag() {
        let flags = OverchargeClassifier::default().flag(&[charge("Medical Supplies", 600.0)]);
        let kinds: Vec<FlagKind> = flags.iter().map(|f| f.kind).collect();
        assert_eq!(kinds, vec![FlagKind::Keyword, FlagKind::VagueHighValue]);
    }

    #[test]
    fn union_flags_every_keyword() {
        let flags = classifier(MatchPolicy::Union).flag(&[charge("Lab Processing Fee", 395.0)]);
        let keywords: Vec<&str> = flags
            .iter()
            .filter_map(|f| f.matched_keyword.as_deref())
            .collect();
        assert_eq!(keywords, vec!["lab processing", "lab"]);
        assert!(flags.iter().all(|f| f.amount() == 395.0));
    }

    #[test]
    fn laboratory_matches_only_lab() {
        let flags = classifier(MatchPolicy::Union).flag(&[charge("Laboratory Processing", 395.0)]);
        let keywords: Vec<&str> = flags
            .iter()
            .filter_map(|f| f.matched_keyword.as_deref())
            .collect();
        assert_eq!(keywords, vec!["lab"]);
    }

    #[test]
    fn emergency_department_and_aspirin_flagged() {
        let flags = OverchargeClassifier::default().flag(&[
            charge("Emergency Department Level 5", 2400.0),
            charge("Aspirin 325mg", 30.0),
        ]);
        let keywords: Vec<&str> = flags
            .iter()
            .filter_map(|f| f.matched_keyword.as_deref())
            .collect();
        assert_eq!(keywords, vec!["emergency", "aspirin"]);
        assert!((flags[0].estimated_fair_price - 600.0).abs() < 1e-6);
        assert!((flags[1].estimated_fair_price - 1.5).abs() < 1e-6);
    }

    #[test]
    fn best_match_keeps_highest_potential() {
        let flags = classifier(MatchPolicy::BestMatch)
            .flag(&[charge("Emergency Room Lab Processing", 1000.0)]);
        assert_eq!(flags.len(), 1);
        // emergency room 0.75 ties emergency and beats lab processing 0.69
        assert_eq!(flags[0].matched_keyword.as_deref(), Some("emergency room"));
    }

    #[test]
    fn best_match_tie_goes_to_table_order() {
        let flags = classifier(MatchPolicy::BestMatch).flag(&[charge("Tylenol Acetaminophen", 40.0)]);
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].matched_keyword.as_deref(), Some("acetaminophen"));
    }

    #[test]
    fn fair_price_is_bounded() {
        let charges: Vec<Charge> = [
            ("Bandage", 200.0),
            ("Operating Room", 7800.0),
            ("Other Supplies", 10_000.0),
            ("Mri", 0.01),
        ]
        .into_iter()
        .map(|(d, a)| charge(d, a))
        .collect();
        for flag in OverchargeClassifier::default().flag(&charges) {
            assert!(flag.estimated_fair_price >= 0.0);
            assert!(flag.estimated_fair_price <= flag.amount());
        }
    }

    #[test]
    fn unmatched_charge_not_flagged() {
        assert!(OverchargeClassifier::default()
            .flag(&[charge("Physician Services", 1200.0)])
            .is_empty());
    }

    #[test]
    fn summary_rolls_up() {
        let flags = OverchargeClassifier::default().flag(&[
            charge("Facility Fee", 847.0),
            charge("Miscellaneous Equipment", 600.0),
        ]);
        let s = summarize(&flags);
        assert_eq!(s.flags, 2);
        assert_eq!(s.keyword_flags, 1);
        assert_eq!(s.vague_flags, 1);
        assert!((s.total_overcharge - (643.72 + 420.0)).abs() < 1e-6);
        assert_eq!(s.by_reason.get(VAGUE_REASON), Some(&1));
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let cfg: ClassifierConfig =
            serde_json::from_str(r#"{"policy":"best_match","vagueThreshold":1000}"#).unwrap();
        assert_eq!(cfg.policy, MatchPolicy::BestMatch);
        assert_eq!(cfg.vague_threshold, 1000.0);
        assert_eq!(cfg.vague_potential, DEFAULT_VAGUE_POTENTIAL);
    }
}
