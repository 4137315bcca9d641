//! Bill data model shared by the analysis, letter, and pipeline crates.
//!
//! Field names serialize in camelCase to match the result payload handed back
//! to callers.

use serde::{Deserialize, Serialize};

use crate::amount::round_whole;

/// Shown in the letter when the patient did not supply a name.
pub const PATIENT_NAME_PLACEHOLDER: &str = "[Patient Name]";

/// Provider name used when the bill text did not identify one.
pub const DEFAULT_PROVIDER_NAME: &str = "General Hospital System";

/// One billed line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Charge {
    /// Title-cased, never empty.
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Dollars; clamped to `>= 0` on construction.
    pub amount: f64,
}

impl Charge {
    pub fn new(description: impl Into<String>, code: Option<String>, amount: f64) -> Self {
        let amount = if amount.is_finite() && amount > 0.0 {
            amount
        } else {
            0.0
        };
        Self {
            description: description.into(),
            code,
            amount,
        }
    }
}

/// Why a charge was flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagKind {
    /// Description contains a reference-table keyword.
    Keyword,
    /// Large amount with a generic description ("misc", "other", ...).
    VagueHighValue,
}

impl FlagKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::VagueHighValue => "vague_high_value",
        }
    }
}

/// A charge annotated with its negotiation analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlaggedCharge {
    #[serde(flatten)]
    pub charge: Charge,
    pub flag_reason: String,
    pub kind: FlagKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_keyword: Option<String>,
    /// Expected fractional reduction, in (0, 1].
    pub negotiation_potential: f64,
    /// `amount * (1 - negotiation_potential)`, within `[0, amount]`.
    #[serde(alias = "fairPrice")]
    pub estimated_fair_price: f64,
}

impl FlaggedCharge {
    /// Build a flag, deriving the fair price from the potential.
    ///
    /// The potential is clamped into (0, 1] so the fair price can never
    /// exceed the billed amount or go negative.
    pub fn new(
        charge: Charge,
        kind: FlagKind,
        matched_keyword: Option<String>,
        flag_reason: impl Into<String>,
        negotiation_potential: f64,
    ) -> Self {
        let potential = if negotiation_potential.is_finite() {
            negotiation_potential.clamp(f64::EPSILON, 1.0)
        } else {
            1.0
        };
        let fair = (charge.amount * (1.0 - potential)).clamp(0.0, charge.amount);
        Self {
            charge,
            flag_reason: flag_reason.into(),
            kind,
            matched_keyword,
            negotiation_potential: potential,
            estimated_fair_price: fair,
        }
    }

    pub fn description(&self) -> &str {
        &self.charge.description
    }

    pub fn amount(&self) -> f64 {
        self.charge.amount
    }

    /// Amount billed above the estimated fair price.
    pub fn overcharge(&self) -> f64 {
        self.charge.amount - self.estimated_fair_price
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Where the charges of an [`AnalyzedBill`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillSource {
    /// Charges were parsed from the submitted bill.
    Extracted,
    /// Nothing was extracted; the demo charge set stands in.
    Fallback,
}

impl BillSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Extracted => "extracted",
            Self::Fallback => "fallback",
        }
    }
}

/// Header fields found in (or supplied alongside) the bill text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillMetadata {
    pub provider_name: Option<String>,
    pub provider_address: Option<String>,
    pub account_number: Option<String>,
    pub bill_date: Option<String>,
    pub service_date: Option<String>,
    /// Total printed on the bill, if any.
    pub stated_total: Option<f64>,
}

/// The aggregate record produced once per bill submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzedBill {
    pub provider: Provider,
    pub account_number: String,
    pub bill_date: String,
    pub service_date: String,
    /// `round(sum(charges.amount))`.
    pub total_amount: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stated_total: Option<f64>,
    pub charges: Vec<Charge>,
    pub flagged_charges: Vec<FlaggedCharge>,
    pub source: BillSource,
}

impl AnalyzedBill {
    /// Sum of `amount - fair price` across every flag, duplicates included.
    pub fn total_overcharge(&self) -> f64 {
        self.flagged_charges.iter().map(FlaggedCharge::overcharge).sum()
    }

    pub fn negotiable_count(&self) -> usize {
        self.flagged_charges.len()
    }

    pub fn is_fallback(&self) -> bool {
        self.source == BillSource::Fallback
    }
}

/// Whole-dollar total of a charge list.
pub fn total_of(charges: &[Charge]) -> u64 {
    round_whole(charges.iter().map(|c| c.amount).sum())
}

/// Patient contact block for the letter header.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientInfo {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
}

impl PatientInfo {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Patient name, or [`PATIENT_NAME_PLACEHOLDER`] when blank.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => PATIENT_NAME_PLACEHOLDER,
        }
    }
}

/// Which opening paragraph the letter leads with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum Strategy {
    FinancialHardship,
    #[default]
    FairPricing,
    InsuranceComparable,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FinancialHardship => "financial_hardship",
            Self::FairPricing => "fair_pricing",
            Self::InsuranceComparable => "insurance_comparable",
        }
    }

    /// Parse a strategy name; anything unrecognized is `FairPricing`.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "financial_hardship" => Self::FinancialHardship,
            "insurance_comparable" => Self::InsuranceComparable,
            _ => Self::FairPricing,
        }
    }
}

impl From<String> for Strategy {
    fn from(s: String) -> Self {
        Self::parse_lenient(&s)
    }
}

/// Which closing paragraph (payment proposal) the letter ends with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum PaymentType {
    #[default]
    PaymentReady,
    PaymentPlan,
    FinancialReview,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PaymentReady => "payment_ready",
            Self::PaymentPlan => "payment_plan",
            Self::FinancialReview => "financial_review",
        }
    }

    /// Parse a payment type name; anything unrecognized is `PaymentReady`.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "payment_plan" => Self::PaymentPlan,
            "financial_review" => Self::FinancialReview,
            _ => Self::PaymentReady,
        }
    }
}

impl From<String> for PaymentType {
    fn from(s: String) -> Self {
        Self::parse_lenient(&s)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LetterOptions {
    #[serde(default)]
    pub strategy: Strategy,
    #[serde(default)]
    pub payment_type: PaymentType,
}
