//! Letter wording: opening, dispute, and closing templates.
//!
//! Templates use `[TOKEN]` placeholders. Tokens without a value are left in
//! place so the reader can fill them by hand.

use std::collections::HashMap;
use std::path::Path;

use billbot_core::{CoreError, PaymentType, Strategy, load_json};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(\w+)\]").expect("placeholder regex is valid"));

// ── Default wording ──

const OPENING_FINANCIAL_HARDSHIP: &str = "I am writing to request a review and adjustment of my medical bill due to financial hardship.";
const OPENING_FAIR_PRICING: &str = "I am writing to request a pricing review to ensure charges align with standard and reasonable rates.";
const OPENING_INSURANCE_COMPARABLE: &str = "I am writing to request pricing comparable to what insurance companies pay for these services.";

const DISPUTE_FACILITY_FEE: &str = "The facility fee of $[AMOUNT] appears excessive for the service provided. \
Medicare typically reimburses $[FAIR_AMOUNT] for similar facility use.";
const DISPUTE_SUPPLIES: &str = "Generic supplies totaling $[AMOUNT] are marked up over [MARKUP]% from wholesale costs. \
Standard pricing would be approximately $[FAIR_AMOUNT].";
const DISPUTE_MEDICATION: &str = "[MEDICATION] was charged at $[AMOUNT] per dose, \
while the same medication costs $[FAIR_AMOUNT] at retail pharmacies.";
const DISPUTE_EMERGENCY_LEVEL: &str = "The Emergency Department Level [LEVEL] charge of $[AMOUNT] may be incorrectly coded. \
Based on the services provided, Level [CORRECT_LEVEL] at $[FAIR_AMOUNT] appears more appropriate.";

const CLOSING_PAYMENT_READY: &str = "I am prepared to pay $[OFFER_AMOUNT] immediately upon acceptance of this adjusted amount.";
const CLOSING_PAYMENT_PLAN: &str = "I can pay $[OFFER_AMOUNT] through a payment plan of $[MONTHLY] per month.";
const CLOSING_FINANCIAL_REVIEW: &str = "I have included financial documentation for your review \
and would appreciate consideration for your financial assistance program.";

// ── Types ──

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpeningTemplates {
    pub financial_hardship: String,
    pub fair_pricing: String,
    pub insurance_comparable: String,
}

impl Default for OpeningTemplates {
    fn default() -> Self {
        Self {
            financial_hardship: OPENING_FINANCIAL_HARDSHIP.into(),
            fair_pricing: OPENING_FAIR_PRICING.into(),
            insurance_comparable: OPENING_INSURANCE_COMPARABLE.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisputeTemplates {
    pub facility_fee: String,
    pub supplies: String,
    pub medication: String,
    pub emergency_level: String,
}

impl Default for DisputeTemplates {
    fn default() -> Self {
        Self {
            facility_fee: DISPUTE_FACILITY_FEE.into(),
            supplies: DISPUTE_SUPPLIES.into(),
            medication: DISPUTE_MEDICATION.into(),
            emergency_level: DISPUTE_EMERGENCY_LEVEL.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClosingTemplates {
    pub payment_ready: String,
    pub payment_plan: String,
    pub financial_review: String,
}

impl Default for ClosingTemplates {
    fn default() -> Self {
        Self {
            payment_ready: CLOSING_PAYMENT_READY.into(),
            payment_plan: CLOSING_PAYMENT_PLAN.into(),
            financial_review: CLOSING_FINANCIAL_REVIEW.into(),
        }
    }
}

/// Dispute template category, chosen from a charge description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisputeKind {
    FacilityFee,
    Supplies,
    Medication,
    EmergencyLevel,
}

impl DisputeKind {
    /// First match wins: facility, supplies, medication, emergency. Anything
    /// else is disputed as supplies.
    pub fn for_description(description: &str) -> Self {
        let desc = description.to_lowercase();
        if desc.contains("facility") {
            Self::FacilityFee
        } else if desc.contains("supplies") {
            Self::Supplies
        } else if desc.contains("ibuprofen") || desc.contains("acetaminophen") {
            Self::Medication
        } else if desc.contains("emergency") {
            Self::EmergencyLevel
        } else {
            Self::Supplies
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LetterTemplates {
    pub opening: OpeningTemplates,
    pub disputes: DisputeTemplates,
    pub closing: ClosingTemplates,
}

impl LetterTemplates {
    /// Load overrides from JSON. Missing keys keep the default wording.
    pub fn from_json_file(path: &Path) -> Result<Self, CoreError> {
        let templates: Self = load_json(path)?;
        templates.validate()?;
        Ok(templates)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        let all = [
            ("opening.financial_hardship", &self.opening.financial_hardship),
            ("opening.fair_pricing", &self.opening.fair_pricing),
            ("opening.insurance_comparable", &self.opening.insurance_comparable),
            ("disputes.facility_fee", &self.disputes.facility_fee),
            ("disputes.supplies", &self.disputes.supplies),
            ("disputes.medication", &self.disputes.medication),
            ("disputes.emergency_level", &self.disputes.emergency_level),
            ("closing.payment_ready", &self.closing.payment_ready),
            ("closing.payment_plan", &self.closing.payment_plan),
            ("closing.financial_review", &self.closing.financial_review),
        ];
        for (name, text) in all {
            if text.trim().is_empty() {
                return Err(CoreError::InvalidTemplates(format!("{name} is empty")));
            }
        }
        Ok(())
    }

    pub fn opening(&self, strategy: Strategy) -> &str {
        match strategy {
            Strategy::FinancialHardship => &self.opening.financial_hardship,
            Strategy::FairPricing => &self.opening.fair_pricing,
            Strategy::InsuranceComparable => &self.opening.insurance_comparable,
        }
    }

    pub fn dispute(&self, kind: DisputeKind) -> &str {
        match kind {
            DisputeKind::FacilityFee => &self.disputes.facility_fee,
            DisputeKind::Supplies => &self.disputes.supplies,
            DisputeKind::Medication => &self.disputes.medication,
            DisputeKind::EmergencyLevel => &self.disputes.emergency_level,
        }
    }

    pub fn closing(&self, payment: PaymentType) -> &str {
        match payment {
            PaymentType::PaymentReady => &self.closing.payment_ready,
            PaymentType::PaymentPlan => &self.closing.payment_plan,
            PaymentType::FinancialReview => &self.closing.financial_review,
        }
    }
}

/// Replace every `[TOKEN]` that has a non-empty value; leave the rest verbatim.
pub fn fill_template(template: &str, values: &HashMap<&str, String>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| {
            match values.get(&caps[1]) {
                Some(v) if !v.is_empty() => v.clone(),
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
}
