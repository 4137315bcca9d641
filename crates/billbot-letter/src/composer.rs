//! Builds the five-section negotiation letter from an analyzed bill.
//!
//! Composition never fails. Missing patient or provider details become
//! bracketed placeholders, and template tokens without a value stay verbatim.

use std::collections::HashMap;
use std::sync::Arc;

use billbot_core::clock::long_date;
use billbot_core::{
    AnalyzedBill, Clock, FlaggedCharge, LetterOptions, PatientInfo, SystemClock, format_amount,
    format_whole, round_whole,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::render::{Letter, Section, SectionKind};
use crate::settlement::{Settlement, SettlementTerms};
use crate::templates::{DisputeKind, LetterTemplates, fill_template};

static LEVEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\blevel\s*(\d+)").expect("level regex is valid"));

const DISPUTES_HEADING: &str = "Specific charges requiring review:";

const OPENING_REVIEW: &str = "I have carefully reviewed the itemized charges on my bill dated {bill_date} \
and identified several charges that appear to be significantly above standard rates. \
I am requesting a good-faith adjustment to align these charges with reasonable and customary rates.";

const CLOSING_NOTICE: &str = "I appreciate your understanding and look forward to resolving this matter. \
Please respond within 15 business days to avoid the need for further action, \
including potential complaints to the state insurance commissioner and consumer protection agencies.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ComposerConfig {
    /// Flags listed in the disputes section, in bill order.
    pub max_disputes: usize,
    /// `[LEVEL]` when the description carries no "level N".
    pub default_level: u32,
    /// `[CORRECT_LEVEL]`.
    pub correct_level: u32,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            max_disputes: 5,
            default_level: 5,
            correct_level: 3,
        }
    }
}

pub struct LetterComposer {
    templates: Arc<LetterTemplates>,
    terms: SettlementTerms,
    config: ComposerConfig,
    clock: Arc<dyn Clock>,
}

impl Default for LetterComposer {
    fn default() -> Self {
        Self::new(
            Arc::new(LetterTemplates::default()),
            SettlementTerms::default(),
            ComposerConfig::default(),
            Arc::new(SystemClock),
        )
    }
}

impl LetterComposer {
    pub fn new(
        templates: Arc<LetterTemplates>,
        terms: SettlementTerms,
        config: ComposerConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            templates,
            terms,
            config,
            clock,
        }
    }

    pub fn terms(&self) -> &SettlementTerms {
        &self.terms
    }

    pub fn compose(
        &self,
        bill: &AnalyzedBill,
        patient: &PatientInfo,
        options: LetterOptions,
    ) -> Letter {
        let settlement = self.terms.settle(bill.total_amount);

        let sections = vec![
            Section {
                kind: SectionKind::Header,
                content: self.header(bill, patient, &settlement),
            },
            Section {
                kind: SectionKind::Opening,
                content: self.opening(bill, options),
            },
            Section {
                kind: SectionKind::Disputes,
                content: self.disputes(&bill.flagged_charges),
            },
            Section {
                kind: SectionKind::Offer,
                content: offer(bill, &settlement),
            },
            Section {
                kind: SectionKind::Closing,
                content: self.closing(patient, options, &settlement),
            },
        ];

        info!(
            account = %bill.account_number,
            strategy = options.strategy.as_str(),
            payment_type = options.payment_type.as_str(),
            offer = settlement.offer,
            disputes = bill.flagged_charges.len().min(self.config.max_disputes),
            "letter composed"
        );

        Letter {
            sections,
            account_number: bill.account_number.clone(),
            author: patient.display_name().to_string(),
            settlement,
        }
    }

    fn header(&self, bill: &AnalyzedBill, patient: &PatientInfo, settlement: &Settlement) -> String {
        let mut lines = vec![
            long_date(self.clock.today()),
            String::new(),
            patient.display_name().to_string(),
            or_placeholder(&patient.address, "[Patient Address]"),
            format!(
                "{}, {} {}",
                or_placeholder(&patient.city, "[City]"),
                or_placeholder(&patient.state, "[State]"),
                or_placeholder(&patient.zip, "[ZIP]"),
            ),
        ];
        lines.extend(present(&patient.email));
        lines.extend(present(&patient.phone));

        let provider_name = if bill.provider.name.trim().is_empty() {
            "[Hospital Name]".to_string()
        } else {
            bill.provider.name.clone()
        };
        lines.extend([
            String::new(),
            provider_name,
            "Billing Department".to_string(),
            or_placeholder(&bill.provider.address, "[Hospital Address]"),
            String::new(),
            format!("Re: Medical Bill - Account #{}", bill.account_number),
            format!("    Original Amount: ${}", format_whole(settlement.original)),
            format!("    Proposed Settlement: ${}", format_whole(settlement.offer)),
        ]);
        lines.join("\n")
    }

    fn opening(&self, bill: &AnalyzedBill, options: LetterOptions) -> String {
        format!(
            "{}\n\n{}",
            self.templates.opening(options.strategy),
            OPENING_REVIEW.replace("{bill_date}", &bill.bill_date)
        )
    }

    fn disputes(&self, flags: &[FlaggedCharge]) -> String {
        if flags.is_empty() {
            return String::new();
        }
        let mut out = String::from(DISPUTES_HEADING);
        for flag in flags.iter().take(self.config.max_disputes) {
            let template = self
                .templates
                .dispute(DisputeKind::for_description(flag.description()));
            out.push_str("\n\n• ");
            out.push_str(&fill_template(template, &self.dispute_values(flag)));
        }
        out
    }

    fn dispute_values(&self, flag: &FlaggedCharge) -> HashMap<&'static str, String> {
        let fair = flag.estimated_fair_price;
        let level = LEVEL
            .captures(flag.description())
            .and_then(|caps| caps[1].parse::<u32>().ok())
            .unwrap_or(self.config.default_level);

        let mut values = HashMap::from([
            ("AMOUNT", format_amount(flag.amount())),
            ("FAIR_AMOUNT", format_whole(round_whole(fair))),
            ("MEDICATION", flag.description().to_string()),
            ("LEVEL", level.to_string()),
            ("CORRECT_LEVEL", self.config.correct_level.to_string()),
        ]);
        if fair > 0.0 {
            let markup = ((flag.amount() / fair - 1.0) * 100.0).round() as i64;
            values.insert("MARKUP", markup.to_string());
        }
        values
    }

    fn closing(&self, patient: &PatientInfo, options: LetterOptions, settlement: &Settlement) -> String {
        let values = HashMap::from([
            ("OFFER_AMOUNT", format_whole(settlement.offer)),
            ("MONTHLY", format_whole(settlement.monthly)),
        ]);
        format!(
            "{}\n\n{}\n\nSincerely,\n\n\n[Signature]\n{}",
            fill_template(self.templates.closing(options.payment_type), &values),
            CLOSING_NOTICE,
            patient.display_name()
        )
    }
}

fn offer(bill: &AnalyzedBill, settlement: &Settlement) -> String {
    format!(
        "Based on my research of standard medical pricing and Medicare reimbursement rates, \
         the identified overcharges total approximately ${}.\n\n\
         In the interest of resolving this matter promptly and fairly, \
         I am proposing a settlement amount of ${}, \
         which represents a {}% reduction from the original bill. \
         This amount more accurately reflects the fair market value of the services provided.",
        format_whole(round_whole(bill.total_overcharge())),
        format_whole(settlement.offer),
        settlement.savings_percent,
    )
}

fn or_placeholder(value: &Option<String>, placeholder: &str) -> String {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => placeholder.to_string(),
    }
}

fn present(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
