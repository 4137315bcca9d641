//! Line-oriented charge extraction from raw OCR text.
//!
//! Each line is matched against three layouts, first match wins:
//!
//! | layout                     | example                          |
//! |----------------------------|----------------------------------|
//! | description, `$`amount     | `Facility Fee $847.00`           |
//! | description, code, amount  | `IV Therapy IV001 787.00`        |
//! | code, description, amount  | `99283 ER Visit Level 3 1,400.00`|
//!
//! There is no multi-line reconstruction: a charge whose description wraps
//! onto a second line loses the first half.

use billbot_core::{Charge, clean_description, parse_amount};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

static DESCRIPTION_AMOUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.+?)\s+\$([0-9,]+\.?\d{2})$").expect("description/amount regex is valid")
});

static DESCRIPTION_CODE_AMOUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.+?)\s+([A-Z0-9]{5})\s+\$?([0-9,]+\.?\d{2})$")
        .expect("description/code/amount regex is valid")
});

static CODE_DESCRIPTION_AMOUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Z0-9]{5})\s+(.+?)\s+\$?([0-9,]+\.?\d{2})$")
        .expect("code/description/amount regex is valid")
});

static CODE_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9]{5}$").expect("code shape regex is valid"));

static SUMMARY_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.*?)[\s:$]*[0-9,]+(?:\.\d+)?$").expect("summary row regex is valid")
});

/// Labels that mark bill summary rows rather than charges.
pub const DEFAULT_SUMMARY_LABELS: &[&str] = &[
    "total",
    "total due",
    "total charges",
    "subtotal",
    "balance",
    "balance due",
    "amount due",
    "payment received",
    "payments",
    "insurance paid",
    "adjustment",
    "adjustments",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtractorConfig {
    /// Lowercase phrases. A line is a summary row when its label ends with
    /// one of them as whole words and only an amount follows.
    pub summary_labels: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            summary_labels: DEFAULT_SUMMARY_LABELS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Which layout a line matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    DescriptionAmount,
    DescriptionCodeAmount,
    CodeDescriptionAmount,
}

impl Layout {
    const ORDER: [Layout; 3] = [
        Layout::DescriptionAmount,
        Layout::DescriptionCodeAmount,
        Layout::CodeDescriptionAmount,
    ];

    fn regex(&self) -> &'static Regex {
        match self {
            Self::DescriptionAmount => &*DESCRIPTION_AMOUNT,
            Self::DescriptionCodeAmount => &*DESCRIPTION_CODE_AMOUNT,
            Self::CodeDescriptionAmount => &*CODE_DESCRIPTION_AMOUNT,
        }
    }
}

/// Counters from one extraction pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    pub lines: usize,
    pub charges: usize,
    pub summary_lines: usize,
    pub discarded: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ChargeExtractor {
    config: ExtractorConfig,
}

impl ChargeExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Extract charges in source order.
    pub fn extract(&self, text: &str) -> Vec<Charge> {
        self.extract_with_stats(text).0
    }

    pub fn extract_with_stats(&self, text: &str) -> (Vec<Charge>, ExtractionStats) {
        let mut stats = ExtractionStats::default();
        let mut charges = Vec::new();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            stats.lines += 1;

            if self.is_summary_line(line) {
                stats.summary_lines += 1;
                debug!(line, "skipping summary line");
                continue;
            }

            match match_layout(line) {
                Some((layout, Some(charge))) => {
                    debug!(?layout, description = %charge.description, amount = charge.amount, "extracted charge");
                    charges.push(charge);
                }
                Some((layout, None)) => {
                    stats.discarded += 1;
                    debug!(?layout, line, "discarded line with no usable amount or description");
                }
                None => {}
            }
        }

        stats.charges = charges.len();
        debug!(
            lines = stats.lines,
            charges = stats.charges,
            summary_lines = stats.summary_lines,
            discarded = stats.discarded,
            "extraction pass complete"
        );
        (charges, stats)
    }

    /// Parse a single line. `None` when no layout matches or the match is
    /// unusable.
    pub fn extract_line(&self, line: &str) -> Option<Charge> {
        let line = line.trim();
        if line.is_empty() || self.is_summary_line(line) {
            return None;
        }
        match_layout(line).and_then(|(_, charge)| charge)
    }

    fn is_summary_line(&self, line: &str) -> bool {
        let Some(caps) = SUMMARY_ROW.captures(line) else {
            return false;
        };
        let label = caps[1]
            .trim_end_matches(|c: char| c.is_whitespace() || c == ':' || c == '#')
            .to_lowercase();
        self.config.summary_labels.iter().any(|phrase| {
            label
                .strip_suffix(phrase.as_str())
                .is_some_and(|head| head.is_empty() || head.ends_with(' '))
        })
    }
}

/// Try each layout in order. The first layout that matches decides the line,
/// even when its amount turns out to be zero.
fn match_layout(line: &str) -> Option<(Layout, Option<Charge>)> {
    for layout in Layout::ORDER {
        let Some(caps) = layout.regex().captures(line) else {
            continue;
        };

        let charge = if caps.len() == 3 {
            build_charge(&caps[1], None, &caps[2])
        } else {
            let (first, second, amount) = (&caps[1], &caps[2], &caps[3]);
            // An ambiguous line is resolved by which capture looks like a code.
            if CODE_SHAPE.is_match(first) {
                build_charge(second, Some(first), amount)
            } else {
                build_charge(first, Some(second), amount)
            }
        };
        return Some((layout, charge));
    }
    None
}

fn build_charge(raw_description: &str, code: Option<&str>, raw_amount: &str) -> Option<Charge> {
    let amount = parse_amount(raw_amount);
    if amount <= 0.0 {
        return None;
    }
    let description = clean_description(raw_description);
    if description.is_empty() {
        return None;
    }
    Some(Charge::new(description, code.map(str::to_string), amount))
}
