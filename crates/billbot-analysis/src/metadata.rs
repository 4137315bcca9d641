//! Bill header extraction: provider, account number, dates, printed total.

use billbot_core::{BillMetadata, parse_amount};
use once_cell::sync::Lazy;
use regex::Regex;

/// Words that identify the provider's name line.
const PROVIDER_MARKERS: &[&str] = &["hospital", "medical center", "clinic", "health system"];

static ACCOUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:account|acct)\b\.?\s*(?:number|no\.?)?\s*[#:]*\s*([A-Z0-9-]*\d[A-Z0-9-]*)")
        .expect("account regex is valid")
});

static BILL_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:bill date|statement date|date)\b[\s:]*(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})")
        .expect("bill date regex is valid")
});

static SERVICE_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:service date|date of service|dos)\b[\s:]*(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})")
        .expect("service date regex is valid")
});

static STATED_TOTAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:total(?:\s+(?:charges|due|amount))?|balance\s+due|amount\s+due)\b[\s:$]*([0-9][0-9,]*(?:\.\d+)?)",
    )
    .expect("stated total regex is valid")
});

/// Pulls header fields out of raw bill text. Absent fields stay `None`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataExtractor;

impl MetadataExtractor {
    pub fn extract(&self, text: &str) -> BillMetadata {
        let service_date = capture(&SERVICE_DATE, text);
        // "Service Date:" also satisfies the bare `date` label.
        let bill_date = BILL_DATE
            .captures_iter(text)
            .filter(|caps| !follows_service(text, caps))
            .find_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
            .or_else(|| service_date.clone());

        BillMetadata {
            provider_name: provider_line(text),
            provider_address: None,
            account_number: capture(&ACCOUNT, text),
            bill_date,
            service_date,
            stated_total: capture(&STATED_TOTAL, text)
                .map(|s| parse_amount(&s))
                .filter(|v| *v > 0.0),
        }
    }
}

fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn follows_service(text: &str, caps: &regex::Captures<'_>) -> bool {
    caps.get(0).is_some_and(|m| {
        text[..m.start()]
            .trim_end()
            .to_ascii_lowercase()
            .ends_with("service")
    })
}

fn provider_line(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .find(|line| {
            let lower = line.to_lowercase();
            PROVIDER_MARKERS.iter().any(|m| lower.contains(m))
        })
        .map(|line| line.trim_end_matches(':').trim().to_string())
        .filter(|s| !s.is_empty())
}
