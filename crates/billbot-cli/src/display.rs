//! Vertical card display for an analyzed bill.
//!
//! Groups the bill header, extracted charges, overcharge flags, and the
//! settlement into labelled sections. Keyword flags show the reference
//! prices they were matched against.

use std::fmt::Write;

use billbot_analysis::{ReferenceTable, summarize};
use billbot_core::{format_amount, format_whole, round_whole};
use billbot_pipeline::ProcessedBill;

const MAX_LIST_ITEMS: usize = 10;
const DESCRIPTION_WIDTH: usize = 34;

// ── Public API ──

pub fn print_bill_card(processed: &ProcessedBill, reference: &ReferenceTable) {
    print!("{}", render_bill_card(processed, reference));
}

pub fn render_bill_card(processed: &ProcessedBill, reference: &ReferenceTable) -> String {
    let mut out = String::new();
    let bill = &processed.bill;

    let _ = writeln!(out, "=== {} ===", bill.provider.name);
    let _ = writeln!(out, "Account #{}", bill.account_number);
    let _ = writeln!(out);

    section(&mut out, "Bill");
    field(&mut out, "provider", &bill.provider.name);
    if let Some(address) = &bill.provider.address {
        field(&mut out, "address", address);
    }
    field(&mut out, "bill_date", &bill.bill_date);
    field(&mut out, "service_date", &bill.service_date);
    field(&mut out, "source", bill.source.as_str());
    field(&mut out, "total", &format!("${}", format_whole(bill.total_amount)));
    if let Some(stated) = bill.stated_total {
        field(&mut out, "stated_total", &format!("${}", format_amount(stated)));
    }
    let _ = writeln!(out);

    section(&mut out, &format!("Charges ({})", bill.charges.len()));
    for charge in bill.charges.iter().take(MAX_LIST_ITEMS) {
        let _ = writeln!(
            out,
            "    {:<width$} {:<6} ${}",
            truncate(&charge.description),
            charge.code.as_deref().unwrap_or("-"),
            format_amount(charge.amount),
            width = DESCRIPTION_WIDTH,
        );
    }
    more(&mut out, bill.charges.len());
    let _ = writeln!(out);

    if !bill.flagged_charges.is_empty() {
        let summary = summarize(&bill.flagged_charges);
        section(&mut out, &format!("Flags ({})", summary.flags));
        for flag in bill.flagged_charges.iter().take(MAX_LIST_ITEMS) {
            let _ = writeln!(
                out,
                "    {:<width$} ${} -> ${}  ({:.0}% negotiable)",
                truncate(flag.description()),
                format_amount(flag.amount()),
                format_whole(round_whole(flag.estimated_fair_price)),
                flag.negotiation_potential * 100.0,
                width = DESCRIPTION_WIDTH,
            );
            let _ = writeln!(out, "      {}", flag.flag_reason);
            if let Some(entry) = flag.matched_keyword.as_deref().and_then(|k| reference.get(k)) {
                let _ = writeln!(
                    out,
                    "      reference: typical ${}, fair ${}",
                    format_amount(entry.typical),
                    format_amount(entry.fair)
                );
            }
        }
        more(&mut out, bill.flagged_charges.len());
        field(&mut out, "keyword_flags", &summary.keyword_flags.to_string());
        field(&mut out, "vague_flags", &summary.vague_flags.to_string());
        field(
            &mut out,
            "overcharge",
            &format!("${}", format_whole(round_whole(summary.total_overcharge))),
        );
        let _ = writeln!(out);

        section(&mut out, "By reason");
        for (reason, count) in &summary.by_reason {
            let _ = writeln!(out, "    {count:>3}  {reason}");
        }
        let _ = writeln!(out);
    }

    let s = &processed.letter.settlement;
    section(&mut out, "Settlement");
    field(&mut out, "offer", &format!("${}", format_whole(s.offer)));
    field(
        &mut out,
        "savings",
        &format!("${} ({}%)", format_whole(s.savings), s.savings_percent),
    );
    field(&mut out, "monthly", &format!("${}", format_whole(s.monthly)));
    let _ = writeln!(out);

    out
}

// ── Helpers ──

fn section(out: &mut String, header: &str) {
    let _ = writeln!(out, "{header}");
}

fn field(out: &mut String, label: &str, value: &str) {
    let _ = writeln!(out, "  {:<26} {}", label, value);
}

fn more(out: &mut String, len: usize) {
    if len > MAX_LIST_ITEMS {
        let _ = writeln!(out, "    ... and {} more", len - MAX_LIST_ITEMS);
    }
}

fn truncate(s: &str) -> String {
    if s.chars().count() > DESCRIPTION_WIDTH {
        let head: String = s.chars().take(DESCRIPTION_WIDTH - 3).collect();
        format!("{head}...")
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use billbot_core::{FixedClock, LetterOptions, PatientInfo, SeededEntropy};
    use billbot_pipeline::BillProcessor;
    use std::sync::Arc;

    fn processor() -> BillProcessor {
        BillProcessor::builder()
            .clock(Arc::new(FixedClock::on(2026, 10, 16).unwrap()))
            .entropy(Arc::new(SeededEntropy::new(3)))
            .build()
    }

    fn demo_card() -> String {
        let p = processor();
        let processed = p.process_demo(&PatientInfo::default(), LetterOptions::default());
        render_bill_card(&processed, p.reference())
    }

    #[test]
    fn card_has_every_section() {
        let card = demo_card();
        assert!(card.starts_with("=== General Hospital System ==="));
        for header in ["\nBill\n", "\nCharges (5)\n", "\nSettlement\n"] {
            assert!(card.contains(header), "missing {header:?}");
        }
        assert!(card.contains("Flags ("));
        assert!(card.contains(&format!("  {:<26} fallback\n", "source")));
        assert!(card.contains(&format!("  {:<26} $1,660\n", "offer")));
    }

    #[test]
    fn flags_show_reference_prices_and_reason_rollup() {
        let p = processor();
        let processed = p.process_text(
            "Facility Fee $847.00\nFacility Fee $400.00\nMiscellaneous Equipment $600.00\n",
            &PatientInfo::default(),
            LetterOptions::default(),
        );
        let card = render_bill_card(&processed, p.reference());
        assert!(card.contains("      reference: typical $847, fair $200\n"));
        assert!(card.contains("\nBy reason\n"));
        assert!(card.contains("      2  Common overcharge: facility fee\n"));
        assert!(card.contains("      1  Vague high-value charge\n"));
        assert!(card.contains(&format!("  {:<26} 2\n", "keyword_flags")));
        assert!(card.contains(&format!("  {:<26} 1\n", "vague_flags")));
    }

    #[test]
    fn long_descriptions_truncated() {
        let long = "X".repeat(50);
        let t = truncate(&long);
        assert_eq!(t.chars().count(), DESCRIPTION_WIDTH);
        assert!(t.ends_with("..."));
    }
}
