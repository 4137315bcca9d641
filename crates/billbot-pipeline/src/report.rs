//! Client-facing result payload.

use billbot_core::{AnalyzedBill, BillSource, FlaggedCharge};
use billbot_letter::{Letter, LetterMetadata};
use serde::{Deserialize, Serialize};

use crate::AuditRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillAnalysis {
    pub original_amount: u64,
    pub negotiable_charges: usize,
    pub estimated_savings: u64,
    pub savings_percent: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LetterPayload {
    pub html: String,
    pub text: String,
    pub metadata: LetterMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillReport {
    pub success: bool,
    pub bill_analysis: BillAnalysis,
    /// The flagged charges.
    pub charges: Vec<FlaggedCharge>,
    pub letter: LetterPayload,
    pub source: BillSource,
    pub audit: Vec<AuditRecord>,
}

/// Everything one processing run produced.
#[derive(Debug, Clone)]
pub struct ProcessedBill {
    pub bill: AnalyzedBill,
    pub letter: Letter,
    pub audit: Vec<AuditRecord>,
}

impl ProcessedBill {
    pub fn report(&self) -> BillReport {
        let metadata = self.letter.metadata();
        BillReport {
            success: true,
            bill_analysis: BillAnalysis {
                original_amount: self.bill.total_amount,
                negotiable_charges: self.bill.negotiable_count(),
                estimated_savings: metadata.savings,
                savings_percent: metadata.savings_percent,
            },
            charges: self.bill.flagged_charges.clone(),
            letter: LetterPayload {
                html: self.letter.html(),
                text: self.letter.text(),
                metadata,
            },
            source: self.bill.source,
            audit: self.audit.clone(),
        }
    }
}
