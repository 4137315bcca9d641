//! Bill text analysis: charge and header extraction, overcharge flagging,
//! and assembly of the analyzed bill record.

pub mod aggregator;
pub mod classifier;
pub mod extractor;
pub mod metadata;
pub mod reference;

pub use aggregator::{BillAggregator, FALLBACK_CHARGES, fallback_charges};
pub use classifier::{ClassifierConfig, FlagSummary, MatchPolicy, OverchargeClassifier, summarize};
pub use extractor::{ChargeExtractor, ExtractionStats, ExtractorConfig};
pub use metadata::MetadataExtractor;
pub use reference::{ReferenceEntry, ReferenceTable};
