//! Negotiation letter composition and rendering.

mod composer;
mod render;
mod settlement;
mod templates;

pub use composer::{ComposerConfig, LetterComposer};
pub use render::{Letter, LetterMetadata, PdfMetadata, PdfPayload, Section, SectionKind};
pub use settlement::{DEFAULT_INSTALLMENTS, DEFAULT_OFFER_FRACTION, Settlement, SettlementTerms};
pub use templates::{DisputeKind, LetterTemplates, fill_template};
