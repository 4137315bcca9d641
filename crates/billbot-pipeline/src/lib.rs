//! Bill processing pipeline: upload validation, time-bounded OCR, charge
//! extraction, aggregation, and letter composition.
//!
//! The core path ([`BillProcessor::process_text`]) is synchronous and never
//! fails; only the upload and OCR stages can return a [`PipelineError`].

mod error;
mod report;
mod upload;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use billbot_analysis::{
    BillAggregator, ChargeExtractor, ClassifierConfig, ExtractorConfig, MatchPolicy,
    MetadataExtractor, OverchargeClassifier, ReferenceTable,
};
use billbot_core::{
    AnalyzedBill, BillMetadata, Clock, CoreError, Entropy, LetterOptions, PatientInfo, SystemClock,
    ThreadEntropy, load_json,
};
use billbot_letter::{ComposerConfig, LetterComposer, LetterTemplates, SettlementTerms};
use billbot_ocr::{OcrEngine, UnavailableOcr};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub use error::{ErrorPayload, PipelineError};
pub use report::{BillAnalysis, BillReport, LetterPayload, ProcessedBill};
pub use upload::{
    DEFAULT_ALLOWED_TYPES, DEFAULT_MAX_UPLOAD_BYTES, Upload, UploadLimits, validate_upload,
};

pub const DEFAULT_OCR_TIMEOUT: Duration = Duration::from_secs(30);

/// Processing-run audit entry, timestamped by the processor's clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub event_type: String,
    pub detail: String,
    pub timestamp: DateTime<Utc>,
}

/// Tunables for a processor. Every section falls back to its defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProcessorConfig {
    pub ocr_timeout_ms: u64,
    pub limits: UploadLimits,
    pub extractor: ExtractorConfig,
    pub classifier: ClassifierConfig,
    pub composer: ComposerConfig,
    pub settlement: SettlementTerms,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            ocr_timeout_ms: DEFAULT_OCR_TIMEOUT.as_millis() as u64,
            limits: UploadLimits::default(),
            extractor: ExtractorConfig::default(),
            classifier: ClassifierConfig::default(),
            composer: ComposerConfig::default(),
            settlement: SettlementTerms::default(),
        }
    }
}

impl ProcessorConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, CoreError> {
        load_json(path)
    }

    pub fn ocr_timeout(&self) -> Duration {
        Duration::from_millis(self.ocr_timeout_ms)
    }
}

/// Assembles a [`BillProcessor`]. Unset parts use their defaults: built-in
/// reference table and templates, system clock, thread entropy, and an OCR
/// engine that always reports itself unavailable.
#[derive(Default)]
pub struct ProcessorBuilder {
    config: ProcessorConfig,
    reference: Option<ReferenceTable>,
    templates: Option<LetterTemplates>,
    ocr: Option<Arc<dyn OcrEngine>>,
    clock: Option<Arc<dyn Clock>>,
    entropy: Option<Arc<dyn Entropy>>,
}

impl ProcessorBuilder {
    pub fn config(mut self, config: ProcessorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn match_policy(mut self, policy: MatchPolicy) -> Self {
        self.config.classifier.policy = policy;
        self
    }

    /// Replace the config with one read from JSON.
    pub fn config_file(self, path: &Path) -> Result<Self, PipelineError> {
        let config = ProcessorConfig::from_json_file(path)?;
        Ok(self.config(config))
    }

    pub fn reference_file(self, path: &Path) -> Result<Self, PipelineError> {
        let table = ReferenceTable::from_json_file(path)?;
        info!(entries = table.len(), path = %path.display(), "loaded reference table");
        Ok(self.reference(table))
    }

    pub fn templates_file(self, path: &Path) -> Result<Self, PipelineError> {
        let templates = LetterTemplates::from_json_file(path)?;
        info!(path = %path.display(), "loaded letter templates");
        Ok(self.templates(templates))
    }

    pub fn reference(mut self, table: ReferenceTable) -> Self {
        self.reference = Some(table);
        self
    }

    pub fn templates(mut self, templates: LetterTemplates) -> Self {
        self.templates = Some(templates);
        self
    }

    pub fn ocr(mut self, ocr: Arc<dyn OcrEngine>) -> Self {
        self.ocr = Some(ocr);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn entropy(mut self, entropy: Arc<dyn Entropy>) -> Self {
        self.entropy = Some(entropy);
        self
    }

    pub fn build(self) -> BillProcessor {
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let entropy = self.entropy.unwrap_or_else(|| Arc::new(ThreadEntropy));
        let classifier = Arc::new(OverchargeClassifier::new(
            self.reference.unwrap_or_default(),
            self.config.classifier.clone(),
        ));

        BillProcessor {
            extractor: ChargeExtractor::new(self.config.extractor.clone()),
            metadata: MetadataExtractor,
            aggregator: BillAggregator::new(classifier, clock.clone(), entropy),
            composer: LetterComposer::new(
                Arc::new(self.templates.unwrap_or_default()),
                self.config.settlement,
                self.config.composer,
                clock.clone(),
            ),
            ocr: self.ocr.unwrap_or_else(|| Arc::new(UnavailableOcr)),
            clock,
            config: self.config,
        }
    }
}

pub struct BillProcessor {
    extractor: ChargeExtractor,
    metadata: MetadataExtractor,
    aggregator: BillAggregator,
    composer: LetterComposer,
    ocr: Arc<dyn OcrEngine>,
    clock: Arc<dyn Clock>,
    config: ProcessorConfig,
}

impl Default for BillProcessor {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl BillProcessor {
    pub fn builder() -> ProcessorBuilder {
        ProcessorBuilder::default()
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// The reference table flags are priced against.
    pub fn reference(&self) -> &ReferenceTable {
        self.aggregator.classifier().table()
    }

    /// Validate, OCR under the configured timeout, then run the text path.
    pub async fn process_upload(
        &self,
        upload: &Upload,
        patient: &PatientInfo,
        options: LetterOptions,
    ) -> Result<ProcessedBill, PipelineError> {
        self.config.limits.validate(upload)?;

        let mut audit = vec![self.audit(
            "upload-accepted",
            format!(
                "{} ({} bytes, {})",
                upload.display_name(),
                upload.bytes.len(),
                upload.mime
            ),
        )];
        info!(file = upload.display_name(), bytes = upload.bytes.len(), "processing upload");

        let timeout = self.config.ocr_timeout();
        let recognize = self.ocr.recognize(&upload.bytes, &upload.mime);
        let text = match tokio::time::timeout(timeout, recognize).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                warn!(error = %e, "OCR failed");
                return Err(PipelineError::OcrFailure(e));
            }
            Err(_) => {
                warn!(timeout_ms = timeout.as_millis() as u64, "OCR timed out");
                return Err(PipelineError::Timeout(timeout));
            }
        };
        audit.push(self.audit("ocr-complete", format!("{} characters", text.chars().count())));

        let mut processed = self.process_text(&text, patient, options);
        audit.append(&mut processed.audit);
        processed.audit = audit;
        Ok(processed)
    }

    /// Extract, aggregate and compose from already-recognized text.
    pub fn process_text(
        &self,
        text: &str,
        patient: &PatientInfo,
        options: LetterOptions,
    ) -> ProcessedBill {
        let (charges, stats) = self.extractor.extract_with_stats(text);
        let metadata = self.metadata.extract(text);
        let audit = vec![self.audit(
            "charges-extracted",
            format!("{} charges from {} lines", stats.charges, stats.lines),
        )];

        let bill = self.aggregator.aggregate(metadata, charges, None);
        self.finish(bill, patient, options, audit)
    }

    /// The fallback bill, without OCR.
    pub fn process_demo(&self, patient: &PatientInfo, options: LetterOptions) -> ProcessedBill {
        let bill = self
            .aggregator
            .aggregate(BillMetadata::default(), Vec::new(), None);
        self.finish(bill, patient, options, Vec::new())
    }

    fn finish(
        &self,
        bill: AnalyzedBill,
        patient: &PatientInfo,
        options: LetterOptions,
        mut audit: Vec<AuditRecord>,
    ) -> ProcessedBill {
        if bill.is_fallback() {
            audit.push(self.audit(
                "fallback-used",
                format!("no charges extracted, {} demo charges substituted", bill.charges.len()),
            ));
        }

        let letter = self.composer.compose(&bill, patient, options);
        audit.push(self.audit(
            "letter-composed",
            format!(
                "offer ${} ({}% reduction)",
                letter.offer_amount(),
                letter.savings_percent()
            ),
        ));

        ProcessedBill {
            bill,
            letter,
            audit,
        }
    }

    fn audit(&self, event_type: &str, detail: String) -> AuditRecord {
        let record = AuditRecord {
            event_type: event_type.to_string(),
            detail,
            timestamp: self.clock.now(),
        };
        info!(
            event_type = %record.event_type,
            detail = %record.detail,
            "audit event recorded"
        );
        record
    }
}
