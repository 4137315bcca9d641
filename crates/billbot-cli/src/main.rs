mod display;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use billbot_analysis::MatchPolicy;
use billbot_core::{
    LetterOptions, PatientInfo, PaymentType, SeededEntropy, Strategy, SystemClock, ThreadEntropy,
};
use billbot_ocr::HttpOcrClient;
use billbot_pipeline::{BillProcessor, ProcessedBill, Upload};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;

#[derive(Parser)]
#[command(name = "billbot")]
#[command(about = "Medical bill analysis and negotiation letter generator")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a bill and print a summary card
    Analyze {
        /// Bill text (.txt) or document (.pdf, .png, .jpg, .heic)
        file: PathBuf,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Analyze a bill and write the negotiation letter
    Letter {
        file: PathBuf,
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Run the built-in sample bill
    Demo {
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
        #[command(flatten)]
        run: RunArgs,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Html,
    Json,
    Pdf,
}

#[derive(Args)]
struct RunArgs {
    /// OCR service base URL, required for non-text documents
    #[arg(long, env = "BILLBOT_OCR_URL")]
    ocr_url: Option<String>,
    /// Processor config JSON
    #[arg(long, env = "BILLBOT_CONFIG")]
    config: Option<PathBuf>,
    /// Reference price table JSON
    #[arg(long, env = "BILLBOT_REFERENCE")]
    reference: Option<PathBuf>,
    /// Letter template overrides JSON
    #[arg(long, env = "BILLBOT_TEMPLATES")]
    templates: Option<PathBuf>,
    /// Keep only the strongest keyword flag per charge
    #[arg(long)]
    best_match: bool,
    /// Seed for generated account numbers
    #[arg(long, env = "BILLBOT_SEED")]
    seed: Option<u64>,

    #[arg(long, env = "BILLBOT_STRATEGY", default_value = "fair_pricing")]
    strategy: String,
    #[arg(long, env = "BILLBOT_PAYMENT_TYPE", default_value = "payment_ready")]
    payment_type: String,

    #[arg(long, env = "BILLBOT_PATIENT_NAME")]
    patient_name: Option<String>,
    #[arg(long, env = "BILLBOT_PATIENT_EMAIL")]
    email: Option<String>,
    #[arg(long, env = "BILLBOT_PATIENT_PHONE")]
    phone: Option<String>,
    #[arg(long, env = "BILLBOT_PATIENT_ADDRESS")]
    address: Option<String>,
    #[arg(long, env = "BILLBOT_PATIENT_CITY")]
    city: Option<String>,
    #[arg(long, env = "BILLBOT_PATIENT_STATE")]
    state: Option<String>,
    #[arg(long, env = "BILLBOT_PATIENT_ZIP")]
    zip: Option<String>,
}

impl RunArgs {
    fn patient(&self) -> PatientInfo {
        PatientInfo {
            name: self.patient_name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            address: self.address.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            zip: self.zip.clone(),
        }
    }

    fn options(&self) -> LetterOptions {
        LetterOptions {
            strategy: Strategy::parse_lenient(&self.strategy),
            payment_type: PaymentType::parse_lenient(&self.payment_type),
        }
    }

    fn processor(&self) -> Result<BillProcessor> {
        let mut builder = BillProcessor::builder();
        if let Some(path) = &self.config {
            builder = builder
                .config_file(path)
                .with_context(|| format!("loading config {}", path.display()))?;
        }
        if self.best_match {
            builder = builder.match_policy(MatchPolicy::BestMatch);
        }
        if let Some(path) = &self.reference {
            builder = builder
                .reference_file(path)
                .with_context(|| format!("loading reference table {}", path.display()))?;
        }
        if let Some(path) = &self.templates {
            builder = builder
                .templates_file(path)
                .with_context(|| format!("loading templates {}", path.display()))?;
        }

        builder = builder.clock(Arc::new(SystemClock));
        builder = match self.seed {
            Some(seed) => builder.entropy(Arc::new(SeededEntropy::new(seed))),
            None => builder.entropy(Arc::new(ThreadEntropy)),
        };
        if let Some(url) = &self.ocr_url {
            builder = builder.ocr(Arc::new(HttpOcrClient::new(url.clone())));
        }
        Ok(builder.build())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("billbot v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Analyze { file, run } => {
            let processor = run.processor()?;
            let processed = process_file(&processor, &file, &run).await?;
            display::print_bill_card(&processed, processor.reference());
        }
        Commands::Letter {
            file,
            format,
            out,
            run,
        } => {
            let processor = run.processor()?;
            let processed = process_file(&processor, &file, &run).await?;
            emit(&processed, format, out.as_deref())?;
        }
        Commands::Demo { format, run } => {
            let processor = run.processor()?;
            let processed = processor.process_demo(&run.patient(), run.options());
            println!("{}", demo_output(&processor, &processed, format)?);
        }
    }

    Ok(())
}

/// Text files skip OCR; anything else goes through the configured engine.
async fn process_file(
    processor: &BillProcessor,
    path: &Path,
    run: &RunArgs,
) -> Result<ProcessedBill> {
    let mime = mime_for(path);

    if mime == "text/plain" {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        return Ok(processor.process_text(&text, &run.patient(), run.options()));
    }

    if run.ocr_url.is_none() {
        bail!(
            "{} is not a text file; set --ocr-url or BILLBOT_OCR_URL to read it",
            path.display()
        );
    }
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let mut upload = Upload::new(bytes, mime);
    if let Some(name) = path.file_name() {
        upload = upload.with_filename(name.to_string_lossy());
    }

    processor
        .process_upload(&upload, &run.patient(), run.options())
        .await
        .map_err(|e| {
            let payload = e.payload();
            anyhow::anyhow!("{} ({}): {}", payload.error, e.status_code(), payload.details)
        })
}

fn render(processed: &ProcessedBill, format: Format) -> Result<String> {
    Ok(match format {
        Format::Text => processed.letter.text(),
        Format::Html => processed.letter.html(),
        Format::Json => serde_json::to_string_pretty(&processed.report())?,
        Format::Pdf => serde_json::to_string_pretty(&processed.letter.pdf())?,
    })
}

fn emit(processed: &ProcessedBill, format: Format, out: Option<&Path>) -> Result<()> {
    let rendered = render(processed, format)?;
    match out {
        Some(path) => {
            std::fs::write(path, rendered.as_bytes())
                .with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), "letter written");
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

/// The bill card only precedes text output; the other formats stay
/// machine-readable.
fn demo_output(
    processor: &BillProcessor,
    processed: &ProcessedBill,
    format: Format,
) -> Result<String> {
    let rendered = render(processed, format)?;
    Ok(match format {
        Format::Text => format!(
            "{}{rendered}",
            display::render_bill_card(processed, processor.reference())
        ),
        _ => rendered,
    })
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "txt" | "text" => "text/plain",
        "pdf" => "application/pdf",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "heic" => "image/heic",
        _ => "application/octet-stream",
    }
}
