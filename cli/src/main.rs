//! undoc CLI - document text extraction tool

use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;

use undoc::{
    CloudUploadOptions, ExtractOptions, ExtractionResult, OcrOptions, Pipeline, PipelineServices,
    RawDocument, TraceStatus,
};

#[derive(Parser)]
#[command(name = "undoc")]
#[command(version)]
#[command(about = "Extract text and structure from PDF, DOCX, text, and image files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract plain text
    Text {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Print per-page tagged text instead of the joined text
        #[arg(long)]
        tagged: bool,

        #[command(flatten)]
        extract: ExtractArgs,
    },

    /// Extract the full result as JSON
    Json {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        #[command(flatten)]
        extract: ExtractArgs,
    },

    /// Show extraction metadata and the diagnostics trace
    Info {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[command(flatten)]
        extract: ExtractArgs,
    },
}

#[derive(clap::Args)]
struct ExtractArgs {
    /// Remote extraction endpoint used as a fallback for weak PDFs
    #[arg(long, env = "UNDOC_REMOTE_ENDPOINT")]
    remote_endpoint: Option<String>,

    /// OCR languages (tesseract codes, repeatable)
    #[arg(long = "ocr-lang", value_name = "LANG")]
    ocr_languages: Vec<String>,

    /// Maximum pages rendered for OCR
    #[arg(long, default_value = "20")]
    ocr_page_limit: usize,

    /// Key prefix for page image upload (enables upload when set)
    #[arg(long, value_name = "PREFIX")]
    upload_prefix: Option<String>,
}

impl ExtractArgs {
    fn to_options(&self) -> ExtractOptions {
        let mut ocr = OcrOptions::default();
        if !self.ocr_languages.is_empty() {
            ocr.languages = self.ocr_languages.clone();
        }
        ocr.page_limit = self.ocr_page_limit;

        ExtractOptions {
            ocr,
            remote_endpoint: self.remote_endpoint.clone(),
            cloud_upload: self.upload_prefix.as_ref().map(|prefix| CloudUploadOptions {
                prefix: prefix.clone(),
                ..Default::default()
            }),
        }
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();

    if let Err(e) = run().await {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run() -> undoc::Result<()> {
    let cli = Cli::parse();

    let services = default_services();
    let pipeline = Pipeline::new(services);

    match cli.command {
        Commands::Text {
            input,
            output,
            tagged,
            extract,
        } => {
            let result = extract_one(&pipeline, &input, &extract).await?;
            let text = if tagged {
                result.page_tagged_text.clone()
            } else {
                result.text.clone()
            };
            write_output(output, &text)?;
            report_quality(&result);
        }
        Commands::Json {
            input,
            output,
            compact,
            extract,
        } => {
            let result = extract_one(&pipeline, &input, &extract).await?;
            let json = if compact {
                serde_json::to_string(&result)
            } else {
                serde_json::to_string_pretty(&result)
            }
            .map_err(|e| undoc::Error::Other(e.to_string()))?;
            write_output(output, &json)?;
        }
        Commands::Info { input, extract } => {
            let result = extract_one(&pipeline, &input, &extract).await?;
            print_info(&result);
        }
    }

    Ok(())
}

fn default_services() -> PipelineServices {
    let services = PipelineServices::headless()
        .with_ocr(std::sync::Arc::new(undoc::TesseractCliEngine::new()));

    #[cfg(feature = "render-mupdf")]
    let services = services.with_renderer(std::sync::Arc::new(undoc::MupdfRenderer));

    services
}

async fn extract_one(
    pipeline: &Pipeline,
    input: &PathBuf,
    args: &ExtractArgs,
) -> undoc::Result<ExtractionResult> {
    let doc = RawDocument::from_file(input)?;
    log::info!("extracting {} ({} bytes)", input.display(), doc.size());
    pipeline.extract(&doc, &args.to_options()).await
}

fn write_output(output: Option<PathBuf>, content: &str) -> undoc::Result<()> {
    match output {
        Some(path) => {
            fs::write(&path, content)?;
            eprintln!("{} {}", "wrote".green(), path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

fn report_quality(result: &ExtractionResult) {
    if result.text.is_empty() {
        eprintln!(
            "{} no text could be extracted (extractor: {})",
            "warning:".yellow().bold(),
            result.meta.extractor
        );
    }
}

fn print_info(result: &ExtractionResult) {
    println!("{:<14} {}", "kind:".bold(), result.meta.kind);
    println!("{:<14} {}", "extractor:".bold(), result.meta.extractor);
    println!("{:<14} {}", "digest:".bold(), result.meta.digest);
    println!("{:<14} {}", "pages:".bold(), result.pages.len());
    println!("{:<14} {:.2}", "quality:".bold(), result.meta.quality);
    println!("{:<14} {}", "used ocr:".bold(), result.meta.used_ocr);
    if !result.meta.ocr_patched_pages.is_empty() {
        println!(
            "{:<14} {:?}",
            "ocr patched:".bold(),
            result.meta.ocr_patched_pages
        );
    }
    if let Some(layout) = &result.layout {
        println!(
            "{:<14} {} headings, {} tables",
            "layout:".bold(),
            layout.summary.heading_count,
            layout.summary.table_count
        );
    }

    println!("\n{}", "trace:".bold());
    for entry in &result.meta.trace {
        let status = match entry.status {
            TraceStatus::Info => "info".normal(),
            TraceStatus::Warn => "warn".yellow(),
            TraceStatus::Error => "error".red(),
        };
        println!("  [{:<5}] {:<12} {}", status, entry.stage, entry.detail);
    }
}
