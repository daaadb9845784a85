mod funds;
mod models;
mod parser;
mod settings;
mod sheet;
mod xml;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use models::FundRegistry;
use parser::SourceContext;
use settings::Settings;

#[derive(Parser)]
#[command(name = "dbn_scraper", about = "Private health insurance XML to spreadsheet extractor")]
struct Cli {
    /// Directory holding the funds file and policy XML files
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Directory the spreadsheets are written to
    #[arg(long, global = true)]
    results_dir: Option<PathBuf>,
    /// Funds reference file name inside the data directory
    #[arg(long, global = true)]
    funds_file: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract every policy file in the data directory into one sheet each
    Run,
    /// Print the parsed fund registry as JSON
    Funds,
    /// Print assembled policies of one policy file as JSON
    Inspect {
        /// Policy XML file
        file: PathBuf,
        /// Max policies to print
        #[arg(short = 'n', long, default_value = "5")]
        limit: usize,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let mut settings = Settings::load()?;
    if let Some(dir) = cli.data_dir {
        settings.data_dir = dir;
    }
    if let Some(dir) = cli.results_dir {
        settings.results_dir = dir;
    }
    if let Some(name) = cli.funds_file {
        settings.funds_file = name;
    }
    info!(?settings, "Starting extractor");

    let result = match cli.command {
        Commands::Run => {
            println!("============== DBN XML SCRAPER ==============\n");
            let totals = run_batch(&settings)?;
            totals.print();
            Ok(())
        }
        Commands::Funds => {
            let registry = funds::load_registry(&settings.funds_path())?;
            println!("{}", serde_json::to_string_pretty(&registry.sorted())?);
            println!("\n{} funds", registry.len());
            Ok(())
        }
        Commands::Inspect { file, limit } => {
            let registry = funds::load_registry(&settings.funds_path())?;
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {:?}", file))?;
            let doc = xml::parse(&raw).with_context(|| format!("Failed to parse {:?}", file))?;
            let source_name = file_name(&file);
            let ctx = SourceContext {
                source_name: &source_name,
                registry: &registry,
                download_base: &settings.download_base,
            };
            let out = parser::process_document(&doc, &ctx, || {});
            let shown: Vec<_> = out.policies.iter().take(limit).collect();
            println!("{}", serde_json::to_string_pretty(&shown)?);
            println!(
                "\n{} of {} policies ({} skipped)",
                shown.len(),
                out.policies.len(),
                out.dropped
            );
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

#[derive(Default)]
struct BatchTotals {
    files: usize,
    failed: usize,
    policies: usize,
    dropped: usize,
}

impl BatchTotals {
    fn print(&self) {
        println!(
            "Wrote {} policies from {} files ({} products skipped, {} files failed).",
            self.policies, self.files, self.dropped, self.failed,
        );
    }
}

struct FileCounts {
    policies: usize,
    dropped: usize,
    output: PathBuf,
}

/// Build the registry once, then extract and write each policy file.
/// A failing file is logged and the batch moves on.
fn run_batch(settings: &Settings) -> Result<BatchTotals> {
    println!("... Scraping funds XML file ...");
    let registry = funds::load_registry(&settings.funds_path())?;

    let files = policy_files(&settings.data_dir)?;
    std::fs::create_dir_all(&settings.results_dir)
        .with_context(|| format!("Failed to create {:?}", settings.results_dir))?;

    println!("... Scraping {} policy XML files ...\n", files.len());
    let mut totals = BatchTotals::default();
    for path in &files {
        match process_file(path, &registry, settings) {
            Ok(counts) => {
                totals.files += 1;
                totals.policies += counts.policies;
                totals.dropped += counts.dropped;
                println!("-- {} policies -> {}", counts.policies, counts.output.display());
            }
            Err(e) => {
                totals.failed += 1;
                error!(file = %path.display(), "{:#}", e);
            }
        }
    }
    Ok(totals)
}

fn process_file(path: &Path, registry: &FundRegistry, settings: &Settings) -> Result<FileCounts> {
    use indicatif::{ProgressBar, ProgressStyle};

    let source_name = file_name(path);
    println!("-- Scraping {} --", source_name);
    let raw = std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    let doc = xml::parse(&raw).with_context(|| format!("Failed to parse {:?}", path))?;

    let pb = ProgressBar::new(doc.find_all("product").len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} products",
            )?
            .progress_chars("#>-"),
    );

    let ctx = SourceContext {
        source_name: &source_name,
        registry,
        download_base: &settings.download_base,
    };
    let out = parser::process_document(&doc, &ctx, || pb.inc(1));
    pb.finish_and_clear();

    if let Some(declared) = out.declared {
        info!(
            source = %source_name,
            declared,
            assembled = out.policies.len(),
            dropped = out.dropped,
            "products assembled"
        );
    }

    let now = chrono::Local::now().naive_local();
    let output = sheet::output_path(&settings.results_dir, &source_name, now);
    let mut sink = sheet::CsvSheet::create(&output)?;
    sheet::write_policies(&mut sink, &out.policies)
        .with_context(|| format!("Failed to write {:?}", output))?;

    Ok(FileCounts {
        policies: out.policies.len(),
        dropped: out.dropped,
        output,
    })
}

/// Policy files are every `.xml` in the data directory except the funds file, by name.
fn policy_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to list {:?}", dir))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            let name = file_name(p);
            name.contains(".xml") && !name.contains("Funds")
        })
        .collect();
    files.sort();
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
