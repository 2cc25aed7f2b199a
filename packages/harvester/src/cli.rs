//! Command-line interface for the harvester.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::catalog::{Catalog, CrawlStart, FileList};
use crate::config::{
    DEFAULT_BASE_DIR, DEFAULT_FTP_HOST, DEFAULT_FTP_PASSWORD, DEFAULT_FTP_PORT, DEFAULT_FTP_USER,
    DEFAULT_RETRIES,
};
use crate::error::{HarvesterError, Result};
use crate::fetch::{ArchiveFetcher, IntegrityPolicy};
use crate::ftp::{FtpConfig, FtpListing};
use crate::harvester::{harvest_with_observer, HarvestObserver};
use crate::output::{OutputFormat, RecordWriter};

/// Zakupki Harvester - crawl the procurement FTP catalog and normalize its XML documents.
#[derive(Parser)]
#[command(name = "zakupki-harvester")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Catalog server connection options.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ConnectionArgs {
    /// FTP host of the catalog
    #[arg(long, global = true, default_value = DEFAULT_FTP_HOST)]
    pub host: String,

    /// FTP control port
    #[arg(long, global = true, default_value_t = DEFAULT_FTP_PORT)]
    pub port: u16,

    /// Login name
    #[arg(long, global = true, default_value = DEFAULT_FTP_USER)]
    pub user: String,

    /// Login password
    #[arg(long, global = true, default_value = DEFAULT_FTP_PASSWORD)]
    pub password: String,

    /// Directory holding the regions
    #[arg(long, global = true, default_value = DEFAULT_BASE_DIR)]
    pub base_dir: String,
}

impl From<&ConnectionArgs> for FtpConfig {
    fn from(args: &ConnectionArgs) -> Self {
        Self {
            host: args.host.clone(),
            port: args.port,
            user: args.user.clone(),
            password: args.password.clone(),
            base_dir: args.base_dir.clone(),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the regions at the catalog root.
    Regions,

    /// Crawl the catalog and list the document types found.
    Types {
        /// Region to crawl (default: whole catalog)
        #[arg(short, long)]
        region: Option<String>,
    },

    /// Crawl the catalog and print the matching archive paths.
    Crawl {
        /// Region to crawl and filter by (default: whole catalog)
        #[arg(short, long)]
        region: Option<String>,

        /// Document type to filter by (e.g., contract)
        #[arg(short = 't', long = "type")]
        document_type: Option<String>,
    },

    /// Crawl, download and normalize every matching document.
    Harvest {
        /// Region to crawl and filter by (default: whole catalog)
        #[arg(short, long)]
        region: Option<String>,

        /// Document type to filter by (e.g., contract)
        #[arg(short = 't', long = "type")]
        document_type: Option<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Record format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Download attempts per archive
        #[arg(long, default_value_t = DEFAULT_RETRIES)]
        retries: u32,

        /// Fail instead of using downloads that never matched their catalog size
        #[arg(long)]
        strict: bool,
    },
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = FtpConfig::from(&cli.connection);

    match cli.command {
        Commands::Regions => regions_command(&config),
        Commands::Types { region } => types_command(&config, region.as_deref()),
        Commands::Crawl {
            region,
            document_type,
        } => crawl_command(&config, region.as_deref(), document_type.as_deref()),
        Commands::Harvest {
            region,
            document_type,
            output,
            format,
            retries,
            strict,
        } => {
            let policy = if strict {
                IntegrityPolicy::Fail
            } else {
                IntegrityPolicy::Proceed
            };
            let fetcher = ArchiveFetcher::new(retries).with_policy(policy);
            harvest_command(
                &config,
                region.as_deref(),
                document_type.as_deref(),
                output.as_deref(),
                format,
                &fetcher,
            )
        }
    }
}

/// Create a progress spinner on stderr.
fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn connect(config: &FtpConfig) -> Result<Catalog<FtpListing>> {
    let pb = spinner(&format!("Connecting to {}...", config.address()));
    let listing = FtpListing::connect(config);
    pb.finish_and_clear();
    Ok(Catalog::new(listing?))
}

/// Crawl with a spinner showing the folder being listed.
fn crawl_catalog(catalog: &mut Catalog<FtpListing>, region: Option<&str>) -> Result<FileList> {
    let pb = spinner("Crawling catalog...");
    let result = catalog.crawl_with_progress(region, |folder, found| {
        pb.set_message(format!("Crawling {folder} ({found} files found)"));
    });
    pb.finish_and_clear();
    let files = result?;

    if let CrawlStart::UnknownRegion(region) = files.start() {
        eprintln!(
            "{} region {} not found, crawled all regions",
            style("Note:").yellow().bold(),
            style(region).cyan()
        );
    }
    eprintln!(
        "{} {} files",
        style("Found").bold(),
        style(files.len()).green()
    );
    Ok(files)
}

/// Execute the regions command.
fn regions_command(config: &FtpConfig) -> Result<()> {
    let mut catalog = connect(config)?;
    for region in catalog.list_regions()? {
        println!("{region}");
    }
    Ok(())
}

/// Execute the types command.
fn types_command(config: &FtpConfig, region: Option<&str>) -> Result<()> {
    let mut catalog = connect(config)?;
    let files = crawl_catalog(&mut catalog, region)?;
    let types = catalog.list_document_types(&files);

    for code in &types.codes {
        println!("{code}");
    }
    if !types.unmatched.is_empty() {
        eprintln!(
            "{} {} file(s) without a document type code",
            style("Skipped:").yellow().bold(),
            types.unmatched.len()
        );
    }
    Ok(())
}

/// Execute the crawl command.
fn crawl_command(
    config: &FtpConfig,
    region: Option<&str>,
    document_type: Option<&str>,
) -> Result<()> {
    let mut catalog = connect(config)?;
    let files = crawl_catalog(&mut catalog, region)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for path in catalog.filter(&files, region, document_type)? {
        writeln!(out, "{path}")?;
    }
    out.flush()?;
    Ok(())
}

/// Spinner messages while harvesting.
struct SpinnerObserver<'a> {
    pb: &'a ProgressBar,
    total: usize,
    documents: usize,
}

impl HarvestObserver for SpinnerObserver<'_> {
    fn archive_started(&mut self, path: &str, index: usize) {
        self.pb.set_message(format!(
            "[{}/{}] {path} ({} documents)",
            index + 1,
            self.total,
            self.documents
        ));
    }

    fn document_written(&mut self, _archive: &str, _member: &str) {
        self.documents += 1;
    }
}

/// Open the record sink: a file if given, stdout otherwise.
fn open_output(output: Option<&Path>) -> Result<Box<dyn Write>> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                if !parent.is_dir() {
                    return Err(HarvesterError::Io(io::Error::new(
                        io::ErrorKind::NotFound,
                        format!("Output directory does not exist: {}", parent.display()),
                    )));
                }
            }
            Ok(Box::new(BufWriter::new(File::create(path)?)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout()))),
    }
}

/// Execute the harvest command.
fn harvest_command(
    config: &FtpConfig,
    region: Option<&str>,
    document_type: Option<&str>,
    output: Option<&Path>,
    format: OutputFormat,
    fetcher: &ArchiveFetcher,
) -> Result<()> {
    // Validate the output location before spending time on the crawl
    let sink = open_output(output)?;

    let mut catalog = connect(config)?;
    let files = crawl_catalog(&mut catalog, region)?;
    let selected: Vec<&str> = catalog.filter(&files, region, document_type)?.collect();

    eprintln!(
        "{} {} archive(s)",
        style("Harvesting").bold(),
        style(selected.len()).cyan()
    );

    let mut writer = RecordWriter::new(sink, format);
    let pb = spinner("Downloading archives...");
    let mut observer = SpinnerObserver {
        pb: &pb,
        total: selected.len(),
        documents: 0,
    };
    let result = harvest_with_observer(
        catalog.listing_mut(),
        fetcher,
        selected.iter().copied(),
        &mut writer,
        &mut observer,
    );
    pb.finish_and_clear();
    let report = result?;
    writer.finish()?;

    eprintln!();
    eprintln!("  Archives: {}", report.archives);
    eprintln!("  Documents: {}", style(report.documents).green());
    if !report.unverified.is_empty() {
        eprintln!(
            "  Unverified downloads: {}",
            style(report.unverified.len()).yellow().bold()
        );
        for path in &report.unverified {
            eprintln!("    {path}");
        }
    }
    if !report.warnings.is_empty() {
        eprintln!("  Warnings: {}", style(report.warnings.len()).yellow().bold());
    }
    if let Some(path) = output {
        eprintln!();
        eprintln!("{} {}", style("Saved to:").green().bold(), path.display());
    }

    Ok(())
}
