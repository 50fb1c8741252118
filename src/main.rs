mod client;
mod crawler;
mod listing;
mod output;
mod parser;
mod settings;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use rayon::prelude::*;
use tracing::{info, warn};
use url::Url;

use client::{HttpSource, PageSource};
use settings::Settings;
use crawler::{CrawlOptions, FailurePolicy};
use output::RecordWriter;
use parser::record::DisclosureEntry;

#[derive(Parser)]
#[command(
    name = "disclosure_scraper",
    about = "Election funding disclosures from vaalirahoitusvalvonta.fi as JSON"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Election code of the listing page (e.g. EV2019)
    #[arg(long, global = true)]
    election: Option<String>,
    /// Max concurrent requests
    #[arg(short = 'c', long, global = true)]
    concurrency: Option<usize>,
    /// Abort the whole batch on the first failed request
    #[arg(long, global = true)]
    fail_fast: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List region listing URLs
    Regions,
    /// List disclosure URLs
    Links {
        /// Only crawl the first N regions
        #[arg(long)]
        regions: Option<usize>,
    },
    /// Fetch and parse a single disclosure
    Fetch {
        url: String,
        #[arg(long)]
        pretty: bool,
    },
    /// Parse a saved disclosure page offline
    Parse {
        file: PathBuf,
        #[arg(long)]
        pretty: bool,
    },
    /// Listing → regions → disclosures → records
    Run {
        /// Only crawl the first N regions
        #[arg(long)]
        regions: Option<usize>,
        /// Max disclosures to fetch
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Write records here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
        #[arg(long)]
        pretty: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = apply_overrides(Settings::load()?, &cli.global);
    let options = CrawlOptions {
        base: settings.base()?,
        concurrency: settings.concurrency,
        policy: if cli.global.fail_fast {
            FailurePolicy::AbortAll
        } else {
            FailurePolicy::Collect
        },
    };

    let result = match cli.command {
        Commands::Regions => {
            let source = http_source(&settings)?;
            for region in regions(&*source, &settings, None).await? {
                println!("{}", region);
            }
            Ok(())
        }
        Commands::Links { regions: limit } => {
            let source = http_source(&settings)?;
            let regions = regions(&*source, &settings, limit).await?;
            let harvest = crawler::collect_disclosure_links(source, regions, &options).await?;
            for link in &harvest.links {
                println!("{}", link);
            }
            Ok(())
        }
        Commands::Fetch { url, pretty } => {
            let source = http_source(&settings)?;
            let url = Url::parse(&url).with_context(|| format!("Invalid URL {:?}", url))?;
            let markup = crawler::fetch_raw_disclosure(&*source, &url)
                .await?
                .with_context(|| format!("No disclosure form on {}", url))?;
            let mut writer = RecordWriter::open(None, pretty)?;
            writer.write(&entry(url.to_string(), &markup))?;
            writer.finish().map(|_| ())
        }
        Commands::Parse { file, pretty } => {
            let html = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {:?}", file))?;
            // Saved pages carry the whole document; bare form markup is used as-is.
            let markup = crawler::extract_form_markup(&html).unwrap_or(html);
            let mut writer = RecordWriter::open(None, pretty)?;
            writer.write(&entry(file.display().to_string(), &markup))?;
            writer.finish().map(|_| ())
        }
        Commands::Run {
            regions: region_limit,
            limit,
            out,
            pretty,
        } => {
            let source = http_source(&settings)?;
            let regions = regions(&*source, &settings, region_limit).await?;
            let harvest =
                crawler::collect_disclosure_links(Arc::clone(&source), regions, &options).await?;

            let mut links = harvest.links;
            if let Some(n) = limit {
                links.truncate(n);
            }
            if links.is_empty() {
                warn!("No disclosure links found.");
                return Ok(());
            }

            let t_fetch = Instant::now();
            let (documents, stats) = crawler::fetch_disclosures(source, links, &options).await?;
            info!(
                "Fetched {} disclosures ({} ok, {} errors, {} lost) in {:.1}s",
                stats.total,
                stats.ok,
                stats.errors,
                stats.lost,
                t_fetch.elapsed().as_secs_f64()
            );

            let mut writer = RecordWriter::open(out.as_deref(), pretty)?;
            let written = write_records(&mut writer, documents)?;
            writer.finish()?;
            info!(
                "Wrote {} records ({} region failures, {} document failures)",
                written,
                harvest.failures.len(),
                stats.errors + stats.lost
            );
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        info!("Done in {}", format_duration(elapsed));
    }

    result
}

fn apply_overrides(mut settings: Settings, global: &GlobalArgs) -> Settings {
    if let Some(election) = &global.election {
        settings.election = election.clone();
    }
    if let Some(concurrency) = global.concurrency {
        settings.concurrency = concurrency;
    }
    settings
}

fn http_source(settings: &Settings) -> Result<Arc<dyn PageSource>> {
    let source = HttpSource::new(settings).context("Failed to build HTTP client")?;
    Ok(Arc::new(source))
}

async fn regions(
    source: &dyn PageSource,
    settings: &Settings,
    limit: Option<usize>,
) -> Result<Vec<Url>> {
    let mut regions =
        listing::fetch_region_links(source, &settings.listing_url()?, &settings.base()?).await?;
    if let Some(n) = limit {
        regions.truncate(n);
    }
    if regions.is_empty() {
        bail!("Listing page has no region links");
    }
    Ok(regions)
}

fn entry(url: String, markup: &str) -> DisclosureEntry {
    DisclosureEntry {
        url,
        fetched_at: Utc::now(),
        record: parser::parse_disclosure(markup),
    }
}

/// Parse fetched forms in parallel chunks and write them in crawl order.
fn write_records(
    writer: &mut RecordWriter,
    documents: Vec<(Url, Result<String, client::FetchError>)>,
) -> Result<usize> {
    let mut markups = Vec::with_capacity(documents.len());
    for (url, doc) in documents {
        match doc {
            Ok(markup) => markups.push((url, markup)),
            Err(e) => warn!("Skipping {}: {}", url, e),
        }
    }

    for chunk in markups.chunks(100) {
        let entries: Vec<DisclosureEntry> = chunk
            .par_iter()
            .map(|(url, markup)| entry(url.to_string(), markup))
            .collect();
        for e in &entries {
            writer.write(e)?;
        }
    }
    Ok(writer.written())
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
