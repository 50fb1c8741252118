use std::future::Future;
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::{mpsc, Semaphore};
use tracing::{info, warn};
use url::Url;

use crate::client::{FetchError, PageSource};
use crate::listing::resolve;
use crate::parser::dom::{self, CELL_ANCHOR, FORM};

const LINK_TEXT: &str = "Funding disclosure";

/// What to do when one request of a batch fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Keep going; failures are returned next to the successes.
    #[default]
    Collect,
    /// Cancel everything still in flight and return the first failure.
    AbortAll,
}

#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub base: Url,
    pub concurrency: usize,
    pub policy: FailurePolicy,
}

/// Crawl stats returned after completion.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CrawlStats {
    pub total: usize,
    pub ok: usize,
    pub errors: usize,
    /// Tasks that never reported back (panicked or aborted).
    pub lost: usize,
}

#[derive(Debug, Default)]
pub struct LinkHarvest {
    pub links: Vec<Url>,
    pub failures: Vec<(Url, FetchError)>,
}

// ── Disclosure links ──

/// Fetch every region listing and gather its disclosure links, in region
/// order.
pub async fn collect_disclosure_links(
    source: Arc<dyn PageSource>,
    regions: Vec<Url>,
    options: &CrawlOptions,
) -> Result<LinkHarvest, FetchError> {
    info!("Collecting disclosure links from {} regions", regions.len());
    let base = options.base.clone();

    let outcomes = fan_out(
        regions,
        options.concurrency,
        options.policy,
        &ProgressBar::hidden(),
        |region| {
            let source = Arc::clone(&source);
            let base = base.clone();
            async move {
                let html = source.get(region.as_str()).await?;
                Ok::<_, FetchError>(parse_disclosure_links(&html, &base))
            }
        },
    )
    .await?;

    let mut harvest = LinkHarvest::default();
    for (region, outcome) in outcomes {
        match outcome {
            Ok(links) => harvest.links.extend(links),
            Err(e) => {
                warn!("Region {} failed: {}", region, e);
                harvest.failures.push((region, e));
            }
        }
    }
    info!(
        "Disclosure links found: {} ({} regions failed)",
        harvest.links.len(),
        harvest.failures.len()
    );
    Ok(harvest)
}

/// `<td> … <a>` whose trimmed text is exactly "Funding disclosure".
pub fn parse_disclosure_links(html: &str, base: &Url) -> Vec<Url> {
    let document = dom::document(html);
    document
        .select(&CELL_ANCHOR)
        .filter(|a| dom::trimmed_text(*a) == LINK_TEXT)
        .filter_map(|a| dom::attr(a, "href"))
        .filter_map(|href| resolve(base, href))
        .collect()
}

// ── Disclosure documents ──

/// Inner markup of the disclosure form, `None` when the page has none.
pub async fn fetch_raw_disclosure(
    source: &dyn PageSource,
    url: &Url,
) -> Result<Option<String>, FetchError> {
    let html = source.get(url.as_str()).await?;
    Ok(extract_form_markup(&html))
}

/// First `div[class="ann_form"]`, inner HTML.
pub fn extract_form_markup(html: &str) -> Option<String> {
    dom::document(html)
        .select(&FORM)
        .next()
        .map(|form| form.inner_html())
}

/// Fetch disclosure forms concurrently. A page without a form counts as a
/// failure ([`FetchError::MissingForm`]).
pub async fn fetch_disclosures(
    source: Arc<dyn PageSource>,
    urls: Vec<Url>,
    options: &CrawlOptions,
) -> Result<(Vec<(Url, Result<String, FetchError>)>, CrawlStats), FetchError> {
    let total = urls.len();
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );

    let outcomes = fan_out(urls, options.concurrency, options.policy, &pb, |url| {
        let source = Arc::clone(&source);
        async move {
            fetch_raw_disclosure(&*source, &url)
                .await?
                .ok_or_else(|| FetchError::MissingForm {
                    url: url.to_string(),
                })
        }
    })
    .await;
    pb.finish_and_clear();
    let outcomes = outcomes?;

    let errors = outcomes.iter().filter(|(_, r)| r.is_err()).count();
    let stats = CrawlStats {
        total,
        ok: outcomes.len() - errors,
        errors,
        lost: total - outcomes.len(),
    };
    if stats.lost > 0 {
        warn!("{} disclosure fetches ended without a result", stats.lost);
    }
    info!(
        "Fetched {} disclosures ({} ok, {} errors, {} lost)",
        stats.total, stats.ok, stats.errors, stats.lost
    );
    Ok((outcomes, stats))
}

// ── Bounded fan-out ──

/// Run `task` for every URL with at most `concurrency` in flight. Results
/// come back in input order.
async fn fan_out<T, F, Fut>(
    urls: Vec<Url>,
    concurrency: usize,
    policy: FailurePolicy,
    pb: &ProgressBar,
    task: F,
) -> Result<Vec<(Url, Result<T, FetchError>)>, FetchError>
where
    T: Send + 'static,
    F: Fn(Url) -> Fut,
    Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
{
    let concurrency = concurrency.max(1);
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let (tx, mut rx) = mpsc::channel(concurrency * 2);

    let mut handles = Vec::with_capacity(urls.len());
    for (idx, url) in urls.into_iter().enumerate() {
        let sem = Arc::clone(&semaphore);
        let tx = tx.clone();
        let work = task(url.clone());

        handles.push(tokio::spawn(async move {
            let Ok(_permit) = sem.acquire_owned().await else {
                return;
            };
            let result = work.await;
            let _ = tx.send((idx, url, result)).await;
        }));
    }

    // Drop our copy of tx so rx closes when all spawned tasks finish
    drop(tx);

    let mut outcomes = Vec::with_capacity(handles.len());
    while let Some((idx, url, result)) = rx.recv().await {
        pb.inc(1);
        match (policy, result) {
            (FailurePolicy::AbortAll, Err(e)) => {
                warn!("Aborting batch after failure on {}: {}", url, e);
                for handle in &handles {
                    handle.abort();
                }
                return Err(e);
            }
            (_, result) => outcomes.push((idx, url, result)),
        }
    }

    outcomes.sort_by_key(|(idx, _, _)| *idx);
    Ok(outcomes
        .into_iter()
        .map(|(_, url, result)| (url, result))
        .collect())
}
