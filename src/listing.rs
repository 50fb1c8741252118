use tracing::{info, warn};
use url::Url;

use crate::client::{FetchError, PageSource};
use crate::parser::dom::{self, PARAGRAPH_ANCHOR};

/// Fetch the election index and return the region listing URLs.
pub async fn fetch_region_links(
    source: &dyn PageSource,
    listing_url: &Url,
    base: &Url,
) -> Result<Vec<Url>, FetchError> {
    info!("Fetching election listing: {}", listing_url);
    let html = source.get(listing_url.as_str()).await?;
    let regions = parse_region_links(&html, base);
    info!("Region listings found: {}", regions.len());
    Ok(regions)
}

/// Every `<p> … <a href>` in document order, resolved against `base`.
pub fn parse_region_links(html: &str, base: &Url) -> Vec<Url> {
    let document = dom::document(html);
    document
        .select(&PARAGRAPH_ANCHOR)
        .filter_map(|a| dom::attr(a, "href"))
        .filter_map(|href| resolve(base, href))
        .collect()
}

/// Resolve a scraped href, logging (not failing) on garbage.
pub(crate) fn resolve(base: &Url, href: &str) -> Option<Url> {
    base.join(href.trim())
        .map_err(|source| FetchError::InvalidUrl {
            url: href.to_string(),
            source,
        })
        .inspect_err(|e| warn!("Skipping link: {}", e))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use async_trait::async_trait;

    fn base() -> Url {
        Url::parse("https://www.vaalirahoitusvalvonta.fi/").unwrap()
    }

    fn paths(urls: &[Url]) -> Vec<&str> {
        urls.iter().map(Url::path).collect()
    }

    #[test]
    fn fixture_order_and_filtering() {
        let html = std::fs::read_to_string("tests/fixtures/listing.html").unwrap();
        let links = parse_region_links(&html, &base());
        assert_eq!(
            paths(&links),
            vec![
                "/en/index/vaalirahailmoituksia/ilmoituslistaus/EV2019/01.html",
                "/en/index/vaalirahailmoituksia/ilmoituslistaus/EV2019/02.html",
                "/en/index/vaalirahailmoituksia/ilmoituslistaus/EV2019/03.html",
                "/en/index/vaalirahailmoituksia/ilmoituslistaus/EV2019/04.html",
            ]
        );
        assert!(links.iter().all(|u| u.host_str() == Some("www.vaalirahoitusvalvonta.fi")));
    }

    #[test]
    fn duplicates_are_kept_not_added() {
        let html = r#"<p><a href="a.html">1</a> <a href="b.html">2</a></p><p><a href="a.html">3</a></p>"#;
        let links = parse_region_links(html, &base());
        assert_eq!(paths(&links), vec!["/a.html", "/b.html", "/a.html"]);
    }

    #[test]
    fn unresolvable_href_is_skipped() {
        let html = r#"<p><a href="http://[oops/">bad</a><a href=" ok.html ">ok</a></p>"#;
        let links = parse_region_links(html, &base());
        assert_eq!(paths(&links), vec!["/ok.html"]);
    }

    #[test]
    fn no_paragraph_anchors() {
        assert!(parse_region_links("<div><a href='x'>x</a></div>", &base()).is_empty());
    }

    struct OnePage(HashMap<String, String>);

    #[async_trait]
    impl PageSource for OnePage {
        async fn get(&self, url: &str) -> Result<String, FetchError> {
            self.0.get(url).cloned().ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
        }
    }

    #[tokio::test]
    async fn fetch_uses_listing_url() {
        let listing = base().join("en/listing.html").unwrap();
        let source = OnePage(HashMap::from([(
            listing.to_string(),
            r#"<p><a href="r/1.html">1</a></p>"#.to_string(),
        )]));
        let links = fetch_region_links(&source, &listing, &base()).await.unwrap();
        assert_eq!(paths(&links), vec!["/r/1.html"]);
    }

    #[tokio::test]
    async fn listing_failure_propagates() {
        let source = OnePage(HashMap::new());
        let listing = base().join("en/listing.html").unwrap();
        let err = fetch_region_links(&source, &listing, &base()).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
    }
}
