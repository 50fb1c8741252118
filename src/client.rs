//! Page retrieval. Everything downstream talks to a [`PageSource`], so the
//! crawl stages can be driven from in-memory pages in tests.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{redirect, StatusCode};
use tracing::debug;

use crate::settings::Settings;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("GET {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("GET {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Cannot resolve {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("{url}: no disclosure form on page")]
    MissingForm { url: String },
}

#[async_trait]
pub trait PageSource: Send + Sync {
    /// Body of `url`. Only `200 OK` counts as success.
    async fn get(&self, url: &str) -> Result<String, FetchError>;
}

/// `reqwest`-backed source. Redirects are not followed, so a 3xx surfaces
/// as [`FetchError::Status`] like any other non-200 answer.
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(settings: &Settings) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .redirect(redirect::Policy::none())
            .user_agent(settings.user_agent.as_str())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageSource for HttpSource {
    async fn get(&self, url: &str) -> Result<String, FetchError> {
        let transport = |source| FetchError::Transport {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(transport)?;
        let status = response.status();
        debug!(%url, status = status.as_u16(), "fetched");
        if status != StatusCode::OK {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        response.text().await.map_err(transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings() -> Settings {
        Settings {
            base_url: "http://localhost/".into(),
            election: "EV2019".into(),
            concurrency: 2,
            timeout_secs: 5,
            user_agent: "test".into(),
        }
    }

    async fn serve(route: &str, template: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(template)
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn ok_returns_body() {
        let server = serve("/page.html", ResponseTemplate::new(200).set_body_string("<p>hi</p>")).await;
        let source = HttpSource::new(&settings()).unwrap();
        let body = source.get(&format!("{}/page.html", server.uri())).await.unwrap();
        assert_eq!(body, "<p>hi</p>");
    }

    #[tokio::test]
    async fn redirect_is_a_failure() {
        let server = serve(
            "/moved.html",
            ResponseTemplate::new(302).insert_header("Location", "/elsewhere.html"),
        )
        .await;
        let source = HttpSource::new(&settings()).unwrap();
        let err = source
            .get(&format!("{}/moved.html", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 302, .. }));
    }

    #[tokio::test]
    async fn not_found_is_a_failure() {
        let server = serve("/present.html", ResponseTemplate::new(200)).await;
        let source = HttpSource::new(&settings()).unwrap();
        let err = source
            .get(&format!("{}/absent.html", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn created_is_not_ok() {
        let server = serve("/odd.html", ResponseTemplate::new(201).set_body_string("x")).await;
        let source = HttpSource::new(&settings()).unwrap();
        let err = source.get(&format!("{}/odd.html", server.uri())).await.unwrap_err();
        assert!(err.to_string().contains("HTTP 201"));
    }
}
