use anyhow::{Context, Result};
use config::{Config, Environment};
use serde::Deserialize;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://www.vaalirahoitusvalvonta.fi/";
pub const DEFAULT_ELECTION: &str = "EV2019";
const LISTING_PATH: &str = "en/index/vaalirahailmoituksia/ilmoituslistaus/";
const ENV_PREFIX: &str = "EFD";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub base_url: String,
    pub election: String,
    pub concurrency: usize,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Settings {
    /// Defaults, then `EFD_*` environment variables.
    pub fn load() -> Result<Self> {
        Self::from_builder(Config::builder().add_source(
            Environment::with_prefix(ENV_PREFIX).try_parsing(true),
        ))
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self> {
        let settings: Settings = builder
            .set_default("base_url", DEFAULT_BASE_URL)?
            .set_default("election", DEFAULT_ELECTION)?
            .set_default("concurrency", 4)?
            .set_default("timeout_secs", 30)?
            .set_default(
                "user_agent",
                concat!("disclosure_scraper/", env!("CARGO_PKG_VERSION")),
            )?
            .build()
            .context("Failed to build settings")?
            .try_deserialize()
            .context("Invalid settings")?;
        Ok(settings)
    }

    /// Site root that every scraped href is resolved against.
    pub fn base(&self) -> Result<Url> {
        let mut raw = self.base_url.clone();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Url::parse(&raw).with_context(|| format!("Invalid base URL {:?}", self.base_url))
    }

    pub fn listing_url(&self) -> Result<Url> {
        let path = format!("{}{}.html", LISTING_PATH, self.election);
        self.base()?
            .join(&path)
            .with_context(|| format!("Invalid election code {:?}", self.election))
    }
}
