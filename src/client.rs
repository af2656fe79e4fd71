use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Url;
use reqwest::blocking::Client as HttpClient;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::load_config;
use crate::error::{Error, Result};
use crate::pagination::{Page, PageSource, PaginatedFetcher, Record};
use crate::query::Query;
use crate::search::CollectionSearch;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base NMDC API URL, typically `https://api.microbiomedata.org`.
    pub url: String,
    /// Whether to verify TLS certificates.
    pub verify: bool,
}

#[derive(Debug, Clone)]
pub struct Client {
    url: String,
    verify: bool,
    progress: bool,
    http: HttpClient,
}

#[derive(Debug, serde::Deserialize)]
struct CollectionNameReply {
    collection_name: String,
}

impl Client {
    /// Creates a client using environment variables and/or `.nmdcrc`.
    ///
    /// This is equivalent to `Client::new(None, None)`.
    pub fn from_env() -> Result<Self> {
        Self::new(None, None)
    }

    /// Creates a client using (in order of precedence):
    /// - explicit `url`/`verify` arguments
    /// - environment variable `NMDC_API_URL`
    /// - config file from `NMDC_RC` or `.nmdcrc`
    /// - the public API at `https://api.microbiomedata.org`
    pub fn new(url: Option<String>, verify: Option<bool>) -> Result<Self> {
        let cfg = load_config(url, verify)?;
        Self::with_config(cfg, Duration::from_secs(60))
    }

    fn with_config(cfg: ClientConfig, timeout: Duration) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("nmdcapi-rs/{}", env!("CARGO_PKG_VERSION")))
                .unwrap_or(HeaderValue::from_static("nmdcapi-rs")),
        );

        let mut builder = HttpClient::builder()
            .default_headers(default_headers)
            .timeout(timeout);

        if !cfg.verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder.build()?;

        Ok(Self {
            url: cfg.url,
            verify: cfg.verify,
            progress: false,
            http,
        })
    }

    /// Rebuilds the underlying HTTP client with a different request timeout.
    pub fn with_timeout(self, timeout: Duration) -> Result<Self> {
        let progress = self.progress;
        let cfg = ClientConfig {
            url: self.url,
            verify: self.verify,
        };
        Ok(Self::with_config(cfg, timeout)?.with_progress(progress))
    }

    /// Shows a spinner on stderr while [`Client::fetch_all`] runs.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.url
    }

    /// Handle for searching one collection, e.g. `client.collection("study_set")`.
    pub fn collection(&self, name: impl Into<String>) -> CollectionSearch<'_> {
        CollectionSearch::new(self, name)
    }

    /// Fetches a single page of `query`.
    pub fn fetch_page(&self, query: &Query) -> Result<Page> {
        self.get_json(&query.segments(), &query.params())
    }

    /// Fetches every page of `query`, following `next_page_token`.
    pub fn fetch_all(&self, query: &Query) -> Result<Vec<Record>> {
        let fetcher = PaginatedFetcher::new(self);
        if self.progress {
            fetcher.with_progress(spinner(query.collection())).fetch_all(query)
        } else {
            fetcher.fetch_all(query)
        }
    }

    /// `GET /nmdcschema/{collection}/{id}`: one record by id.
    pub fn record_by_id(&self, collection: &str, id: &str) -> Result<Record> {
        self.get_json(&["nmdcschema", collection, id], &[])
    }

    /// Looks up which collection a document id lives in.
    pub fn collection_name_for_id(&self, id: &str) -> Result<String> {
        let reply: CollectionNameReply =
            self.get_json(&["nmdcschema", "ids", id, "collection-name"], &[])?;
        Ok(reply.collection_name)
    }

    /// Issues a GET against the base URL extended by `segments` and decodes
    /// the JSON body. Each segment is percent-encoded on its own, so a `/`,
    /// `?` or `#` inside an id stays part of that segment.
    pub fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        params: &[(&str, String)],
    ) -> Result<T> {
        let url = self.endpoint(segments)?;
        debug!(%url, ?params, "GET");

        let resp = self.http.get(url).query(params).send()?;

        let status = resp.status();
        let final_url = resp.url().to_string();
        let text = resp.text()?;
        if !status.is_success() {
            warn!(status = status.as_u16(), url = %final_url, "API request failed");
            return Err(Error::Api {
                status: status.as_u16(),
                url: final_url,
                body: text,
            });
        }

        serde_json::from_str::<T>(&text).map_err(|source| Error::Decode {
            url: final_url,
            source,
        })
    }
}

impl Client {
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let invalid = |reason: String| Error::Config {
            message: format!("invalid base url {}: {}", self.url, reason),
        };
        let mut url = Url::parse(&self.url).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

impl PageSource for Client {
    fn fetch_page(&self, query: &Query) -> Result<Page> {
        Client::fetch_page(self, query)
    }
}

fn spinner(collection: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {prefix} {msg} ({elapsed})")
    {
        pb.set_style(style);
    }
    pb.set_prefix(collection.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(url: &str) -> Client {
        Client::new(Some(url.into()), Some(true)).unwrap()
    }

    #[test]
    fn endpoint_encodes_each_segment() {
        let url = client("http://localhost:8000")
            .endpoint(&["nmdcschema", "study_set", "nmdc:a/b?c#d"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/nmdcschema/study_set/nmdc:a%2Fb%3Fc%23d"
        );
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let url = client("https://example.test/api/")
            .endpoint(&["nmdcschema", "ids", "x y", "collection-name"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.test/api/nmdcschema/ids/x%20y/collection-name"
        );
    }
}
