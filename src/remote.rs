//! Remote content client: listing and raw-content access for one repository.
//!
//! The [`ContentFetcher`] trait is the capability boundary between the tree
//! walker and the network. [`GithubClient`] is the production implementation
//! over the GitHub contents API; tests plug in fakes or the generated
//! `mockall` mock instead.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::content::ContentNode;

const API_BASE: &str = "https://api.github.com";
const RAW_BASE: &str = "https://raw.githubusercontent.com";

/// Identifies one GitHub repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubRepo {
    pub owner: String,
    pub repo: String,
}

impl std::fmt::Display for GithubRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Failure of a single listing or download request. Any variant aborts the
/// enclosing fetch operation; nothing is retried here.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("unexpected listing shape from {url}: {source}")]
    Schema {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("remote listing repeated path {path}")]
    DuplicatePath { path: String },
}

/// Trait for fetching remote directory listings and raw file content.
/// Implemented by the real GitHub client and by fakes/mocks in tests.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// List the entries of one remote directory at the given ref
    /// (the remote's default branch when `None`).
    async fn list_dir<'a>(
        &'a self,
        path: &'a str,
        reference: Option<&'a str>,
    ) -> Result<Vec<ContentNode>, FetchError>;

    /// Fetch the raw bytes of one remote file at the given ref.
    async fn fetch_raw<'a>(
        &'a self,
        path: &'a str,
        reference: Option<&'a str>,
    ) -> Result<Vec<u8>, FetchError>;
}

/// GitHub-backed [`ContentFetcher`]. One `reqwest::Client` session is shared
/// across every concurrent request of a fetch operation; construct it once
/// with [`GithubClient::http_client`] and clone the handle per repository.
pub struct GithubClient {
    http: reqwest::Client,
    repo: GithubRepo,
    token: Option<String>,
}

impl GithubClient {
    pub fn new(http: reqwest::Client, repo: GithubRepo, token: Option<String>) -> Self {
        Self { http, repo, token }
    }

    /// The shared HTTP session. GitHub rejects requests without a user agent.
    pub fn http_client() -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .user_agent(concat!("proto-mirror/", env!("CARGO_PKG_VERSION")))
            .build()
    }

    fn list_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            API_BASE, self.repo.owner, self.repo.repo, path
        )
    }

    fn raw_url(&self, path: &str, reference: Option<&str>) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            RAW_BASE,
            self.repo.owner,
            self.repo.repo,
            reference.unwrap_or("HEAD"),
            path
        )
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        let request = self.http.get(url);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl ContentFetcher for GithubClient {
    async fn list_dir<'a>(
        &'a self,
        path: &'a str,
        reference: Option<&'a str>,
    ) -> Result<Vec<ContentNode>, FetchError> {
        let url = self.list_url(path);
        debug!(url = %url, reference = reference.unwrap_or("<default>"), "Listing remote directory");

        let mut request = self.request(&url);
        if let Some(reference) = reference {
            request = request.query(&[("ref", reference)]);
        }
        let response = request.send().await.map_err(|e| FetchError::Transport {
            url: url.clone(),
            source: e,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { url, status });
        }

        // A file path (or any non-directory response) yields a JSON object
        // instead of an array and fails here as a schema mismatch.
        response
            .json::<Vec<ContentNode>>()
            .await
            .map_err(|e| FetchError::Schema { url, source: e })
    }

    async fn fetch_raw<'a>(
        &'a self,
        path: &'a str,
        reference: Option<&'a str>,
    ) -> Result<Vec<u8>, FetchError> {
        let url = self.raw_url(path, reference);
        debug!(url = %url, "Downloading remote file");

        let response = self
            .request(&url)
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                url: url.clone(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { url, status });
        }

        let bytes = response.bytes().await.map_err(|e| FetchError::Transport {
            url: url.clone(),
            source: e,
        })?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GithubClient {
        GithubClient::new(
            GithubClient::http_client().unwrap(),
            GithubRepo {
                owner: "chirpstack".into(),
                repo: "chirpstack".into(),
            },
            None,
        )
    }

    #[test]
    fn list_url_addresses_contents_api() {
        assert_eq!(
            client().list_url("api/proto"),
            "https://api.github.com/repos/chirpstack/chirpstack/contents/api/proto"
        );
    }

    #[test]
    fn raw_url_pins_reference() {
        assert_eq!(
            client().raw_url("api/proto/a.proto", Some("abc123")),
            "https://raw.githubusercontent.com/chirpstack/chirpstack/abc123/api/proto/a.proto"
        );
    }

    #[test]
    fn raw_url_defaults_to_head() {
        assert_eq!(
            client().raw_url("api/proto/a.proto", None),
            "https://raw.githubusercontent.com/chirpstack/chirpstack/HEAD/api/proto/a.proto"
        );
    }
}
