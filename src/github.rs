use crate::config::GitHubConfig;
use crate::error::GitHubError;
use crate::pagination::{fetch_all, next_link, Page, PageSource};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LINK};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

pub const ACCEPT_HEADER: &str = "application/vnd.github.v3+json";

/// GitHub account as returned by the followers/following listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub login: String,
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub html_url: Option<String>,
}

/// Personal access token. Never printed, never logged.
#[derive(Clone)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    fn expose(&self) -> &str {
        self.0.trim()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// The follow relationships of a subject account
#[allow(async_fn_in_trait)] // Internal trait for dependency injection in tests
pub trait FollowGraph {
    /// Every account `subject` follows, across all pages.
    async fn following(&self, subject: &str) -> Result<Vec<Account>, GitHubError>;
    /// Every account following `subject`, across all pages.
    async fn followers(&self, subject: &str) -> Result<Vec<Account>, GitHubError>;
    /// Remove the authenticated user's follow edge to `handle`. Succeeds only on 204.
    async fn unfollow(&self, handle: &str) -> Result<(), GitHubError>;
}

/// GitHub REST client
pub struct GitHubClient {
    config: GitHubConfig,
    http_client: reqwest::Client,
}

impl GitHubClient {
    pub fn new(config: GitHubConfig, credential: Credential) -> Result<Self, GitHubError> {
        let mut authorization = HeaderValue::from_str(&format!("Bearer {}", credential.expose()))
            .map_err(|_| {
                GitHubError::Transport(
                    "Token contains characters that are not allowed in an HTTP header".to_string(),
                )
            })?;
        authorization.set_sensitive(true);

        // Auth and media type ride on every request
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization);
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HEADER));

        let mut builder = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers);
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let http_client = builder
            .build()
            .map_err(|e| GitHubError::Transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Build `<api_url>/<segments...>` with each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, GitHubError> {
        let mut url = Url::parse(&self.config.api_url)
            .map_err(|e| GitHubError::Transport(format!("Invalid API URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| GitHubError::Transport("API URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Refuse URLs outside the configured API origin. The token is attached to
    /// every request, so a `Link` header must not redirect it elsewhere.
    fn check_origin(&self, url: &str) -> Result<(), GitHubError> {
        let api = Url::parse(&self.config.api_url)
            .map_err(|e| GitHubError::Transport(format!("Invalid API URL: {e}")))?;
        let target = Url::parse(url)
            .map_err(|e| GitHubError::Transport(format!("Invalid page URL {url}: {e}")))?;

        if target.origin() != api.origin() {
            warn!("Refusing to follow {} outside {}", url, self.config.api_url);
            return Err(GitHubError::Transport(format!(
                "Page URL {url} is outside the configured API origin"
            )));
        }
        Ok(())
    }

    fn listing_url(&self, subject: &str, relation: &str) -> Result<Url, GitHubError> {
        let mut url = self.endpoint(&["users", subject, relation])?;
        url.query_pairs_mut()
            .append_pair("per_page", &self.config.per_page.to_string());
        Ok(url)
    }
}

impl PageSource<Account> for GitHubClient {
    async fn fetch_page(&self, url: &str) -> Result<Page<Account>, GitHubError> {
        self.check_origin(url)?;
        debug!("GET {}", url);

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| GitHubError::Transport(format!("Failed to fetch {url}: {e}")))?;

        // Map non-success statuses, noting an exhausted rate limit
        let status = response.status();
        if !status.is_success() {
            let rate_limit_exhausted = response
                .headers()
                .get("x-ratelimit-remaining")
                .and_then(|v| v.to_str().ok())
                == Some("0");
            let body = response.text().await.unwrap_or_default();
            let error = match GitHubError::from_status(status.as_u16(), &body) {
                GitHubError::Forbidden(message) if rate_limit_exhausted => {
                    GitHubError::Forbidden(format!("{message} (rate limit exhausted)"))
                }
                other => other,
            };
            warn!("Page request to {} failed: {}", url, error);
            return Err(error);
        }

        // Continuation from the Link header
        let next = response
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(next_link);

        let items: Vec<Account> = response.json().await.map_err(|e| {
            GitHubError::Transport(format!("Failed to parse account list from {url}: {e}"))
        })?;

        Ok(Page { items, next })
    }
}

impl FollowGraph for GitHubClient {
    async fn following(&self, subject: &str) -> Result<Vec<Account>, GitHubError> {
        let url = self.listing_url(subject, "following")?;
        fetch_all(self, url.as_str()).await
    }

    async fn followers(&self, subject: &str) -> Result<Vec<Account>, GitHubError> {
        let url = self.listing_url(subject, "followers")?;
        fetch_all(self, url.as_str()).await
    }

    async fn unfollow(&self, handle: &str) -> Result<(), GitHubError> {
        let url = self.endpoint(&["user", "following", handle])?;
        debug!("DELETE {}", url);

        let response = self
            .http_client
            .delete(url)
            .send()
            .await
            .map_err(|e| GitHubError::Transport(format!("Failed to unfollow {handle}: {e}")))?;

        // Only 204 confirms the edge was removed
        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            info!("Unfollowed {}", handle);
            return Ok(());
        }

        if status.is_success() {
            return Err(GitHubError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        let body = response.text().await.unwrap_or_default();
        Err(GitHubError::from_status(status.as_u16(), &body))
    }
}
