//! Link-relation pagination.
//!
//! A collection is walked page by page from a starting URL. Each page may
//! declare at most one continuation; when it does not, the walk ends. The
//! walk is all-or-nothing: a failure on any page discards everything
//! collected so far. A continuation that points back at an already visited
//! page is a failure too.

use crate::error::GitHubError;
use std::collections::HashSet;
use tracing::{debug, warn};

/// One page of a paginated collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
}

/// Anything that can fetch a single page by URL.
#[allow(async_fn_in_trait)]
pub trait PageSource<T> {
    async fn fetch_page(&self, url: &str) -> Result<Page<T>, GitHubError>;
}

/// Fetch every item reachable from `start_url`, in page order.
pub async fn fetch_all<T, S>(source: &S, start_url: &str) -> Result<Vec<T>, GitHubError>
where
    S: PageSource<T>,
{
    let mut items = Vec::new();
    let mut next = Some(start_url.to_string());
    let mut visited = HashSet::new();
    let mut pages = 0usize;

    while let Some(url) = next {
        if !visited.insert(url.clone()) {
            warn!("Pagination loop detected at {}", url);
            return Err(GitHubError::Transport(format!("pagination loop at {url}")));
        }

        let page = source.fetch_page(&url).await?;
        pages += 1;
        debug!(
            "Fetched page {} from {}: {} items, next={}",
            pages,
            url,
            page.items.len(),
            page.next.is_some()
        );
        items.extend(page.items);
        next = page.next;
    }

    Ok(items)
}

/// Extract the `rel="next"` target from an RFC 8288 `Link` header value.
pub fn next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|entry| {
        let mut parts = entry.split(';');
        let target = parts.next()?.trim();
        let target = target.strip_prefix('<')?.strip_suffix('>')?;

        let is_next = parts.any(|param| {
            let Some((key, value)) = param.split_once('=') else {
                return false;
            };
            key.trim().eq_ignore_ascii_case("rel")
                && value
                    .trim()
                    .trim_matches('"')
                    .split_whitespace()
                    .any(|rel| rel.eq_ignore_ascii_case("next"))
        });

        is_next.then(|| target.to_string())
    })
}
