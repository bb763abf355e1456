//! Issue tracker clients that decide whether a linked issue is closed.

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use std::fmt;
use url::Url;

use crate::error::{Error, Result};

mod github;
mod gitlab;

pub use github::{GITHUB_MEDIA_TYPE, GithubIssueChecker};
pub use gitlab::GitlabIssueChecker;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// What a checker knows about an issue URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueStatus {
    /// The issue is closed
    Resolved,
    /// The issue exists and is not closed
    Unresolved,
    /// The URL belongs to a host this checker does not serve
    NotApplicable,
}

impl IssueStatus {
    fn from_state(state: &str) -> Self {
        if state == "closed" {
            IssueStatus::Resolved
        } else {
            IssueStatus::Unresolved
        }
    }
}

/// A client for one issue tracker instance.
pub trait IssueChecker: fmt::Debug {
    /// Look up the issue behind `url`.
    ///
    /// Returns [`IssueStatus::NotApplicable`] when the URL is on another host.
    /// Transport failures and non-2xx responses are returned as errors.
    fn is_issue_resolved(&self, url: &str) -> Result<IssueStatus>;
}

#[derive(Debug, Deserialize)]
struct IssueResponse {
    state: String,
}

/// Host plus explicit port, e.g. `gitlab.local:8080`
fn netloc(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// Scheme and netloc of a tracker base URL
fn split_base_url(base_url: &str) -> Result<(String, String)> {
    let parsed = Url::parse(base_url).map_err(|e| Error::InvalidUrl {
        url: base_url.to_string(),
        reason: e.to_string(),
    })?;
    let netloc = netloc(&parsed).ok_or_else(|| Error::InvalidUrl {
        url: base_url.to_string(),
        reason: "no host".to_string(),
    })?;
    Ok((parsed.scheme().to_string(), netloc))
}

/// Parse `url` and return it only when it is served by `expected_netloc`
fn matching_issue_url(url: &str, expected_netloc: &str) -> Option<Url> {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::debug!(url, error = %e, "not a parsable url");
            return None;
        }
    };
    let actual = netloc(&parsed);
    if actual.as_deref() != Some(expected_netloc) {
        tracing::debug!(url, ?actual, expected = expected_netloc, "host does not match");
        return None;
    }
    Some(parsed)
}

fn credential_header(
    name: HeaderName,
    value: &str,
    tracker: &str,
) -> Result<(HeaderName, HeaderValue)> {
    let mut value = HeaderValue::from_str(value).map_err(|_| Error::InvalidCredential {
        tracker: tracker.to_string(),
    })?;
    value.set_sensitive(true);
    Ok((name, value))
}

fn build_client(headers: &HeaderMap, base_url: &str) -> Result<Client> {
    Client::builder()
        .default_headers(headers.clone())
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| Error::http(base_url, e))
}

/// GET `api_url` and report whether the issue's state is `closed`
fn fetch_issue_status(client: &Client, api_url: &str) -> Result<IssueStatus> {
    tracing::debug!(api_url, "querying issue tracker");
    let response = client
        .get(api_url)
        .send()
        .and_then(|response| response.error_for_status())
        .map_err(|e| Error::http(api_url, e))?;
    let issue: IssueResponse = response.json().map_err(|e| Error::http(api_url, e))?;
    Ok(IssueStatus::from_state(&issue.state))
}
