use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use tracing::debug;
use url::Url;

use super::{
    IssueChecker, IssueStatus, build_client, credential_header, fetch_issue_status,
    matching_issue_url, split_base_url,
};
use crate::error::Result;

pub const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";

/// Checks issues on github.com or a GitHub-style instance.
///
/// `https://<host>/<org>/<repo>/issues/<n>` is looked up at
/// `https://api.<host>/repos/<org>/<repo>/issues/<n>`.
#[derive(Debug)]
pub struct GithubIssueChecker {
    base_url: String,
    scheme: String,
    netloc: String,
    api_url: Option<String>,
    headers: HeaderMap,
    client: OnceCell<Client>,
}

impl GithubIssueChecker {
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        let (scheme, netloc) = split_base_url(base_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_MEDIA_TYPE));
        let (name, value) =
            credential_header(AUTHORIZATION, &format!("Bearer {}", token), base_url)?;
        headers.insert(name, value);

        Ok(Self {
            base_url: base_url.to_string(),
            scheme,
            netloc,
            api_url: None,
            headers,
            client: OnceCell::new(),
        })
    }

    /// Send API requests to `api_url` instead of `api.<host>`
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = Some(api_url.into());
        self
    }

    fn issue_api_url(&self, issue: &Url) -> String {
        match &self.api_url {
            Some(root) => format!("{}/repos{}", root.trim_end_matches('/'), issue.path()),
            None => format!("{}://api.{}/repos{}", self.scheme, self.netloc, issue.path()),
        }
    }

    fn client(&self) -> Result<&Client> {
        self.client
            .get_or_try_init(|| build_client(&self.headers, &self.base_url))
    }
}

impl IssueChecker for GithubIssueChecker {
    fn is_issue_resolved(&self, url: &str) -> Result<IssueStatus> {
        debug!(url, tracker = %self.base_url, "checking github issue");
        let Some(issue) = matching_issue_url(url, &self.netloc) else {
            return Ok(IssueStatus::NotApplicable);
        };

        let status = fetch_issue_status(self.client()?, &self.issue_api_url(&issue))?;
        debug!(url, ?status, "github issue status");
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use mockito::Server;

    const TOKEN: &str = "gh_token";
    const ISSUE_URL: &str = "https://mock.github/org/proj/issues/1234";
    const API_PATH: &str = "/repos/org/proj/issues/1234";

    fn checker_for(server: &Server) -> GithubIssueChecker {
        GithubIssueChecker::new("https://mock.github", TOKEN)
            .unwrap()
            .with_api_url(server.url())
    }

    fn mock_issue(server: &mut Server, status: usize, body: &str) -> mockito::Mock {
        server
            .mock("GET", API_PATH)
            .match_header("accept", GITHUB_MEDIA_TYPE)
            .match_header("authorization", "Bearer gh_token")
            .with_status(status)
            .with_header("content-type", GITHUB_MEDIA_TYPE)
            .with_body(body)
            .create()
    }

    #[test]
    fn test_api_url() {
        let checker = GithubIssueChecker::new("https://mock.github", TOKEN).unwrap();
        let issue = Url::parse(ISSUE_URL).unwrap();
        assert_eq!(
            checker.issue_api_url(&issue),
            "https://api.mock.github/repos/org/proj/issues/1234"
        );

        let checker = checker.with_api_url("http://localhost:9000/");
        assert_eq!(
            checker.issue_api_url(&issue),
            "http://localhost:9000/repos/org/proj/issues/1234"
        );
    }

    #[test]
    fn test_closed_issue_is_resolved() {
        let mut server = Server::new();
        let mock = mock_issue(&mut server, 200, r#"{"state":"closed"}"#);

        let status = checker_for(&server).is_issue_resolved(ISSUE_URL).unwrap();
        assert_eq!(status, IssueStatus::Resolved);
        mock.assert();
    }

    #[test]
    fn test_open_issue_is_unresolved() {
        let mut server = Server::new();
        let mock = mock_issue(&mut server, 200, r#"{"state":"open"}"#);

        let status = checker_for(&server).is_issue_resolved(ISSUE_URL).unwrap();
        assert_eq!(status, IssueStatus::Unresolved);
        mock.assert();
    }

    #[test]
    fn test_other_host_is_not_applicable() {
        let checker = GithubIssueChecker::new("https://mock.github", TOKEN).unwrap();
        let status = checker
            .is_issue_resolved("https://some.github/org/proj/issues/1234")
            .unwrap();
        assert_eq!(status, IssueStatus::NotApplicable);
    }

    #[test]
    fn test_server_error_propagates() {
        let mut server = Server::new();
        let _mock = mock_issue(&mut server, 500, "");

        let err = checker_for(&server).is_issue_resolved(ISSUE_URL).unwrap_err();
        assert!(matches!(err, Error::Http { .. }));
    }

    #[test]
    fn test_client_is_reused() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", API_PATH)
            .with_status(200)
            .with_body(r#"{"state":"open"}"#)
            .expect(2)
            .create();

        let checker = checker_for(&server);
        checker.is_issue_resolved(ISSUE_URL).unwrap();
        let first = checker.client().unwrap() as *const Client;
        checker.is_issue_resolved(ISSUE_URL).unwrap();
        assert_eq!(first, checker.client().unwrap() as *const Client);
        mock.assert();
    }
}
