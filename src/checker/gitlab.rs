use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName};
use tracing::debug;
use url::Url;

use super::{
    IssueChecker, IssueStatus, build_client, credential_header, fetch_issue_status,
    matching_issue_url, split_base_url,
};
use crate::error::{Error, Result};

const PRIVATE_TOKEN: &str = "private-token";

/// Checks issues on gitlab.com or a self-hosted GitLab.
///
/// Both `/<project>/-/issues/<n>` and `/<project>/issues/<n>` are looked up at
/// `/api/v4/projects/<url-encoded project>/issues/<n>` on the same host.
#[derive(Debug)]
pub struct GitlabIssueChecker {
    base_url: String,
    scheme: String,
    netloc: String,
    headers: HeaderMap,
    client: OnceCell<Client>,
}

impl GitlabIssueChecker {
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        let (scheme, netloc) = split_base_url(base_url)?;

        let mut headers = HeaderMap::new();
        let (name, value) =
            credential_header(HeaderName::from_static(PRIVATE_TOKEN), token, base_url)?;
        headers.insert(name, value);

        Ok(Self {
            base_url: base_url.to_string(),
            scheme,
            netloc,
            headers,
            client: OnceCell::new(),
        })
    }

    fn issue_api_url(&self, issue: &Url) -> Result<String> {
        let path = issue.path().replace("/-/issues", "/issues");
        let (project, issue_id) = path.rsplit_once("/issues/").ok_or_else(|| Error::InvalidUrl {
            url: issue.to_string(),
            reason: "path has no /issues/ segment".to_string(),
        })?;
        let project = urlencoding::encode(project.trim_start_matches('/'));

        Ok(format!(
            "{}://{}/api/v4/projects/{}/issues/{}",
            self.scheme, self.netloc, project, issue_id
        ))
    }

    fn client(&self) -> Result<&Client> {
        self.client
            .get_or_try_init(|| build_client(&self.headers, &self.base_url))
    }
}

impl IssueChecker for GitlabIssueChecker {
    fn is_issue_resolved(&self, url: &str) -> Result<IssueStatus> {
        debug!(url, tracker = %self.base_url, "checking gitlab issue");
        let Some(issue) = matching_issue_url(url, &self.netloc) else {
            return Ok(IssueStatus::NotApplicable);
        };

        let api_url = self.issue_api_url(&issue)?;
        let status = fetch_issue_status(self.client()?, &api_url)?;
        debug!(url, ?status, "gitlab issue status");
        Ok(status)
    }
}
