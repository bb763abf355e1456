use lru::LruCache;
use std::num::NonZeroUsize;
use tracing::debug;

use crate::checker::{GithubIssueChecker, GitlabIssueChecker, IssueChecker, IssueStatus};
use crate::error::{Error, Result};
use crate::models::{IssueTrackerConfig, TrackerKind, Workaround};

/// Number of memoized verdicts kept per run
pub const DEFAULT_MEMO_CAPACITY: usize = 64;

const IS_WORKAROUND_REDUNDANT: &str = "is_workaround_redundant";

type MemoKey = (String, &'static str);

/// Decides whether workarounds are redundant by asking each configured
/// issue checker in turn. Verdicts are memoized per URL.
#[derive(Debug)]
pub struct ResolutionCoordinator {
    checkers: Vec<Box<dyn IssueChecker>>,
    memo: LruCache<MemoKey, bool>,
}

impl ResolutionCoordinator {
    pub fn new(checkers: Vec<Box<dyn IssueChecker>>) -> Self {
        let capacity = NonZeroUsize::new(DEFAULT_MEMO_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Self::with_capacity(checkers, capacity)
    }

    pub fn with_capacity(checkers: Vec<Box<dyn IssueChecker>>, capacity: NonZeroUsize) -> Self {
        Self {
            checkers,
            memo: LruCache::new(capacity),
        }
    }

    /// Build one checker per configured tracker, reading tokens from the environment
    pub fn from_config(configs: &[IssueTrackerConfig]) -> Result<Self> {
        Self::from_config_with(configs, |name| std::env::var(name).ok())
    }

    /// Like [`Self::from_config`] with an explicit credential lookup
    pub fn from_config_with<F>(configs: &[IssueTrackerConfig], lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut checkers: Vec<Box<dyn IssueChecker>> = Vec::with_capacity(configs.len());
        for config in configs {
            config.validate()?;
            let env = &config.authentication.env;
            let token = lookup(env).ok_or_else(|| Error::MissingCredential { env: env.clone() })?;
            let base_url = config.base_url();
            debug!(kind = ?config.kind, %base_url, "registering issue tracker");

            let checker: Box<dyn IssueChecker> = match config.kind {
                TrackerKind::Github => Box::new(GithubIssueChecker::new(&base_url, &token)?),
                TrackerKind::Gitlab => Box::new(GitlabIssueChecker::new(&base_url, &token)?),
            };
            checkers.push(checker);
        }
        Ok(Self::new(checkers))
    }

    pub fn checker_count(&self) -> usize {
        self.checkers.len()
    }

    /// Whether the issue behind `workaround` is closed.
    ///
    /// Checkers are asked in registration order and the first one that
    /// recognizes the URL decides. Fails with [`Error::UnknownResolution`] when
    /// none does. Checker errors are returned as-is and not memoized.
    pub fn is_workaround_redundant(&mut self, workaround: &Workaround) -> Result<bool> {
        let key: MemoKey = (workaround.url.clone(), IS_WORKAROUND_REDUNDANT);
        if let Some(&redundant) = self.memo.get(&key) {
            debug!(url = %workaround.url, redundant, "memoized verdict");
            return Ok(redundant);
        }

        debug!(
            file = %workaround.file,
            line = workaround.line,
            "checking whether workaround is resolved"
        );
        for checker in &self.checkers {
            let redundant = match checker.is_issue_resolved(&workaround.url)? {
                IssueStatus::Resolved => true,
                IssueStatus::Unresolved => false,
                IssueStatus::NotApplicable => {
                    debug!(url = %workaround.url, "checker does not handle this url");
                    continue;
                }
            };
            debug!(url = %workaround.url, redundant, "resolved");
            self.memo.put(key, redundant);
            return Ok(redundant);
        }

        Err(Error::UnknownResolution {
            url: workaround.url.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AuthenticationConfig;
    use std::sync::{Arc, Mutex};

    const URL: &str = "https://mock.github/org/proj/issues/1234";

    #[derive(Debug)]
    struct FixedChecker {
        status: IssueStatus,
        calls: Arc<Mutex<Vec<String>>>,
    }

    fn fixed(status: IssueStatus) -> (Box<dyn IssueChecker>, Arc<Mutex<Vec<String>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        (
            Box::new(FixedChecker {
                status,
                calls: calls.clone(),
            }),
            calls,
        )
    }

    impl IssueChecker for FixedChecker {
        fn is_issue_resolved(&self, url: &str) -> Result<IssueStatus> {
            self.calls.lock().unwrap().push(url.to_string());
            Ok(self.status)
        }
    }

    #[derive(Debug)]
    struct FailingChecker;

    impl IssueChecker for FailingChecker {
        fn is_issue_resolved(&self, url: &str) -> Result<IssueStatus> {
            Err(Error::InvalidUrl {
                url: url.to_string(),
                reason: "boom".to_string(),
            })
        }
    }

    fn workaround(url: &str) -> Workaround {
        Workaround::new("file", 47, url)
    }

    fn tracker(kind: TrackerKind, host: &str, env: &str) -> IssueTrackerConfig {
        IssueTrackerConfig {
            kind,
            host: Some(host.to_string()),
            scheme: "https".to_string(),
            authentication: AuthenticationConfig {
                env: env.to_string(),
            },
        }
    }

    #[test]
    fn test_first_applicable_checker_wins() {
        let (none, none_calls) = fixed(IssueStatus::NotApplicable);
        let (yes, yes_calls) = fixed(IssueStatus::Resolved);
        let (no, no_calls) = fixed(IssueStatus::Unresolved);
        let mut resolver = ResolutionCoordinator::new(vec![none, yes, no]);

        assert!(resolver.is_workaround_redundant(&workaround(URL)).unwrap());
        assert_eq!(*none_calls.lock().unwrap(), vec![URL.to_string()]);
        assert_eq!(*yes_calls.lock().unwrap(), vec![URL.to_string()]);
        assert!(no_calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_unresolved_issue() {
        let (no, _) = fixed(IssueStatus::Unresolved);
        let mut resolver = ResolutionCoordinator::new(vec![no]);
        assert!(!resolver.is_workaround_redundant(&workaround(URL)).unwrap());
    }

    #[test]
    fn test_no_checkers() {
        let mut resolver = ResolutionCoordinator::new(vec![]);
        let err = resolver.is_workaround_redundant(&workaround(URL)).unwrap_err();
        assert!(matches!(err, Error::UnknownResolution { ref url } if url == URL));
    }

    #[test]
    fn test_no_applicable_checker() {
        let (none, calls) = fixed(IssueStatus::NotApplicable);
        let mut resolver = ResolutionCoordinator::new(vec![none]);

        let err = resolver.is_workaround_redundant(&workaround(URL)).unwrap_err();
        assert!(matches!(err, Error::UnknownResolution { .. }));
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_verdicts_are_memoized_by_url() {
        let (yes, calls) = fixed(IssueStatus::Resolved);
        let mut resolver = ResolutionCoordinator::new(vec![yes]);

        assert!(resolver.is_workaround_redundant(&workaround(URL)).unwrap());
        let elsewhere = Workaround::new("other.py", 3, URL);
        assert!(resolver.is_workaround_redundant(&elsewhere).unwrap());
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_least_recently_used_verdict_is_evicted() {
        let (yes, calls) = fixed(IssueStatus::Resolved);
        let mut resolver =
            ResolutionCoordinator::with_capacity(vec![yes], NonZeroUsize::new(2).unwrap());

        let urls = ["http://t/1", "http://t/2", "http://t/1", "http://t/3", "http://t/1", "http://t/2"];
        for url in urls {
            resolver.is_workaround_redundant(&workaround(url)).unwrap();
        }
        assert_eq!(
            *calls.lock().unwrap(),
            vec!["http://t/1", "http://t/2", "http://t/3", "http://t/2"]
        );
    }

    #[test]
    fn test_checker_errors_propagate() {
        let (yes, calls) = fixed(IssueStatus::Resolved);
        let failing: Box<dyn IssueChecker> = Box::new(FailingChecker);
        let mut resolver = ResolutionCoordinator::new(vec![failing, yes]);

        let err = resolver.is_workaround_redundant(&workaround(URL)).unwrap_err();
        assert!(matches!(err, Error::InvalidUrl { .. }));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_from_config() {
        let configs = [
            tracker(TrackerKind::Github, "mock.github", "GITHUB_AUTH_TOKEN"),
            tracker(TrackerKind::Gitlab, "mock.gitlab", "GITLAB_AUTH_TOKEN"),
        ];
        let resolver = ResolutionCoordinator::from_config_with(&configs, |name| match name {
            "GITHUB_AUTH_TOKEN" => Some("gh_token".to_string()),
            "GITLAB_AUTH_TOKEN" => Some("gl_token".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(resolver.checker_count(), 2);
    }

    #[test]
    fn test_from_config_requires_credentials() {
        let configs = [tracker(TrackerKind::Github, "mock.github", "UNSET_TOKEN_VAR")];
        let err = ResolutionCoordinator::from_config_with(&configs, |_| None).unwrap_err();
        assert!(matches!(err, Error::MissingCredential { ref env } if env == "UNSET_TOKEN_VAR"));
    }

    #[test]
    fn test_from_config_rejects_bad_host() {
        let configs = [tracker(TrackerKind::Gitlab, "gitlab.com/group", "TOKEN")];
        let err = ResolutionCoordinator::from_config_with(&configs, |_| Some("t".to_string()))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidHost { .. }));
    }
}
