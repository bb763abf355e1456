use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};
use crate::scanner::{PythonScanner, RustScanner, Scanner, ShellScanner};

/// Process exit code when at least one workaround is redundant
pub const EXIT_CODE_REDUNDANT_WORKAROUNDS: u8 = 3;

/// A file path rendered with `/` separators on every platform, without `.`
/// components.
///
/// Used as the scan cache key and stored in every [`Workaround`], so a cache
/// written on one platform stays comparable on another.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedPath(String);

impl NormalizedPath {
    pub fn new(path: &Path) -> Self {
        let mut rendered = String::new();
        for component in path.components() {
            match component {
                Component::CurDir => {}
                Component::Prefix(prefix) => {
                    rendered.push_str(&prefix.as_os_str().to_string_lossy())
                }
                Component::RootDir => rendered.push('/'),
                Component::ParentDir => push_segment(&mut rendered, ".."),
                Component::Normal(part) => push_segment(&mut rendered, &part.to_string_lossy()),
            }
        }
        if rendered.is_empty() {
            rendered.push('.');
        }
        Self(rendered)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_path_buf(&self) -> PathBuf {
        PathBuf::from(&self.0)
    }
}

fn push_segment(rendered: &mut String, segment: &str) {
    if !rendered.is_empty() && !rendered.ends_with('/') {
        rendered.push('/');
    }
    rendered.push_str(segment);
}

impl From<&Path> for NormalizedPath {
    fn from(path: &Path) -> Self {
        Self::new(path)
    }
}

impl From<&str> for NormalizedPath {
    fn from(path: &str) -> Self {
        Self::new(Path::new(path))
    }
}

impl fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A workaround comment found in source code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workaround {
    /// File containing the marker comment
    pub file: NormalizedPath,

    /// Line of the marker comment (1-indexed)
    pub line: usize,

    /// Issue the workaround is waiting on
    pub url: String,
}

impl Workaround {
    pub fn new(file: impl Into<NormalizedPath>, line: usize, url: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line,
            url: url.into(),
        }
    }
}

/// A workaround together with the verdict on its issue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckedWorkaround {
    #[serde(flatten)]
    pub workaround: Workaround,

    /// Whether the referenced issue is closed
    pub redundant: bool,
}

/// Outcome of checking one or more source paths
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckReport {
    /// Every workaround found, in scan order
    pub workarounds: Vec<CheckedWorkaround>,

    /// Total number of workarounds
    pub total_count: usize,

    /// Number of workarounds whose issue is closed
    pub redundant_count: usize,

    /// Count of workarounds by file
    pub by_file: BTreeMap<NormalizedPath, usize>,

    /// Paths that were scanned
    pub scan_paths: Vec<PathBuf>,

    /// When the check was performed
    pub check_time: DateTime<Utc>,
}

impl CheckReport {
    pub fn new(workarounds: Vec<CheckedWorkaround>, scan_paths: Vec<PathBuf>) -> Self {
        let total_count = workarounds.len();
        let redundant_count = workarounds.iter().filter(|w| w.redundant).count();

        let mut by_file: BTreeMap<NormalizedPath, usize> = BTreeMap::new();
        for checked in &workarounds {
            *by_file.entry(checked.workaround.file.clone()).or_insert(0) += 1;
        }

        Self {
            workarounds,
            total_count,
            redundant_count,
            by_file,
            scan_paths,
            check_time: Utc::now(),
        }
    }

    pub fn has_redundant(&self) -> bool {
        self.redundant_count > 0
    }

    /// Workarounds whose issue is already closed
    pub fn redundant(&self) -> impl Iterator<Item = &Workaround> {
        self.workarounds
            .iter()
            .filter(|w| w.redundant)
            .map(|w| &w.workaround)
    }

    pub fn exit_code(&self) -> u8 {
        if self.has_redundant() {
            EXIT_CODE_REDUNDANT_WORKAROUNDS
        } else {
            0
        }
    }
}

/// Source languages with a workaround scanner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScannerKind {
    Python,
    Rust,
    Shell,
}

impl ScannerKind {
    pub fn build(self) -> Box<dyn Scanner> {
        match self {
            ScannerKind::Python => Box::new(PythonScanner),
            ScannerKind::Rust => Box::new(RustScanner),
            ScannerKind::Shell => Box::new(ShellScanner),
        }
    }
}

/// Issue tracker platform families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackerKind {
    Github,
    Gitlab,
}

impl TrackerKind {
    pub fn default_host(self) -> &'static str {
        match self {
            TrackerKind::Github => "github.com",
            TrackerKind::Gitlab => "gitlab.com",
        }
    }
}

/// Where to find the credential for an issue tracker
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AuthenticationConfig {
    /// Environment variable holding the token
    pub env: String,
}

/// A single issue tracker instance, e.g. github.com or a self-hosted GitLab
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct IssueTrackerConfig {
    pub kind: TrackerKind,

    /// Host name (and optional port); defaults to the public instance for `kind`
    #[serde(default)]
    pub host: Option<String>,

    #[serde(default = "default_scheme")]
    pub scheme: String,

    pub authentication: AuthenticationConfig,
}

impl IssueTrackerConfig {
    pub fn host(&self) -> &str {
        self.host
            .as_deref()
            .unwrap_or_else(|| self.kind.default_host())
    }

    /// Base URL the checker for this tracker is built from
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme, self.host())
    }

    pub fn validate(&self) -> Result<()> {
        let host = self.host();
        if host.is_empty() || host.contains('/') {
            return Err(Error::InvalidHost {
                host: host.to_string(),
            });
        }
        Ok(())
    }
}

/// Configuration for workaround-tracker
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Scanners to run, by source language
    #[serde(default = "default_scanners")]
    pub scanners: Vec<ScannerKind>,

    /// Issue trackers to consult, in order
    #[serde(default)]
    pub issue_trackers: Vec<IssueTrackerConfig>,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        self.issue_trackers
            .iter()
            .try_for_each(IssueTrackerConfig::validate)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scanners: default_scanners(),
            issue_trackers: Vec::new(),
        }
    }
}

fn default_scanners() -> Vec<ScannerKind> {
    vec![ScannerKind::Python]
}

fn default_scheme() -> String {
    "https".to_string()
}
