use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use std::io::{self, BufRead};
use tracing::debug;

/// Word that follows the comment prefix on a workaround line
pub const WORKAROUND_MARKER: &str = "WORKAROUND";

static URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://\S+").expect("URL pattern is valid"));

/// Lazily produced `(line number, issue url)` pairs, in file order
pub type ScanHits<'a> = Box<dyn Iterator<Item = io::Result<(usize, String)>> + 'a>;

/// Find the first http(s) URL in a piece of text
pub fn find_first_url(text: &str) -> Option<&str> {
    URL_PATTERN.find(text).map(|m| m.as_str())
}

/// Finds workaround comments in one family of source files.
pub trait Scanner: fmt::Debug {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// File extensions (without the dot) this scanner handles
    fn handled_suffixes(&self) -> BTreeSet<String>;

    /// Scan an open file line by line.
    ///
    /// Marker lines without a URL produce nothing.
    fn scan<'a>(&'a self, reader: Box<dyn BufRead + 'a>) -> ScanHits<'a>;
}

/// Yield every line whose trimmed content starts with `comment_prefix` followed
/// by the workaround marker, paired with the first URL on that line.
fn scan_marker_lines<'a>(reader: Box<dyn BufRead + 'a>, comment_prefix: &str) -> ScanHits<'a> {
    let marker = format!("{} {}", comment_prefix, WORKAROUND_MARKER);

    Box::new(
        reader
            .lines()
            .enumerate()
            .filter_map(move |(index, line)| {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => return Some(Err(e)),
                };
                if !line.trim_start().starts_with(&marker) {
                    return None;
                }

                let line_number = index + 1;
                debug!(line = line_number, "found workaround marker");
                match find_first_url(&line) {
                    Some(url) => {
                        debug!(url, "found issue url");
                        Some(Ok((line_number, url.to_string())))
                    }
                    None => {
                        debug!(line = line_number, "workaround marker without url, skipping");
                        None
                    }
                }
            }),
    )
}

fn suffixes(list: &[&str]) -> BTreeSet<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// `# WORKAROUND` comments in Python sources
#[derive(Debug, Default, Clone, Copy)]
pub struct PythonScanner;

impl Scanner for PythonScanner {
    fn name(&self) -> &'static str {
        "python"
    }

    fn handled_suffixes(&self) -> BTreeSet<String> {
        suffixes(&["py"])
    }

    fn scan<'a>(&'a self, reader: Box<dyn BufRead + 'a>) -> ScanHits<'a> {
        scan_marker_lines(reader, "#")
    }
}

/// `// WORKAROUND` comments in Rust sources
#[derive(Debug, Default, Clone, Copy)]
pub struct RustScanner;

impl Scanner for RustScanner {
    fn name(&self) -> &'static str {
        "rust"
    }

    fn handled_suffixes(&self) -> BTreeSet<String> {
        suffixes(&["rs"])
    }

    fn scan<'a>(&'a self, reader: Box<dyn BufRead + 'a>) -> ScanHits<'a> {
        scan_marker_lines(reader, "//")
    }
}

/// `# WORKAROUND` comments in shell scripts
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellScanner;

impl Scanner for ShellScanner {
    fn name(&self) -> &'static str {
        "shell"
    }

    fn handled_suffixes(&self) -> BTreeSet<String> {
        suffixes(&["sh", "bash"])
    }

    fn scan<'a>(&'a self, reader: Box<dyn BufRead + 'a>) -> ScanHits<'a> {
        scan_marker_lines(reader, "#")
    }
}
