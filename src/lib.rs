//! Workaround Tracker - find workarounds that are no longer needed
//!
//! Scans source files for comments of the form
//! `# WORKAROUND: https://github.com/org/project/issues/123` and asks the
//! configured issue trackers whether the referenced issue has been closed.
//!
//! # Features
//!
//! - Python, shell and Rust comment scanners
//! - A per-file scan cache keyed on modification time
//! - GitHub and GitLab issue checkers, including self-hosted instances
//! - Output reports in multiple formats (terminal, markdown, JSON)
//!
//! # Example
//!
//! ```rust,no_run
//! use workaround_tracker::*;
//! use std::path::PathBuf;
//!
//! let config = config::load_config(None).unwrap();
//! let mut scanner = scan::ScanCoordinator::from_kinds(&config.scanners, None).unwrap();
//! let mut resolver = resolver::ResolutionCoordinator::from_config(&config.issue_trackers).unwrap();
//!
//! let report = check::check_paths(&mut scanner, &mut resolver, &[PathBuf::from("src")]).unwrap();
//! std::process::exit(report.exit_code().into());
//! ```

pub mod cache;
pub mod check;
pub mod checker;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod reporter;
pub mod resolver;
pub mod scan;
pub mod scanner;

// Re-export commonly used types
pub use error::{Error, Result};
pub use models::{CheckReport, Config, Workaround};
