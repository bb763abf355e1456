use std::path::PathBuf;
use tracing::{debug, info};

use crate::error::Result;
use crate::models::{CheckReport, CheckedWorkaround};
use crate::resolver::ResolutionCoordinator;
use crate::scan::ScanCoordinator;

/// Scan every path and resolve each workaround as it is found.
///
/// Stops at the first error. The scan cache inside `scanner` holds every file
/// visited so far, so the caller can persist it afterwards.
pub fn check_paths(
    scanner: &mut ScanCoordinator,
    resolver: &mut ResolutionCoordinator,
    paths: &[PathBuf],
) -> Result<CheckReport> {
    let mut checked = Vec::new();

    for path in paths {
        for workaround in scanner.scan(path) {
            let workaround = workaround?;
            debug!(file = %workaround.file, line = workaround.line, "checking workaround");

            let redundant = resolver.is_workaround_redundant(&workaround)?;
            if redundant {
                info!(
                    "{} L{} RESOLVED: {}",
                    workaround.file, workaround.line, workaround.url
                );
            }
            checked.push(CheckedWorkaround {
                workaround,
                redundant,
            });
        }
    }

    Ok(CheckReport::new(checked, paths.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::{GitlabIssueChecker, IssueChecker};
    use crate::error::Error;
    use crate::models::{EXIT_CODE_REDUNDANT_WORKAROUNDS, NormalizedPath, ScannerKind};
    use mockito::Server;
    use std::fs;
    use tempfile::TempDir;

    fn gitlab_resolver(server: &Server) -> ResolutionCoordinator {
        let checker: Box<dyn IssueChecker> =
            Box::new(GitlabIssueChecker::new(&server.url(), "gl_token").unwrap());
        ResolutionCoordinator::new(vec![checker])
    }

    fn mock_state(server: &mut Server, issue: u32, state: &str) -> mockito::Mock {
        server
            .mock("GET", format!("/api/v4/projects/group%2Fproj/issues/{}", issue).as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(r#"{{"state":"{}"}}"#, state))
            .create()
    }

    #[test]
    fn test_redundant_workaround_is_reported() {
        let mut server = Server::new();
        let closed = mock_state(&mut server, 1, "closed");
        let open = mock_state(&mut server, 2, "opened");

        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(
            root.join("a.py"),
            format!("import os\n# WORKAROUND: {}/group/proj/-/issues/1\n", server.url()),
        )
        .unwrap();
        fs::write(
            root.join("b.py"),
            format!("# WORKAROUND: {}/group/proj/-/issues/2\n", server.url()),
        )
        .unwrap();

        let mut scanner = ScanCoordinator::from_kinds(&[ScannerKind::Python], None).unwrap();
        let mut resolver = gitlab_resolver(&server);
        let report = check_paths(&mut scanner, &mut resolver, &[root.to_path_buf()]).unwrap();

        assert_eq!(report.total_count, 2);
        assert_eq!(report.redundant_count, 1);
        let redundant: Vec<_> = report.redundant().collect();
        assert_eq!(redundant[0].file, NormalizedPath::new(&root.join("a.py")));
        assert_eq!(redundant[0].line, 2);
        assert_eq!(report.exit_code(), EXIT_CODE_REDUNDANT_WORKAROUNDS);
        assert_eq!(scanner.cache().len(), 2);
        closed.assert();
        open.assert();
    }

    #[test]
    fn test_no_workarounds() {
        let server = Server::new();
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.py"), "print('hi')\n").unwrap();

        let mut scanner = ScanCoordinator::from_kinds(&[ScannerKind::Python], None).unwrap();
        let mut resolver = gitlab_resolver(&server);
        let report =
            check_paths(&mut scanner, &mut resolver, &[temp_dir.path().to_path_buf()]).unwrap();

        assert_eq!(report.total_count, 0);
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_unknown_host_aborts() {
        let server = Server::new();
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("a.py"),
            "# WORKAROUND: https://bugs.example.org/show_bug.cgi?id=1\n",
        )
        .unwrap();

        let mut scanner = ScanCoordinator::from_kinds(&[ScannerKind::Python], None).unwrap();
        let mut resolver = gitlab_resolver(&server);
        let err = check_paths(&mut scanner, &mut resolver, &[temp_dir.path().to_path_buf()])
            .unwrap_err();

        assert!(matches!(err, Error::UnknownResolution { .. }));
    }
}
