use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while scanning sources or resolving their issues.
///
/// Every variant is fatal for the current run. The only thing that is silently
/// skipped is a marker line without a URL, which never reaches this type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("no code scanners configured")]
    NoScanners,

    #[error("file suffix '{suffix}' is claimed by more than one scanner")]
    OverlappingScanners { suffix: String },

    #[error("invalid issue tracker host '{host}'")]
    InvalidHost { host: String },

    #[error("environment variable {env} is not set")]
    MissingCredential { env: String },

    #[error("credential for {tracker} is not a valid header value")]
    InvalidCredential { tracker: String },

    #[error("failed to parse cache file {}", path.display())]
    CacheParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse config file {}: {message}", path.display())]
    ConfigParse { path: PathBuf, message: String },

    #[error("I/O error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk source tree")]
    Walk(#[from] ignore::Error),

    #[error("request to {url} failed")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("no issue tracker could determine whether {url} is resolved")]
    UnknownResolution { url: String },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn http(url: impl Into<String>, source: reqwest::Error) -> Self {
        Error::Http {
            url: url.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::io;

    #[test]
    fn test_io_error_keeps_source() {
        let err = Error::io("src/app.py", io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert_eq!(err.to_string(), "I/O error on src/app.py");
        assert_eq!(err.source().unwrap().to_string(), "gone");
    }
}
