use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures that stop the conversion of an issue.
#[derive(Debug, Error)]
pub enum Issue2PostError {
    #[error("Issue input missing: {0}")]
    MissingIssue(String),

    #[error("Failed to parse issue: {0}")]
    MalformedIssue(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Error writing {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Error serializing frontmatter: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Issue2PostError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Issue2PostError::Io { path: path.into(), source }
    }

    /// Process exit status for this kind of failure
    pub fn exit_code(&self) -> u8 {
        match self {
            Issue2PostError::MissingIssue(_) => 2,
            Issue2PostError::MalformedIssue(_) => 3,
            Issue2PostError::Config(_) => 4,
            Issue2PostError::Io { .. } | Issue2PostError::Yaml(_) => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Issue2PostError>;

/// The YAML block at the top of an issue body could not be used.
#[derive(Debug, Error)]
pub enum FrontmatterError {
    #[error("{0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("frontmatter must be a mapping")]
    NotAMapping,
}

/// A single image could not be retrieved.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {0}")]
    Status(u16),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct() {
        let missing = Issue2PostError::MissingIssue("ISSUE_JSON not set".to_string());
        let malformed = Issue2PostError::MalformedIssue("eof".to_string());
        let config = Issue2PostError::Config("bad".to_string());
        let write = Issue2PostError::io("posts", io::Error::new(io::ErrorKind::Other, "disk"));

        let codes = [missing.exit_code(), malformed.exit_code(), config.exit_code(), write.exit_code()];
        assert_eq!(codes, [2, 3, 4, 1]);
        assert_eq!(missing.to_string(), "Issue input missing: ISSUE_JSON not set");
    }
}
