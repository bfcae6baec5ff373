use std::env::{self, VarError};
use std::fs;
use std::path::Path;

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;

use crate::error::{Issue2PostError, Result};

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct User {
    pub login: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Label {
    pub name: String,
}

/// An issue as delivered by the GitHub event payload. Only the fields
/// needed for the post are kept.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Issue {
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub created_at: String,
    pub number: u64,
    pub user: User,
    #[serde(default)]
    pub labels: Vec<Label>,
}

impl Issue {
    pub fn from_json(json: &str) -> Result<Issue> {
        let issue: Issue = serde_json::from_str(json)
            .map_err(|e| Issue2PostError::MalformedIssue(e.to_string()))?;
        // Validated once here so later stages can rely on it
        issue.created_date()?;
        Ok(issue)
    }

    pub fn from_env(var_name: &str) -> Result<Issue> {
        match env::var(var_name) {
            Ok(json) if !json.trim().is_empty() => Self::from_json(&json),
            Err(VarError::NotUnicode(_)) => Err(Issue2PostError::MalformedIssue(
                format!("{} environment variable is not valid UTF-8", var_name))),
            _ => Err(Issue2PostError::MissingIssue(format!("{} environment variable not set", var_name))),
        }
    }

    pub fn from_file(path: &Path) -> Result<Issue> {
        let json = fs::read_to_string(path)
            .map_err(|e| Issue2PostError::MissingIssue(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    pub fn created_date(&self) -> Result<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| Issue2PostError::MalformedIssue(format!("invalid created_at {}: {}", self.created_at, e)))
    }

    pub fn body(&self) -> &str {
        self.body.as_deref().unwrap_or("")
    }

    pub fn label_names(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(|label| label.name.as_str())
    }
}
