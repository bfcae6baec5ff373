use serde_yaml::{Mapping, Value};
use spdlog::warn;

use crate::error::FrontmatterError;
use crate::issue::Issue;

const DELIMITER: &str = "---";

/// Fields derived from the issue itself that custom frontmatter never replaces
const PROTECTED_FIELDS: [&str; 2] = ["issue", "attached"];

/// Result of looking for a YAML block at the top of an issue body
#[derive(Debug)]
pub enum Split<'a> {
    /// No delimited block, the whole body is content
    Absent,
    Parsed { custom: Mapping, body: &'a str },
    /// A delimited block exists but is not a usable YAML mapping
    Invalid(FrontmatterError),
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end_matches(['\n', '\r']) == DELIMITER
}

fn parse_block(block: &str) -> Result<Mapping, FrontmatterError> {
    if block.trim().is_empty() {
        return Ok(Mapping::new());
    }
    match serde_yaml::from_str::<Value>(block)? {
        Value::Mapping(mapping) => Ok(mapping),
        Value::Null => Ok(Mapping::new()),
        _ => Err(FrontmatterError::NotAMapping),
    }
}

pub fn split_frontmatter(body: &str) -> Split<'_> {
    let mut lines = body.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return Split::Absent;
    };
    if !first.ends_with('\n') || !is_delimiter(first) {
        return Split::Absent;
    }

    let block_start = first.len();
    let mut offset = block_start;
    for line in lines {
        if is_delimiter(line) {
            let block = &body[block_start..offset];
            let rest = &body[offset + line.len()..];
            return match parse_block(block) {
                Ok(custom) => Split::Parsed { custom, body: rest },
                Err(e) => Split::Invalid(e),
            };
        }
        offset += line.len();
    }

    Split::Absent
}

/// Splits the body, logging unusable frontmatter and falling back to the
/// untouched body in that case.
pub fn extract_frontmatter(body: &str) -> (Option<Mapping>, &str) {
    match split_frontmatter(body) {
        Split::Absent => (None, body),
        Split::Parsed { custom, body } => (Some(custom), body),
        Split::Invalid(e) => {
            warn!("Failed to parse frontmatter: {}", e);
            (None, body)
        }
    }
}

fn string_list(items: Vec<String>) -> Value {
    Value::Sequence(items.into_iter().map(Value::String).collect())
}

/// Builds the post frontmatter. Keys are inserted in a fixed order so the
/// written file is stable.
pub fn build_frontmatter(
    issue: &Issue,
    slug: &str,
    attached: &[String],
    custom: Option<&Mapping>,
    publish_label: &str,
) -> Mapping {
    let mut frontmatter = Mapping::new();
    frontmatter.insert("title".into(), issue.title.clone().into());
    frontmatter.insert("date".into(), issue.created_at.clone().into());
    frontmatter.insert("author".into(), issue.user.login.clone().into());
    frontmatter.insert("issue".into(), issue.number.into());
    frontmatter.insert("slug".into(), slug.into());

    let tags: Vec<String> = issue.label_names()
        .filter(|name| *name != publish_label)
        .map(str::to_string)
        .collect();
    if !tags.is_empty() {
        frontmatter.insert("tags".into(), string_list(tags));
    }

    if !attached.is_empty() {
        frontmatter.insert("attached".into(), string_list(attached.to_vec()));
    }

    if let Some(custom) = custom {
        for (key, value) in custom {
            let protected = key.as_str().is_some_and(|k| PROTECTED_FIELDS.contains(&k));
            if !protected {
                frontmatter.insert(key.clone(), value.clone());
            }
        }
    }

    frontmatter
}
