use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde_yaml::Mapping;

use crate::error::{Issue2PostError, Result};
use crate::issue::Issue;
use crate::text_utils::{post_dir_name, slugify, year_dir_name};

const FRONTMATTER_DELIMITER: &str = "---";

/// Where a post lives: `<posts_dir>/<YYYY>/<yymmdd>-<slug>`.
/// The slug is computed once and shared with the frontmatter.
#[derive(Debug, Clone, PartialEq)]
pub struct PostLocation {
    pub slug: String,
    pub folder: PathBuf,
}

impl PostLocation {
    pub fn new(posts_dir: &Path, issue: &Issue) -> Result<PostLocation> {
        let created = issue.created_date()?;
        let slug = slugify(&issue.title);
        let folder = posts_dir
            .join(year_dir_name(&created))
            .join(post_dir_name(&created, &slug));

        Ok(PostLocation { slug, folder })
    }

    pub fn create(&self) -> Result<()> {
        fs::create_dir_all(&self.folder).map_err(|e| Issue2PostError::io(&self.folder, e))
    }
}

/// Frontmatter block followed by a blank line and the untouched body
pub fn render_post(frontmatter: &Mapping, body: &str) -> Result<String> {
    let yaml = serde_yaml::to_string(frontmatter)?;

    let mut buf = String::with_capacity(yaml.len() + body.len() + 16);
    buf.push_str(FRONTMATTER_DELIMITER);
    buf.push('\n');
    buf.push_str(&yaml);
    buf.push_str(FRONTMATTER_DELIMITER);
    buf.push_str("\n\n");
    buf.push_str(body);
    Ok(buf)
}

/// Writes the post file inside `folder`, replacing any previous one
pub fn write_post(folder: &Path, index_file_name: &str, frontmatter: &Mapping, body: &str) -> Result<PathBuf> {
    let content = render_post(frontmatter, body)?;
    let index_path = folder.join(index_file_name);

    fs::create_dir_all(folder).map_err(|e| Issue2PostError::io(folder, e))?;
    let write = || -> std::io::Result<()> {
        let mut writer = BufWriter::new(File::create(&index_path)?);
        writer.write_all(content.as_bytes())?;
        writer.flush()
    };
    write().map_err(|e| Issue2PostError::io(&index_path, e))?;

    Ok(index_path)
}

#[cfg(test)]
mod tests {
    use serde_yaml::Value;

    use crate::frontmatter::{split_frontmatter, Split};
    use crate::test_data::ISSUE_JSON;

    use super::*;

    fn sample_frontmatter() -> Mapping {
        let mut fm = Mapping::new();
        fm.insert("title".into(), "Café & crème".into());
        fm.insert("date".into(), "2024-03-05T10:00:00Z".into());
        fm.insert("issue".into(), 7u64.into());
        fm.insert("tags".into(), Value::Sequence(vec!["tech".into(), "life".into()]));
        fm
    }

    #[test]
    fn test_location() {
        let issue = Issue::from_json(ISSUE_JSON).unwrap();
        let location = PostLocation::new(Path::new("posts"), &issue).unwrap();
        assert_eq!(location.slug, "my-post");
        assert_eq!(location.folder, PathBuf::from("posts/2024/240305-my-post"));
    }

    #[test]
    fn test_render_post() {
        let rendered = render_post(&sample_frontmatter(), "Body *text*\n").unwrap();
        assert_eq!(rendered, "---
title: Café & crème
date: 2024-03-05T10:00:00Z
issue: 7
tags:
- tech
- life
---

Body *text*
");
    }

    #[test]
    fn test_frontmatter_round_trip() {
        let fm = sample_frontmatter();
        let rendered = render_post(&fm, "Hello").unwrap();

        let Split::Parsed { custom, body } = split_frontmatter(&rendered) else {
            panic!("rendered post must start with frontmatter");
        };
        assert_eq!(custom, fm);
        assert_eq!(body, "\nHello");
    }

    #[test]
    fn test_write_post_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("2024").join("240305-my-post");

        let path = write_post(&folder, "index.md", &sample_frontmatter(), "first").unwrap();
        assert_eq!(path, folder.join("index.md"));

        write_post(&folder, "index.md", &sample_frontmatter(), "second").unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.ends_with("---\n\nsecond"));
        assert!(!content.contains("first"));
    }
}
