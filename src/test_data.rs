#[cfg(test)]
pub const ISSUE_JSON: &str = r#"{
  "title": "My Post",
  "body": "Hello",
  "created_at": "2024-03-05T10:00:00Z",
  "number": 7,
  "state": "open",
  "user": {"login": "alice", "id": 1},
  "labels": [{"name": "publish", "color": "0e8a16"}]
}"#;

#[cfg(test)]
pub const BODY_WITH_FRONTMATTER: &str = "---
title: Custom title
description: Écrit à la main
issue: 999
attached:
  - evil.png
---
First line of the post

![diagram](https://example.com/img/diagram.jpg)
";
