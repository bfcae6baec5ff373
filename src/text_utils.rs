use chrono::{DateTime, FixedOffset};

/// Lowercases the text and collapses every run of characters outside
/// `[a-z0-9]` into a single `-`. No leading or trailing `-` is kept.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    slug
}

pub fn year_dir_name(date: &DateTime<FixedOffset>) -> String {
    date.format("%Y").to_string()
}

/// `<yymmdd>-<slug>`, using the date in its own offset
pub fn post_dir_name(date: &DateTime<FixedOffset>, slug: &str) -> String {
    format!("{}-{}", date.format("%y%m%d"), slug)
}
