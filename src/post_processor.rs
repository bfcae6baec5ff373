use std::env;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use spdlog::info;

use crate::config::Config;
use crate::error::{Issue2PostError, Result};
use crate::frontmatter::{build_frontmatter, extract_frontmatter};
use crate::images::{process_images, ImageFetcher};
use crate::issue::Issue;
use crate::post::{write_post, PostLocation};

/// What the pipeline needs from the configuration
#[derive(Debug, Clone)]
pub struct PostSettings {
    pub posts_dir: PathBuf,
    pub index_file_name: String,
    pub publish_label: String,
    pub default_image_ext: String,
}

impl PostSettings {
    pub fn from_config(config: &Config) -> Self {
        PostSettings {
            posts_dir: config.paths.posts_dir.clone(),
            index_file_name: config.defaults.index_file_name.clone(),
            publish_label: config.defaults.publish_label.clone(),
            default_image_ext: config.defaults.default_image_ext.clone(),
        }
    }
}

impl Default for PostSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Turns the issue into a post folder and returns the folder path.
/// Files written before a failure stay on disk.
pub fn process_issue(issue: &Issue, settings: &PostSettings, fetcher: &dyn ImageFetcher) -> Result<PathBuf> {
    let location = PostLocation::new(&settings.posts_dir, issue)?;
    location.create()?;

    info!("Processing issue #{}: {}", issue.number, issue.title);
    info!("Post folder: {}", location.folder.display());

    let (custom, body) = extract_frontmatter(issue.body());
    let images = process_images(body, &location.folder, fetcher, &settings.default_image_ext);

    let frontmatter = build_frontmatter(
        issue,
        &location.slug,
        &images.attached,
        custom.as_ref(),
        &settings.publish_label,
    );

    let index_path = write_post(&location.folder, &settings.index_file_name, &frontmatter, &images.body)?;
    info!("Created post: {}", index_path.display());

    Ok(location.folder)
}

/// Appends `KEY=<folder>` to the workflow variable file
pub fn export_post_folder(output_file: &Path, key: &str, folder: &Path) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(output_file)
        .map_err(|e| Issue2PostError::io(output_file, e))?;

    writeln!(file, "{}={}", key, folder.display()).map_err(|e| Issue2PostError::io(output_file, e))
}

/// Exports the folder when `output_var` names a file. Returns false and
/// writes nothing when the variable is unset or empty.
pub fn export_post_folder_from_env(output_var: &str, key: &str, folder: &Path) -> Result<bool> {
    match env::var_os(output_var) {
        Some(output_file) if !output_file.is_empty() => {
            export_post_folder(Path::new(&output_file), key, folder)?;
            Ok(true)
        }
        _ => Ok(false),
    }
}
