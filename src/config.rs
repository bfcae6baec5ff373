use std::path::{Path, PathBuf};
use std::{env, fs};

use serde::Deserialize;

use crate::error::{Issue2PostError, Result};

pub const CFG_FILE_NAME: &str = "issue2post.toml";

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct Paths {
    pub posts_dir: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Paths {
            posts_dir: PathBuf::from("posts"),
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct Defaults {
    pub index_file_name: String,
    pub image_timeout_secs: u64,
    pub publish_label: String,
    pub default_image_ext: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Defaults {
            index_file_name: "index.md".to_string(),
            image_timeout_secs: 30,
            publish_label: "publish".to_string(),
            default_image_ext: ".png".to_string(),
        }
    }
}

/// Names of the environment variables shared with the calling workflow
#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct EnvVars {
    pub issue_var: String,
    pub output_var: String,
    pub output_key: String,
}

impl Default for EnvVars {
    fn default() -> Self {
        EnvVars {
            issue_var: "ISSUE_JSON".to_string(),
            output_var: "GITHUB_ENV".to_string(),
            output_key: "POST_FOLDER".to_string(),
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct Log {
    pub level: LogLevel,
    pub log_to_console: bool,
    pub location: Option<PathBuf>,
}

#[derive(Deserialize, Copy, Clone, Debug, PartialEq)]
pub enum LogLevel {
    Critical = 0,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct Config {
    pub paths: Paths,
    pub defaults: Defaults,
    pub env: EnvVars,
    pub log: Option<Log>,
}

fn parse_path(path: PathBuf) -> PathBuf {
    if !path.starts_with("${exe_dir}") {
        return path;
    }

    let exe_dir = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    match (exe_dir, path.to_str()) {
        (Some(exe_dir), Some(str_path)) => {
            PathBuf::from(str_path.replace("${exe_dir}", &exe_dir.to_string_lossy()))
        }
        _ => path,
    }
}

pub fn parse_config(cfg_content: &str) -> Result<Config> {
    let mut cfg: Config = match toml::from_str::<Config>(cfg_content) {
        Ok(cfg) => cfg,
        Err(e) => return Err(Issue2PostError::Config(format!("Error parsing configuration file: {}", e))),
    };

    cfg.paths.posts_dir = parse_path(cfg.paths.posts_dir);
    if let Some(ref mut log) = cfg.log {
        log.location = log.location.take().map(parse_path);
    }

    Ok(cfg)
}

pub fn read_config(cfg_path: &Path) -> Result<Config> {
    let cfg_content = match fs::read_to_string(cfg_path) {
        Ok(content) => content,
        Err(e) => return Err(Issue2PostError::Config(
            format!("Error opening configuration file {}: {}", cfg_path.display(), e))),
    };

    parse_config(&cfg_content)
}

/// Looks for the configuration next to the executable, then in the current
/// directory and finally in the user config directory.
pub fn find_config_path() -> Option<PathBuf> {
    let exe_dir = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    let cur_dir = env::current_dir().ok();
    let cfg_dir = dirs::config_dir();

    [exe_dir, cur_dir, cfg_dir]
        .into_iter()
        .flatten()
        .map(|dir| dir.join(CFG_FILE_NAME))
        .find(|path| path.exists())
}

/// An explicit path must exist. Without one, a discovered file is used and
/// the built-in defaults apply when nothing is found.
pub fn open_config(cfg_path: Option<PathBuf>) -> Result<Config> {
    match cfg_path.or_else(find_config_path) {
        Some(path) => read_config(&path),
        None => Ok(Config::default()),
    }
}
