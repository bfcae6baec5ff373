use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use spdlog::{info, warn};

use issue2post::config::open_config;
use issue2post::error::{Issue2PostError, Result};
use issue2post::images::HttpFetcher;
use issue2post::issue::Issue;
use issue2post::logger::configure_logger;
use issue2post::post_processor::{export_post_folder_from_env, process_issue, PostSettings};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Config path. If empty, issue2post.toml is looked up next to the executable,
    /// in the current dir and in the user config dir
    #[arg(short, long)]
    config_path: Option<PathBuf>,

    /// Read the issue JSON from this file instead of the environment
    #[arg(short, long)]
    issue_file: Option<PathBuf>,

    /// Directory where posts are created, overrides the configuration
    #[arg(short, long)]
    posts_dir: Option<PathBuf>,
}

fn run(args: Args) -> Result<PathBuf> {
    let mut config = open_config(args.config_path)?;
    if let Some(posts_dir) = args.posts_dir {
        config.paths.posts_dir = posts_dir;
    }

    if let Err(err) = configure_logger(config.log.as_ref()) {
        warn!("Error creating logger sinks. Using console instead. Desc={}", err);
    }

    let issue = match args.issue_file {
        Some(path) => Issue::from_file(&path)?,
        None => Issue::from_env(&config.env.issue_var)?,
    };

    let fetcher = HttpFetcher::new(Duration::from_secs(config.defaults.image_timeout_secs))
        .map_err(|e| Issue2PostError::Config(format!("Error creating HTTP client: {}", e)))?;
    let folder = process_issue(&issue, &PostSettings::from_config(&config), &fetcher)?;

    export_post_folder_from_env(&config.env.output_var, &config.env.output_key, &folder)?;

    info!("Successfully created post at {}", folder.display());
    Ok(folder)
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::from(err.exit_code())
        }
    }
}
