use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use color_eyre::{
    Result,
    eyre::{WrapErr as _, eyre},
};
use log::{LevelFilter, info};
use scout_engine::{
    credentials::Credentials,
    retry::RetryPolicy,
    search::Perplexity,
    session::{Outcome, Preselected, Session},
    vision::Gemini,
};
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::BufReader;

use crate::{cli::Cli, config::Config, dialog::ImageDialog};

pub mod cli;
pub mod config;
pub mod dialog;

pub const APP_NAME: &str = "item_scout";

/// Timestamped log lines on stderr, `Info` unless `RUST_LOG` says otherwise.
pub fn init_logging() {
    pretty_env_logger::formatted_timed_builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();
}

pub fn load_ron_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let src = fs::read_to_string(path)?;
    ron::from_str(&src).with_context(|| format!("parsing {}", path.display()))
}

pub fn save_ron_file<T: Serialize>(path: &Path, x: &T) -> Result<()> {
    let src = ron::ser::to_string_pretty(x, ron::ser::PrettyConfig::default())?;
    Ok(fs::write(path, src)?)
}

pub fn config_path() -> Result<PathBuf> {
    Ok(dirs::config_local_dir()
        .ok_or(eyre!("Couldn't get config dir"))?
        .join(format!("{APP_NAME}.ron")))
}

/// Falls back to the defaults when there is no configuration file.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        info!("No config at {}, using defaults", path.display());
        Ok(Config::default())
    } else {
        info!("Loading config from {}", path.display());
        load_ron_file(path)
    }
}

pub fn save_config(path: &Path, cfg: &Config) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    save_ron_file(path, cfg)
}

/// What the user gets to see once the run is over. Errors carry their whole cause chain.
pub fn final_message(result: &Result<Outcome>) -> Option<String> {
    match result {
        Ok(Outcome::NoFileSelected | Outcome::Completed(_)) => None,
        Ok(Outcome::Failed(msg)) => Some(msg.clone()),
        Err(e) => Some(format!("Error: {e:#}")),
    }
}

pub async fn run(args: Cli) -> Result<Outcome> {
    let path = match &args.config {
        Some(p) => p.clone(),
        None => config_path()?,
    };
    let mut cfg = load_config(&path)?;
    cfg.apply_overrides(&args);

    let Credentials {
        vision_api_key,
        search_api_key,
    } = Credentials::load(&cfg.gemini_key_file, &cfg.perplexity_key_file)?;

    let timeout = Duration::from_secs(cfg.request_timeout_secs);
    let vision = Gemini::new(vision_api_key, cfg.vision_model).with_timeout(timeout);
    let search = Perplexity::new(search_api_key, cfg.search_model).with_timeout(timeout);

    let mut session = Session::new(
        Box::new(vision),
        Box::new(search),
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .with_policy(RetryPolicy::with_max_retries(cfg.max_retries));

    match args.image {
        Some(image) => session.run(&Preselected(image)).await,
        None => session.run(&ImageDialog).await,
    }
}
