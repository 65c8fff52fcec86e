use std::path::{Path, PathBuf};

use scout_engine::{MAX_RETRIES, REQUEST_TIMEOUT_SECS, search::SearchModel, vision::VisionModel};
use serde::{Deserialize, Serialize};

use crate::{APP_NAME, cli::Cli};

pub const GEMINI_KEY_FILE: &str = "gemini_api_key.txt";
pub const PERPLEXITY_KEY_FILE: &str = "perplexity_api_key.txt";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Plain text file holding the Gemini API key
    pub gemini_key_file: PathBuf,
    /// Plain text file holding the Perplexity API key
    pub perplexity_key_file: PathBuf,
    pub vision_model: VisionModel,
    pub search_model: SearchModel,
    pub max_retries: u32,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        let dir = dirs::config_local_dir().unwrap_or_default().join(APP_NAME);
        Self::with_keys_in(&dir)
    }
}

impl Config {
    pub fn with_keys_in(dir: &Path) -> Self {
        Self {
            gemini_key_file: dir.join(GEMINI_KEY_FILE),
            perplexity_key_file: dir.join(PERPLEXITY_KEY_FILE),
            vision_model: VisionModel::default(),
            search_model: SearchModel::default(),
            max_retries: MAX_RETRIES,
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
        }
    }

    /// Command line options take precedence over the file.
    pub fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(model) = cli.vision_model {
            self.vision_model = model;
        }
        if let Some(model) = cli.search_model {
            self.search_model = model;
        }
    }
}
