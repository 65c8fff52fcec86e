use std::{
    fs, io,
    path::{Path, PathBuf},
};

use log::error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("API key file {} not found", path.display())]
    NotFound { path: PathBuf },

    #[error("Error reading API key from {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The two secrets the agent needs. Loaded once, then handed to the clients.
#[derive(Clone)]
pub struct Credentials {
    pub vision_api_key: String,
    pub search_api_key: String,
}

impl Credentials {
    pub fn load(
        vision_key_file: impl AsRef<Path>,
        search_key_file: impl AsRef<Path>,
    ) -> Result<Self, CredentialError> {
        Ok(Self {
            vision_api_key: load_api_key(vision_key_file)?,
            search_api_key: load_api_key(search_key_file)?,
        })
    }
}

// keys must never end up in logs
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials").finish_non_exhaustive()
    }
}

pub fn load_api_key(path: impl AsRef<Path>) -> Result<String, CredentialError> {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(content) => Ok(content.trim().to_string()),
        Err(e) => {
            let err = if e.kind() == io::ErrorKind::NotFound {
                CredentialError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                CredentialError::Read {
                    path: path.to_path_buf(),
                    source: e,
                }
            };
            error!("{err}");
            Err(err)
        }
    }
}
