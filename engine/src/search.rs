use std::{fmt, future::Future, pin::Pin};

use color_eyre::Result;
use log::error;
use serde::{Deserialize, Serialize};
use strum::Display;

pub mod perplexity;
pub use perplexity::Perplexity;

pub const NO_RESULTS: &str = "No search results found";

/// A web-search backend. `Ok(None)` means the service answered without any result.
pub trait WebSearch {
    fn query<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<String>>> + Send + 'a>>;
}

#[derive(
    Debug, Clone, Copy, Display, clap::ValueEnum, Serialize, Deserialize, PartialEq, Eq, Default,
)]
#[strum(serialize_all = "kebab-case")]
pub enum SearchModel {
    Sonar,
    #[default]
    SonarPro,
    SonarReasoning,
}

/// The result of a search, with failures folded into the value so the
/// conversation can carry on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Found(String),
    NoResults,
    Failed(String),
}

impl fmt::Display for SearchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchOutcome::Found(text) => f.write_str(text),
            SearchOutcome::NoResults => f.write_str(NO_RESULTS),
            SearchOutcome::Failed(msg) => write!(f, "Error performing web search: {msg}"),
        }
    }
}

pub async fn web_search(search: &(dyn WebSearch + Send + Sync), prompt: &str) -> SearchOutcome {
    match search.query(prompt).await {
        Ok(Some(text)) => SearchOutcome::Found(text),
        Ok(None) => SearchOutcome::NoResults,
        Err(e) => {
            error!("Web search failed: {e:#}");
            SearchOutcome::Failed(format!("{e:#}"))
        }
    }
}
