//! The conversation with the user: pick an image, identify the object, let the
//! user confirm or correct it, then search and refine until they type `exit`.
//!
//! The whole identify-confirm-search-feedback sequence is one attempt of the
//! retry loop, so a remote failure while identifying starts over with a fresh
//! request after the backoff delay.

use std::{
    future::Future,
    io,
    path::{Path, PathBuf},
    pin::Pin,
};

use color_eyre::Result;
use log::{info, warn};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::{
    SearchBox, VisionBox,
    retry::{Retriable, RetryPolicy, retry},
    search::web_search,
    vision::{ImageHandle, ImageLoadError, VisionError},
};

pub const NO_FILE_SELECTED: &str = "No file selected";
pub const INIT_FAILED: &str = "Failed to initialize API connection";
pub const EXIT_COMMAND: &str = "exit";

/// Source of the image to identify, usually a native "open file" dialog.
pub trait FilePicker {
    /// `None` if the user cancelled.
    fn pick_image(&self) -> Pin<Box<dyn Future<Output = Option<PathBuf>> + Send + '_>>;
}

/// Always answers with the same path, for images given up front.
pub struct Preselected(pub PathBuf);

impl FilePicker for Preselected {
    fn pick_image(&self) -> Pin<Box<dyn Future<Output = Option<PathBuf>> + Send + '_>> {
        let path = self.0.clone();
        Box::pin(async move { Some(path) })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    NoFileSelected,
    /// The last search result shown before the user finished.
    Completed(String),
    Failed(String),
}

impl Outcome {
    pub fn message(&self) -> &str {
        match self {
            Outcome::NoFileSelected => NO_FILE_SELECTED,
            Outcome::Completed(s) | Outcome::Failed(s) => s,
        }
    }
}

#[derive(Debug, Error)]
pub enum AttemptError {
    #[error(transparent)]
    Image(#[from] ImageLoadError),

    #[error(transparent)]
    Vision(#[from] VisionError),

    #[error("standard input was closed")]
    InputClosed,

    #[error("console I/O failed: {0}")]
    Io(#[from] io::Error),
}

impl Retriable for AttemptError {
    fn is_retriable(&self) -> bool {
        match self {
            AttemptError::Vision(_) | AttemptError::Io(_) => true,
            AttemptError::Image(_) | AttemptError::InputClosed => false,
        }
    }
}

enum State {
    Identifying,
    AwaitingConfirmation { identification: String },
    Searching { description: String },
    AwaitingFeedback { description: String, result: String },
    Done(String),
}

pub struct Session<R, W> {
    vision: VisionBox,
    search: SearchBox,
    policy: RetryPolicy,
    input: R,
    output: W,
}

impl<R, W> Session<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(vision: VisionBox, search: SearchBox, input: R, output: W) -> Self {
        Self {
            vision,
            search,
            policy: RetryPolicy::default(),
            input,
            output,
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub async fn run(&mut self, picker: &(dyn FilePicker + Sync)) -> Result<Outcome> {
        let Some(path) = picker.pick_image().await else {
            self.say(NO_FILE_SELECTED).await?;
            return Ok(Outcome::NoFileSelected);
        };
        info!("Selected {}", path.display());

        if let Err(e) = self.vision.init().await {
            warn!("Not attempting identification: {e}");
            return Ok(Outcome::Failed(INIT_FAILED.into()));
        }

        let policy = self.policy;
        let outcome = match retry(&policy, async |_attempt: u32| self.attempt(&path).await).await
        {
            Ok(result) => Outcome::Completed(result),
            Err(e) => Outcome::Failed(e.to_string()),
        };
        Ok(outcome)
    }

    async fn attempt(&mut self, path: &Path) -> Result<String, AttemptError> {
        let mut state = State::Identifying;
        loop {
            state = match state {
                State::Identifying => {
                    let image = ImageHandle::open(path)?;
                    let identification = self.vision.describe(&image).await?;
                    self.say("\nItem in the photo:").await?;
                    self.say(&identification).await?;
                    State::AwaitingConfirmation { identification }
                }

                State::AwaitingConfirmation { identification } => {
                    self.say("\nIs this identification correct? (yes/no)")
                        .await?;
                    let answer = self.read_line().await?.ok_or(AttemptError::InputClosed)?;
                    if answer.trim().eq_ignore_ascii_case("yes") {
                        State::Searching {
                            description: identification,
                        }
                    } else {
                        self.say("Please provide the correct item description:")
                            .await?;
                        let corrected = self.read_line().await?.ok_or(AttemptError::InputClosed)?;
                        State::Searching {
                            description: corrected.trim().to_string(),
                        }
                    }
                }

                State::Searching { description } => {
                    let result = web_search(self.search.as_ref(), &search_prompt(&description))
                        .await
                        .to_string();
                    self.say("\nItem details:").await?;
                    self.say(&result).await?;
                    State::AwaitingFeedback {
                        description,
                        result,
                    }
                }

                State::AwaitingFeedback {
                    description,
                    result,
                } => {
                    self.prompt("\nEnter feedback (or type 'exit' to finish): ")
                        .await?;
                    match self.read_line().await? {
                        None => {
                            info!("Input closed, finishing the conversation");
                            State::Done(result)
                        }
                        Some(line) if line.trim().eq_ignore_ascii_case(EXIT_COMMAND) => {
                            State::Done(result)
                        }
                        Some(line) if line.trim().is_empty() => State::AwaitingFeedback {
                            description,
                            result,
                        },
                        Some(line) => {
                            let prompt = format!("{description} {}", line.trim());
                            let updated = web_search(self.search.as_ref(), &prompt)
                                .await
                                .to_string();
                            self.say("\nUpdated Item Details:").await?;
                            self.say(&updated).await?;
                            State::AwaitingFeedback {
                                description,
                                result: updated,
                            }
                        }
                    }
                }

                State::Done(result) => return Ok(result),
            }
        }
    }

    async fn say(&mut self, text: &str) -> io::Result<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        self.output.flush().await
    }

    async fn prompt(&mut self, text: &str) -> io::Result<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.flush().await
    }

    async fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

pub fn search_prompt(description: &str) -> String {
    indoc::formatdoc! {"
        Based on this item description: {description}
        1. Do an internet search and find its current price.
        2. Summarize user reviews and ratings
        3. Then continue to be a friendly AI agent that accesses the web as required.
    "}
}
