use std::{
    future::Future,
    path::{Path, PathBuf},
    pin::Pin,
};

use image::{DynamicImage, ImageReader, codecs::jpeg::JpegEncoder};
use serde::{Deserialize, Serialize};
use strum::Display;
use thiserror::Error;

mod error;
pub use error::VisionError;

pub mod gemini;
pub use gemini::Gemini;

pub const IDENTIFY_PROMPT: &str = "Analyse the object in the image. Ignore the background and focus on the object. Display the brand of the object along with its model name in the following format: 'Brand Model'";
pub const NO_DESCRIPTION: &str = "No description generated";

const JPEG_QUALITY: u8 = 90;

/// An image-understanding backend.
pub trait Vision {
    /// Checks that the backend can be reached. Must be called before `describe`.
    fn init(&self) -> Pin<Box<dyn Future<Output = Result<(), VisionError>> + Send + '_>>;

    /// Identifies the object in `image`, answering in the form "Brand Model".
    fn describe<'a>(
        &'a self,
        image: &'a ImageHandle,
    ) -> Pin<Box<dyn Future<Output = Result<String, VisionError>> + Send + 'a>>;
}

#[derive(
    Debug, Clone, Copy, Display, clap::ValueEnum, Serialize, Deserialize, PartialEq, Eq, Default,
)]
pub enum VisionModel {
    #[default]
    #[strum(to_string = "gemini-1.5-flash")]
    #[value(name = "gemini-1.5-flash")]
    Gemini15Flash,

    #[strum(to_string = "gemini-2.0-flash")]
    #[value(name = "gemini-2.0-flash")]
    Gemini20Flash,

    #[strum(to_string = "gemini-2.5-flash")]
    #[value(name = "gemini-2.5-flash")]
    Gemini25Flash,
}

#[derive(Debug, Error)]
#[error("Could not load image {}: {source}", path.display())]
pub struct ImageLoadError {
    pub path: PathBuf,
    #[source]
    pub source: image::ImageError,
}

/// An image loaded from disk and re-encoded as JPEG, the payload format
/// sent inline to a [`Vision`] backend.
#[derive(Debug)]
pub struct ImageHandle {
    path: PathBuf,
    dimensions: (u32, u32),
    jpeg: Vec<u8>,
}

impl ImageHandle {
    /// Decoding and encoding both happen here, so every failure is local to the file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ImageLoadError> {
        let path = path.as_ref().to_path_buf();
        let wrap = |source| ImageLoadError {
            path: path.clone(),
            source,
        };

        let image = ImageReader::open(&path)
            .map_err(|e| wrap(e.into()))?
            .with_guessed_format()
            .map_err(|e| wrap(e.into()))?
            .decode()
            .map_err(wrap)?;
        let jpeg = encode_jpeg(&image).map_err(wrap)?;

        Ok(Self {
            dimensions: (image.width(), image.height()),
            path,
            jpeg,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.dimensions
    }

    pub fn jpeg(&self) -> &[u8] {
        &self.jpeg
    }
}

fn encode_jpeg(image: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let rgb = image.to_rgb8();
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY).encode_image(&rgb)?;
    Ok(buf)
}
