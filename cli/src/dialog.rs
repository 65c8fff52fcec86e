use std::{future::Future, path::PathBuf, pin::Pin};

use scout_engine::session::FilePicker;

const TITLE: &str = "Select Image File";
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif"];

/// The native "open file" dialog.
pub struct ImageDialog;

impl FilePicker for ImageDialog {
    fn pick_image(&self) -> Pin<Box<dyn Future<Output = Option<PathBuf>> + Send + '_>> {
        Box::pin(async {
            rfd::AsyncFileDialog::new()
                .set_title(TITLE)
                .add_filter("Image files", IMAGE_EXTENSIONS)
                .add_filter("All files", &["*"])
                .pick_file()
                .await
                .map(|handle| handle.path().to_path_buf())
        })
    }
}
