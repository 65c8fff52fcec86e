use std::path::PathBuf;

use scout_engine::{search::SearchModel, vision::VisionModel};

/// Identify the item in a photo, then research its price and reviews.
#[derive(Debug, clap::Parser)]
#[command(version)]
pub struct Cli {
    /// Image to identify. A file dialog opens when omitted.
    pub image: Option<PathBuf>,

    /// Read the configuration from this file instead of the default location
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub vision_model: Option<VisionModel>,

    #[arg(long)]
    pub search_model: Option<SearchModel>,

    /// Write a configuration file with the default settings and exit
    #[arg(long)]
    pub write_config: bool,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn no_arguments() {
        let cli = Cli::try_parse_from(["item_scout"]).unwrap();
        assert!(cli.image.is_none());
        assert!(cli.config.is_none());
        assert!(!cli.write_config);
    }

    #[test]
    fn image_and_models() {
        let cli = Cli::try_parse_from([
            "item_scout",
            "photo.jpg",
            "--vision-model",
            "gemini-2.0-flash",
            "--search-model",
            "sonar",
        ])
        .unwrap();
        assert_eq!(cli.image, Some(PathBuf::from("photo.jpg")));
        assert_eq!(cli.vision_model, Some(VisionModel::Gemini20Flash));
        assert_eq!(cli.search_model, Some(SearchModel::Sonar));
    }

    #[test]
    fn unknown_model_is_rejected() {
        assert!(Cli::try_parse_from(["item_scout", "--vision-model", "gpt-4o"]).is_err());
    }
}
