//! Poster session configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crop::InterpolationFilter;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Settings for a [`PosterSession`](crate::pipeline::PosterSession).
///
/// Every field has a default, so an empty JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct PosterConfig {
    /// Location of the background image.
    pub background_path: String,
    /// Location of the template overlay.
    pub template_path: String,
    /// Open the crop session as soon as a photo is selected.
    ///
    /// Wide pointer screens open it automatically; narrow touch screens wait
    /// for an explicit request.
    pub auto_open_crop: bool,
    /// File name offered for download.
    pub download_name: String,
    /// Resampling used when a crop is applied.
    pub crop_filter: InterpolationFilter,
    /// Extra directories scanned for font files.
    pub font_dirs: Vec<PathBuf>,
    /// Load the platform's installed fonts.
    pub system_fonts: bool,
}

impl Default for PosterConfig {
    fn default() -> Self {
        Self {
            background_path: "111612.jpg".to_string(),
            template_path: "template.jpg".to_string(),
            auto_open_crop: true,
            download_name: "poster.png".to_string(),
            crop_filter: InterpolationFilter::default(),
            font_dirs: Vec::new(),
            system_fonts: true,
        }
    }
}

impl PosterConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PosterConfig::default();
        assert_eq!(config.background_path, "111612.jpg");
        assert_eq!(config.template_path, "template.jpg");
        assert!(config.auto_open_crop);
        assert_eq!(config.download_name, "poster.png");
        assert_eq!(config.crop_filter, InterpolationFilter::Bilinear);
        assert!(config.font_dirs.is_empty());
        assert!(config.system_fonts);
    }

    #[test]
    fn test_empty_object_is_default() {
        assert_eq!(PosterConfig::from_json("{}").unwrap(), PosterConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = PosterConfig::from_json(
            r#"{"autoOpenCrop": false, "templatePath": "assets/frame.png", "cropFilter": "lanczos3"}"#,
        )
        .unwrap();

        assert!(!config.auto_open_crop);
        assert_eq!(config.template_path, "assets/frame.png");
        assert_eq!(config.crop_filter, InterpolationFilter::Lanczos3);
        assert_eq!(config.background_path, "111612.jpg");
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = PosterConfig::from_json(r#"{"autoOpen": false}"#).unwrap_err();
        assert!(err.to_string().contains("autoOpen"));
    }

    #[test]
    fn test_serialized_names_are_camel_case() {
        let json = serde_json::to_value(PosterConfig::default()).unwrap();
        assert_eq!(json["downloadName"], "poster.png");
        assert_eq!(json["autoOpenCrop"], true);
    }
}
