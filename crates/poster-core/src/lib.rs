//! Poster Core - Personalised poster generation
//!
//! This crate turns a name and a photo into a finished poster: the photo is
//! cropped to 3:4, the fixed assets are loaded behind a single barrier, the
//! layers are composited onto the template and the result is encoded as PNG.

pub mod assets;
pub mod compose;
pub mod config;
pub mod crop;
pub mod decode;
pub mod encode;
pub mod export;
pub mod geometry;
pub mod layout;
pub mod pipeline;

pub use assets::{load_all, AssetError, AssetRole, AssetSource, FsSource, MemorySource};
pub use compose::{display_name, ComposeError, Compositor};
pub use config::{ConfigError, PosterConfig};
pub use crop::{CropController, CropError, CropSession, CropState, CroppedImage, InterpolationFilter};
pub use decode::{decode_image, DecodeError, ImageAsset};
pub use encode::{encode_png, EncodeError};
pub use export::{expose, ExportedPoster};
pub use geometry::{cover_fit, rounded_rect_path, DrawRect, LayoutBox};
pub use pipeline::{
    GenerationRequest, MissingField, PhotoSelection, PipelineError, PosterResult, PosterSession,
};
