//! Image decoding for poster assets.
//!
//! This module provides functionality for:
//! - Decoding uploaded photos and the fixed template/background rasters
//! - Correcting EXIF orientation so photos appear upright
//!
//! All decoded images are held as straight (non-premultiplied) RGBA8, which
//! is the common currency between the crop, load and compose stages.
//!
//! # Examples
//!
//! ```ignore
//! use poster_core::decode::decode_image;
//!
//! let bytes = std::fs::read("photo.jpg")?;
//! let image = decode_image(&bytes)?;
//! println!("Decoded {}x{} image", image.width, image.height);
//! ```

mod reader;
mod types;

pub use reader::decode_image;
pub use types::{DecodeError, ImageAsset, Orientation};
