//! Image encoding for cropped photos and finished posters.
//!
//! Everything the pipeline hands out is PNG: lossless, and byte-for-byte
//! reproducible for identical pixels.

mod png;

pub use png::{encode_png, EncodeError, PNG_MIME_TYPE};
