//! JavaScript-facing wrapper for a finished poster.

use poster_core::PosterResult;
use wasm_bindgen::prelude::*;

/// A generated poster.
///
/// `previewUrl` and `downloadUrl` point to the same Blob; it stays valid until
/// the next successful generation replaces it.
#[wasm_bindgen]
pub struct JsPoster {
    width: u32,
    height: u32,
    full_name: String,
    url: String,
    file_name: String,
    mime_type: String,
    bytes: Vec<u8>,
}

impl JsPoster {
    pub(crate) fn new(result: &PosterResult, url: String) -> Self {
        let download = result.download();
        Self {
            width: result.width,
            height: result.height,
            full_name: result.full_name.clone(),
            url,
            file_name: download.file_name.clone(),
            mime_type: download.mime_type.to_string(),
            bytes: download.bytes.clone(),
        }
    }
}

#[wasm_bindgen]
impl JsPoster {
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[wasm_bindgen(getter, js_name = fullName)]
    pub fn full_name(&self) -> String {
        self.full_name.clone()
    }

    /// URL to show in an `<img>`.
    #[wasm_bindgen(getter, js_name = previewUrl)]
    pub fn preview_url(&self) -> String {
        self.url.clone()
    }

    /// URL for the download link's `href`.
    #[wasm_bindgen(getter, js_name = downloadUrl)]
    pub fn download_url(&self) -> String {
        self.url.clone()
    }

    /// Value for the download link's `download` attribute.
    #[wasm_bindgen(getter, js_name = fileName)]
    pub fn file_name(&self) -> String {
        self.file_name.clone()
    }

    #[wasm_bindgen(getter, js_name = mimeType)]
    pub fn mime_type(&self) -> String {
        self.mime_type.clone()
    }

    #[wasm_bindgen(getter, js_name = byteLength)]
    pub fn byte_length(&self) -> usize {
        self.bytes.len()
    }

    /// Encoded PNG as a `Uint8Array` (copied out of WASM memory).
    pub fn bytes(&self) -> Vec<u8> {
        self.bytes.clone()
    }
}
