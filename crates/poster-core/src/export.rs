//! Export of a finished poster.
//!
//! No pixels are touched here: the encoded PNG is only wrapped so that a
//! shell can show it (a `data:` URL) and offer it for download.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Serialize;

use crate::encode::PNG_MIME_TYPE;

/// A downloadable file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Download {
    pub file_name: String,
    pub mime_type: &'static str,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

/// An encoded poster ready for a preview surface and a download link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedPoster {
    /// `data:image/png;base64,...` URL of the poster.
    pub preview_url: String,
    pub download: Download,
}

impl ExportedPoster {
    /// The encoded PNG.
    pub fn bytes(&self) -> &[u8] {
        &self.download.bytes
    }
}

/// Build a `data:` URL for `bytes` of the given MIME type.
pub fn data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}

/// Wrap an encoded PNG for preview and download.
pub fn expose(png: Vec<u8>, file_name: &str) -> ExportedPoster {
    tracing::debug!(bytes = png.len(), file_name, "exposing poster");
    ExportedPoster {
        preview_url: data_url(PNG_MIME_TYPE, &png),
        download: Download {
            file_name: file_name.to_string(),
            mime_type: PNG_MIME_TYPE,
            bytes: png,
        },
    }
}
