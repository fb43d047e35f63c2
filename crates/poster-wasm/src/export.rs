//! Blob object URLs for finished posters.

use js_sys::{Array, Uint8Array};
use wasm_bindgen::prelude::*;
use web_sys::{Blob, BlobPropertyBag, Url};

/// Create an object URL for `bytes` with the given MIME type.
pub(crate) fn object_url(bytes: &[u8], mime_type: &str) -> Result<String, JsValue> {
    let parts = Array::of1(&Uint8Array::from(bytes));
    let options = BlobPropertyBag::new();
    options.set_type(mime_type);

    let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)?;
    Url::create_object_url_with_blob(&blob)
}

/// Release an object URL created by [`object_url`].
pub(crate) fn revoke(url: &str) {
    if Url::revoke_object_url(url).is_err() {
        tracing::debug!(url, "object URL already released");
    }
}
