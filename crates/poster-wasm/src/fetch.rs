//! Browser `fetch`-backed asset source.

use std::future::Future;

use js_sys::Uint8Array;
use poster_core::assets::{AssetSource, FetchError};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::Response;

/// Loads assets over HTTP relative to a base URL.
///
/// With an empty base, locations are passed to `fetch` as-is and resolve
/// against the page URL.
#[derive(Debug, Clone, Default)]
pub struct FetchSource {
    base_url: String,
}

impl FetchSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// URL requested for `location`.
    pub fn url_for(&self, location: &str) -> String {
        if self.base_url.is_empty() {
            return location.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            location.trim_start_matches('/')
        )
    }
}

impl AssetSource for FetchSource {
    fn fetch(&self, location: &str) -> impl Future<Output = Result<Vec<u8>, FetchError>> {
        let url = self.url_for(location);
        let location = location.to_string();
        async move {
            fetch_bytes(&url)
                .await
                .map_err(|e| FetchError::new(location, describe(&e)))
        }
    }
}

async fn fetch_bytes(url: &str) -> Result<Vec<u8>, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window available"))?;
    let response: Response = JsFuture::from(window.fetch_with_str(url))
        .await?
        .dyn_into()?;

    if !response.ok() {
        return Err(JsValue::from_str(&format!(
            "HTTP {} {}",
            response.status(),
            response.status_text()
        )));
    }

    let buffer = JsFuture::from(response.array_buffer()?).await?;
    Ok(Uint8Array::new(&buffer).to_vec())
}

fn describe(value: &JsValue) -> String {
    if let Some(s) = value.as_string() {
        return s;
    }
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    format!("{:?}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_for_without_base() {
        let source = FetchSource::default();
        assert_eq!(source.url_for("template.jpg"), "template.jpg");
    }

    #[test]
    fn test_url_for_with_base() {
        let source = FetchSource::new("https://example.com/assets/");
        assert_eq!(
            source.url_for("template.jpg"),
            "https://example.com/assets/template.jpg"
        );
        assert_eq!(
            source.url_for("/111612.jpg"),
            "https://example.com/assets/111612.jpg"
        );
    }
}
