//! The poster session exposed to the page.
//!
//! # Example
//!
//! ```typescript
//! const app = new PosterApp({ templatePath: "template.jpg" }, "");
//!
//! input.onchange = async () => {
//!   const file = input.files[0];
//!   const opened = app.selectPhoto(file.name, new Uint8Array(await file.arrayBuffer()));
//!   if (opened) showCropDialog(app.cropState());
//! };
//!
//! button.onclick = async () => {
//!   try {
//!     const poster = await app.generate(first.value, last.value);
//!     preview.src = poster.previewUrl;
//!     link.href = poster.downloadUrl;
//!     link.download = poster.fileName;
//!   } catch (e) {
//!     alert(e.message);
//!   }
//! };
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::Promise;
use poster_core::{PipelineError, PosterConfig, PosterSession};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use crate::export::{object_url, revoke};
use crate::fetch::FetchSource;
use crate::types::JsPoster;

/// Viewports matching this query get an explicit "open crop" action instead
/// of opening the crop dialog on file selection.
pub const MANUAL_CROP_QUERY: &str = "(max-width: 768px), (pointer: coarse)";

/// Convert a pipeline error into the `Error` thrown to JavaScript.
fn to_js_error(e: PipelineError) -> JsValue {
    tracing::warn!(error = %e, "poster pipeline error");
    js_sys::Error::new(&e.user_message()).into()
}

/// Whether the current viewport should open the crop dialog automatically.
fn viewport_auto_opens_crop() -> bool {
    let manual = web_sys::window()
        .and_then(|w| w.match_media(MANUAL_CROP_QUERY).ok().flatten())
        .map(|mql| mql.matches())
        .unwrap_or(false);
    !manual
}

fn parse_config(value: &JsValue) -> Result<PosterConfig, JsValue> {
    if value.is_undefined() || value.is_null() {
        let mut config = PosterConfig::default();
        config.auto_open_crop = viewport_auto_opens_crop();
        return Ok(config);
    }

    let mut config: PosterConfig = serde_wasm_bindgen::from_value(value.clone())
        .map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))?;
    if !js_sys::Reflect::has(value, &JsValue::from_str("autoOpenCrop"))? {
        config.auto_open_crop = viewport_auto_opens_crop();
    }
    Ok(config)
}

/// One user's poster session.
#[wasm_bindgen]
pub struct PosterApp {
    session: Rc<RefCell<PosterSession>>,
    source: Rc<FetchSource>,
    /// Object URL of the current poster, released when replaced.
    current_url: Rc<RefCell<Option<String>>>,
}

#[wasm_bindgen]
impl PosterApp {
    /// Create a session.
    ///
    /// `config` is a `PosterConfig` object (camelCase keys) or `undefined`.
    /// When it does not set `autoOpenCrop`, the value is derived from the
    /// viewport. Assets are fetched relative to `baseUrl`.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue, base_url: Option<String>) -> Result<PosterApp, JsValue> {
        let config = parse_config(&config)?;
        tracing::info!(auto_open_crop = config.auto_open_crop, "poster app created");

        Ok(PosterApp {
            session: Rc::new(RefCell::new(PosterSession::new(config))),
            source: Rc::new(FetchSource::new(base_url.unwrap_or_default())),
            current_url: Rc::new(RefCell::new(None)),
        })
    }

    #[wasm_bindgen(getter, js_name = autoOpenCrop)]
    pub fn auto_open_crop(&self) -> bool {
        self.session.borrow().config().auto_open_crop
    }

    /// Register a font (TTF/OTF bytes) for the name text. Arial Black or
    /// Arial is preferred over the bundled face.
    #[wasm_bindgen(js_name = addFont)]
    pub fn add_font(&self, data: Vec<u8>) {
        self.session.borrow_mut().add_font(data);
    }

    /// Choose a photo. Returns whether the crop dialog should be shown now.
    #[wasm_bindgen(js_name = selectPhoto)]
    pub fn select_photo(&self, name: String, bytes: Vec<u8>) -> Result<bool, JsValue> {
        let selection = self
            .session
            .borrow_mut()
            .select_photo(name, bytes)
            .map_err(to_js_error)?;
        Ok(selection.crop_opened)
    }

    /// Open the crop dialog explicitly. Returns the initial crop state.
    #[wasm_bindgen(js_name = openCrop)]
    pub fn open_crop(&self) -> Result<JsValue, JsValue> {
        let state = self
            .session
            .borrow_mut()
            .open_crop()
            .map_err(to_js_error)?;
        serde_wasm_bindgen::to_value(&state).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Current crop state, or `null` when no crop is open.
    #[wasm_bindgen(js_name = cropState)]
    pub fn crop_state(&self) -> Result<JsValue, JsValue> {
        match self.session.borrow().crop().state() {
            Some(state) => serde_wasm_bindgen::to_value(&state)
                .map_err(|e| JsValue::from_str(&e.to_string())),
            None => Ok(JsValue::NULL),
        }
    }

    pub fn zoom(&self, delta: f64) {
        self.session.borrow_mut().crop_mut().zoom(delta);
    }

    #[wasm_bindgen(js_name = zoomTo)]
    pub fn zoom_to(&self, level: f64) {
        self.session.borrow_mut().crop_mut().zoom_to(level);
    }

    pub fn rotate(&self, degrees: f64) {
        self.session.borrow_mut().crop_mut().rotate(degrees);
    }

    pub fn pan(&self, dx: f64, dy: f64) {
        self.session.borrow_mut().crop_mut().pan(dx, dy);
    }

    #[wasm_bindgen(js_name = resetCrop)]
    pub fn reset_crop(&self) {
        self.session.borrow_mut().crop_mut().reset();
    }

    #[wasm_bindgen(js_name = applyCrop)]
    pub fn apply_crop(&self) -> Result<(), JsValue> {
        self.session
            .borrow_mut()
            .apply_crop()
            .map(|_| ())
            .map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = cancelCrop)]
    pub fn cancel_crop(&self) {
        self.session.borrow_mut().cancel_crop();
    }

    /// Text for the file input label.
    #[wasm_bindgen(js_name = fileLabel)]
    pub fn file_label(&self) -> String {
        self.session.borrow().file_label()
    }

    /// Generate the poster. Resolves to a `JsPoster`; rejects with an `Error`
    /// whose message is meant for the user.
    pub fn generate(&self, first_name: String, last_name: String) -> Promise {
        let session = Rc::clone(&self.session);
        let source = Rc::clone(&self.source);
        let current_url = Rc::clone(&self.current_url);

        future_to_promise(async move {
            let request = session
                .borrow()
                .prepare_generation(&first_name, &last_name)
                .map_err(to_js_error)?;

            let outcome = request.run(source.as_ref()).await;

            let mut session = session.borrow_mut();
            let result = session
                .finish_generation(&request, outcome)
                .map_err(to_js_error)?;

            let url = object_url(result.png(), result.download().mime_type)?;
            if let Some(previous) = current_url.borrow_mut().replace(url.clone()) {
                revoke(&previous);
            }
            Ok(JsPoster::new(result, url).into())
        })
    }
}
