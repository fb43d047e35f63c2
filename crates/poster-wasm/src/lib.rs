//! Poster WASM - WebAssembly bindings for the poster generator
//!
//! This crate exposes poster-core to the page that collects the name and the
//! photo.
//!
//! # Module Structure
//!
//! - `app` - `PosterApp`, the session object the page talks to
//! - `fetch` - `fetch`-backed asset source for the template and background
//! - `export` - Blob object URLs for preview and download
//! - `types` - `JsPoster`, the generated poster as seen from JavaScript
//!
//! # Usage
//!
//! ```typescript
//! import init, { PosterApp } from '@poster/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! const app = new PosterApp(undefined, "");
//! // Optional: the name falls back to the bundled DejaVu Sans Bold
//! app.addFont(new Uint8Array(await (await fetch("ArialBlack.ttf")).arrayBuffer()));
//! ```

use wasm_bindgen::prelude::*;

mod app;
mod export;
mod fetch;
mod types;

pub use app::PosterApp;
pub use fetch::FetchSource;
pub use types::JsPoster;

/// Initialize the WASM module (called automatically on load)
///
/// Routes `tracing` output to the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    use tracing_subscriber::prelude::*;
    use tracing_web::MakeWebConsoleWriter;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .without_time()
        .with_writer(MakeWebConsoleWriter::new());

    // A second init (e.g. hot reload) keeps the first subscriber
    let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
