//! Web client support for the finance tracker.

pub mod services;

pub use services::logging::{install_global_handlers, BrowserLogger};

use wasm_bindgen::prelude::wasm_bindgen;

/// Entry point: report uncaught browser errors to the server
#[wasm_bindgen(start)]
pub fn start() {
    install_global_handlers(&BrowserLogger::default());
}
