//! WebAssembly bindings for a browser shell
//!
//! The browser shell owns `fetch`, `localStorage` and the wasm-bindgen kernel
//! module. It feeds serialized events and effect outputs in and executes the
//! effects that come back out.

use lazy_static::lazy_static;
use wasm_bindgen::{prelude::wasm_bindgen, JsValue};

use crux_core::{
    bridge::{Bridge, EffectId},
    Core,
};

use crate::App;

lazy_static! {
    static ref CORE: Bridge<App> = Bridge::new(Core::new());
}

/// Install the console logger when the module is instantiated
///
/// Initialization only fails when a logger is already installed.
#[wasm_bindgen(start)]
pub fn start() {
    let _ = console_log::init_with_level(log::Level::Debug);
}

/// Process a serialized `Event`, returning the serialized effect requests
#[wasm_bindgen]
pub fn process_event(event: &[u8]) -> Result<Vec<u8>, JsValue> {
    let mut requests = Vec::new();
    CORE.update(event, &mut requests)
        .map_err(|e| JsValue::from_str(&format!("failed to process event: {e}")))?;
    Ok(requests)
}

/// Resolve effect `id` with the serialized output of the shell
#[wasm_bindgen]
pub fn handle_response(id: u32, output: &[u8]) -> Result<Vec<u8>, JsValue> {
    let mut requests = Vec::new();
    CORE.resolve(EffectId(id), output, &mut requests)
        .map_err(|e| JsValue::from_str(&format!("failed to resolve effect {id}: {e}")))?;
    Ok(requests)
}

/// The serialized `TerminalView`
#[wasm_bindgen]
pub fn view() -> Result<Vec<u8>, JsValue> {
    let mut view = Vec::new();
    CORE.view(&mut view)
        .map_err(|e| JsValue::from_str(&format!("failed to render view: {e}")))?;
    Ok(view)
}

