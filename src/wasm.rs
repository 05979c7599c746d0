use image::GenericImageView;
use js_sys::{Array, Object, Promise, Reflect};
use log::{Level, LevelFilter, Log, Metadata, Record, error, info, warn};
use std::fmt::Debug;
use std::sync::Arc;
use wasm_bindgen::prelude::*;

use crate::color::ColorEntry;
use crate::decode::{decode_image, is_image_mime};
use crate::sampler::extract_palette as sample_palette;
use crate::state::{Event, ImagePreview, ImageSource, WidgetState};

#[wasm_bindgen]
extern "C" {
    // Throws synchronously when `navigator.clipboard` is missing (plain http pages).
    #[wasm_bindgen(catch, js_namespace = ["navigator", "clipboard"], js_name = writeText)]
    fn clipboard_write_text(text: &str) -> Result<Promise, JsValue>;

    #[wasm_bindgen(js_namespace = console, js_name = error)]
    fn console_error(msg: &str);
    #[wasm_bindgen(js_namespace = console, js_name = warn)]
    fn console_warn(msg: &str);
    #[wasm_bindgen(js_namespace = console, js_name = log)]
    fn console_log(msg: &str);
}

// ------------------------------------------------------------
// Console logging
// ------------------------------------------------------------

struct ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let msg = format!("[{}] {}", record.target(), record.args());
        match record.level() {
            Level::Error => console_error(&msg),
            Level::Warn => console_warn(&msg),
            _ => console_log(&msg),
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

/// Route `log` output to the browser console. Safe to call more than once.
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging(verbose: bool) {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(if verbose { LevelFilter::Debug } else { LevelFilter::Info });
    }
}

// ------------------------------------------------------------
// JS conversion
//
// Everything below that builds `Object`/`Array` values calls into the JS
// host, so it only runs on wasm32; the native tests stop at the Rust state.
// ------------------------------------------------------------

fn entry_to_js(entry: &ColorEntry) -> Result<Object, JsValue> {
    let obj = Object::new();
    Reflect::set(&obj, &JsValue::from_str("hex"), &JsValue::from_str(&entry.hex))?;
    Reflect::set(&obj, &JsValue::from_str("rgb"), &JsValue::from_str(&entry.rgb_string()))?;
    // exact below 2^53
    Reflect::set(&obj, &JsValue::from_str("count"), &JsValue::from_f64(entry.count as f64))?;
    Ok(obj)
}

fn entries_to_js(entries: &[ColorEntry]) -> Result<Array, JsValue> {
    let out = Array::new();
    for entry in entries {
        let obj = entry_to_js(entry)?;
        out.push(&obj);
    }
    Ok(out)
}

/// One-shot extraction: decode `input` and return `[{hex, rgb, count}]`,
/// most common color first.
#[wasm_bindgen(js_name = extractPalette)]
pub fn extract_palette(input: Vec<u8>) -> Result<Array, JsValue> {
    let img = decode_image(&input).map_err(|e| JsValue::from_str(&e.to_string()))?;
    entries_to_js(sample_palette(&img).colors())
}

/// Copy `hex` to the system clipboard. A missing clipboard or a rejected
/// write is logged and swallowed, so the returned promise always resolves.
#[wasm_bindgen(js_name = copyToClipboard)]
pub fn copy_to_clipboard(hex: &str) -> Promise {
    let Some(write) = started_write(hex, clipboard_write_text(hex)) else {
        return Promise::resolve(&JsValue::UNDEFINED);
    };
    let hex_owned = hex.to_string();
    let on_error = Closure::once(move |err: JsValue| {
        error!("Failed to copy {hex_owned}: {err:?}");
    });
    let promise = write.catch(&on_error);
    // the rejection handler may run after we return; one small closure per click
    on_error.forget();
    promise
}

/// Unwraps a clipboard write that started, logging one that threw up front.
fn started_write<P, E: Debug>(hex: &str, attempt: Result<P, E>) -> Option<P> {
    attempt
        .inspect_err(|err| error!("Failed to copy {hex}: clipboard unavailable ({err:?})"))
        .ok()
}

// ------------------------------------------------------------
// Widget
// ------------------------------------------------------------

/// State holder behind the drop zone and swatch grid. The page forwards DOM
/// events here and re-renders from the getters.
#[wasm_bindgen]
pub struct PaletteWidget {
    state: WidgetState,
}

impl PaletteWidget {
    fn dispatch(&mut self, event: Event) {
        let state = std::mem::take(&mut self.state);
        self.state = state.next(event);
    }
}

#[wasm_bindgen]
impl PaletteWidget {
    #[wasm_bindgen(constructor)]
    pub fn new() -> PaletteWidget {
        PaletteWidget {
            state: WidgetState::new(),
        }
    }

    #[wasm_bindgen(js_name = dragOver)]
    pub fn drag_over(&mut self) {
        self.dispatch(Event::DragEntered);
    }

    #[wasm_bindgen(js_name = dragLeave)]
    pub fn drag_leave(&mut self) {
        self.dispatch(Event::DragLeft);
    }

    /// Start handling a dropped or picked file. Returns false when the file
    /// is not an image or another one is still loading; the page should only
    /// read the file's bytes and call `loadImage` when this returns true.
    #[wasm_bindgen(js_name = selectImage)]
    pub fn select_image(&mut self, name: &str, mime: &str) -> bool {
        if !is_image_mime(mime) {
            warn!("rejecting {name}: {mime:?} is not an image type");
            self.dispatch(Event::DragLeft);
            return false;
        }
        if self.state.is_loading() {
            self.dispatch(Event::DragLeft);
            return false;
        }
        self.dispatch(Event::ImageSelected(ImageSource::new(name, mime)));
        true
    }

    /// Decode the selected file's bytes and settle the pending selection.
    #[wasm_bindgen(js_name = loadImage)]
    pub fn load_image(&mut self, bytes: Vec<u8>) {
        let event = match decode_image(&bytes) {
            Ok(img) => {
                let palette = sample_palette(&img);
                info!("extracted {} colors from {} samples", palette.len(), palette.samples());
                let (width, height) = img.dimensions();
                Event::ExtractionCompleted {
                    preview: ImagePreview::new(bytes, width, height),
                    palette,
                }
            }
            Err(e) => {
                error!("{e}");
                Event::ExtractionFailed(Arc::new(e))
            }
        };
        self.dispatch(event);
    }

    pub fn reset(&mut self) {
        self.dispatch(Event::Reset);
    }

    pub fn colors(&self) -> Result<Array, JsValue> {
        entries_to_js(self.state.colors())
    }

    #[wasm_bindgen(js_name = isLoading)]
    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    #[wasm_bindgen(js_name = isDragging)]
    pub fn is_dragging(&self) -> bool {
        self.state.is_dragging()
    }

    /// One of `empty`, `loading`, `ready`, `failed`.
    pub fn status(&self) -> String {
        self.state.status().to_string()
    }

    #[wasm_bindgen(js_name = fileName)]
    pub fn file_name(&self) -> Option<String> {
        self.state.source().map(|s| s.name.clone())
    }

    /// Original file bytes of the current image, for the preview beside the palette.
    #[wasm_bindgen(js_name = imageBytes)]
    pub fn image_bytes(&self) -> Option<Vec<u8>> {
        self.state.preview().map(|p| p.bytes.to_vec())
    }

    #[wasm_bindgen(js_name = imageWidth)]
    pub fn image_width(&self) -> Option<u32> {
        self.state.preview().map(|p| p.width)
    }

    #[wasm_bindgen(js_name = imageHeight)]
    pub fn image_height(&self) -> Option<u32> {
        self.state.preview().map(|p| p.height)
    }

    /// MIME hint of the selected file, for building the preview `Blob`.
    #[wasm_bindgen(js_name = imageMime)]
    pub fn image_mime(&self) -> Option<String> {
        self.state.source().map(|s| s.mime.clone())
    }

    #[wasm_bindgen(js_name = errorMessage)]
    pub fn error_message(&self) -> Option<String> {
        self.state.error().map(|e| e.to_string())
    }

    /// Click handler for swatch `index`.
    #[wasm_bindgen(js_name = copyColor)]
    pub fn copy_color(&self, index: usize) -> Promise {
        match self.swatch_hex(index) {
            Some(hex) => copy_to_clipboard(&hex),
            None => Promise::resolve(&JsValue::UNDEFINED),
        }
    }

    #[wasm_bindgen(js_name = swatchHex)]
    pub fn swatch_hex(&self, index: usize) -> Option<String> {
        let hex = self.state.colors().get(index).map(|entry| entry.hex.clone());
        if hex.is_none() {
            warn!("no swatch at index {index}");
        }
        hex
    }
}

impl Default for PaletteWidget {
    fn default() -> Self {
        Self::new()
    }
}
