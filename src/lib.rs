//! Pull the most common colors out of a screenshot.
//!
//! The image is read on a coarse grid (stride = shorter side / 50), every
//! sampled pixel is counted by its exact `#RRGGBB` value, and the 20 most
//! frequent colors come back most common first. Ties keep the order in which
//! the grid walk (column by column, top to bottom) first met them.
//!
//! The same code backs the browser widget (see [`wasm`]) and the
//! `palette-cli` binary.

pub mod color;
pub mod decode;
pub mod sampler;
pub mod state;
pub mod wasm;

pub use color::{ColorEntry, ColorError, hex_code, parse_hex};
pub use decode::{
    DecodeError, decode_image, extract_from_bytes, extract_from_bytes_with, is_image_mime,
    resolve_mime,
};
#[cfg(feature = "native-bin")]
pub use decode::decode_task;
pub use sampler::{
    DEFAULT_GRID_DIVISOR, DEFAULT_MAX_COLORS, Palette, PixelBuffer, Sampler, extract_palette,
};
pub use state::{Event, ImagePreview, ImageSource, Phase, WidgetState};
