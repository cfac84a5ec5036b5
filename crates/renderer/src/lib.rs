//! Display rendering for raster previews.
//!
//! Turns decoded sample bands into a browser-ready image:
//! - Linear min/max stretch to 8 bits ([`normalize`])
//! - Channel padding and RGBA assembly ([`image`])
//! - Near-black transparency ([`mask`])
//! - PNG encoding, fast or size-optimized ([`png`])
//! - Base64 data-URI wrapping ([`data_uri`])

pub mod data_uri;
pub mod image;
pub mod mask;
pub mod normalize;
pub mod png;

pub use data_uri::{decode_png_data_uri, png_data_uri, PNG_DATA_URI_PREFIX};
pub use image::DisplayImage;
pub use normalize::{normalize_bands, NormalizationMode};
pub use png::PngOptions;
