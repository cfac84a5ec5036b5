//! Base64 data-URI wrapping.

use base64::{engine::general_purpose, Engine as _};

pub const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// `data:image/png;base64,` followed by standard padded base64 of `png`.
pub fn png_data_uri(png: &[u8]) -> String {
    let mut uri = String::with_capacity(PNG_DATA_URI_PREFIX.len() + png.len().div_ceil(3) * 4);
    uri.push_str(PNG_DATA_URI_PREFIX);
    general_purpose::STANDARD.encode_string(png, &mut uri);
    uri
}

/// Decode the payload of a PNG data-URI. `None` if the prefix or base64 is wrong.
pub fn decode_png_data_uri(uri: &str) -> Option<Vec<u8>> {
    let payload = uri.strip_prefix(PNG_DATA_URI_PREFIX)?;
    general_purpose::STANDARD.decode(payload).ok()
}
