//! Decoding of the image carried in an invocation body.

use image::RgbImage;

use crate::error::{Result, ServeError};

/// Base64 bytes of a body shaped like `data:image/png;base64,<data>`.
///
/// The body is split on `;` and the second segment is split on `,`; the
/// second piece of that is the payload. Everything else is ignored, and so
/// are characters outside the base64 alphabet (line breaks of wrapped
/// payloads, stray whitespace).
pub fn decode_data_uri(encoding: &str) -> Result<Vec<u8>> {
    let content = encoding
        .split(';')
        .nth(1)
        .ok_or_else(|| ServeError::payload("expected '<meta>;<meta>,<base64 data>'"))?;
    let encoded = content
        .split(',')
        .nth(1)
        .ok_or_else(|| ServeError::payload("no ',' before the base64 data"))?;

    let alphabet_only: String = encoded
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '='))
        .collect();

    Ok(base64::decode(alphabet_only)?)
}

/// Parse encoded image bytes in any supported format as 8-bit RGB.
pub fn decode_bytes_to_image(data: &[u8]) -> Result<RgbImage> {
    Ok(image::load_from_memory(data)?.to_rgb8())
}

pub fn decode_base64_to_image(encoding: &str) -> Result<RgbImage> {
    decode_bytes_to_image(&decode_data_uri(encoding)?)
}
