//! Conversion between file bytes and wire text for the supported encodings.
//!
//! Backends use this to serve reads and apply writes the way a node-style
//! file server would: raw reads travel as base64, text reads are decoded
//! with the named encoding.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::options::Encoding;

/// Backend code for an encoding name the backend does not know.
pub const UNKNOWN_ENCODING: &str = "ERR_UNKNOWN_ENCODING";
/// Backend code for wire contents that do not decode under their encoding.
pub const INVALID_ARG_VALUE: &str = "ERR_INVALID_ARG_VALUE";

/// Failure converting between bytes and wire text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingError {
    /// Node-style error code.
    pub code: &'static str,
    /// Human-readable detail.
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextCodec {
    Utf8,
    Ascii,
    Latin1,
    Base64,
    Hex,
    Utf16Le,
}

impl TextCodec {
    fn from_name(name: &str) -> Result<Self, EncodingError> {
        match name.to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(Self::Utf8),
            "ascii" => Ok(Self::Ascii),
            "latin1" | "binary" => Ok(Self::Latin1),
            "base64" => Ok(Self::Base64),
            "hex" => Ok(Self::Hex),
            "utf16le" | "utf-16le" | "ucs2" | "ucs-2" => Ok(Self::Utf16Le),
            _ => Err(EncodingError {
                code: UNKNOWN_ENCODING,
                message: format!("Unknown encoding: {name}"),
            }),
        }
    }
}

/// Renders file bytes as wire text. Raw reads are base64.
///
/// # Errors
///
/// Returns an error for unknown encoding names.
pub fn bytes_to_wire(bytes: &[u8], encoding: &Encoding) -> Result<String, EncodingError> {
    let Encoding::Text(name) = encoding else {
        return Ok(STANDARD.encode(bytes));
    };
    Ok(match TextCodec::from_name(name)? {
        TextCodec::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
        TextCodec::Ascii => bytes.iter().map(|b| char::from(b & 0x7f)).collect(),
        TextCodec::Latin1 => bytes.iter().copied().map(char::from).collect(),
        TextCodec::Base64 => STANDARD.encode(bytes),
        TextCodec::Hex => bytes.iter().map(|b| format!("{b:02x}")).collect(),
        TextCodec::Utf16Le => {
            let units: Vec<u16> =
                bytes.chunks_exact(2).map(|pair| u16::from_le_bytes([pair[0], pair[1]])).collect();
            String::from_utf16_lossy(&units)
        }
    })
}

/// Turns wire text into the bytes to store. Raw writes of text store UTF-8.
///
/// # Errors
///
/// Returns an error for unknown encoding names or malformed base64.
pub fn wire_to_bytes(contents: &str, encoding: &Encoding) -> Result<Vec<u8>, EncodingError> {
    let Encoding::Text(name) = encoding else {
        return Ok(contents.as_bytes().to_vec());
    };
    match TextCodec::from_name(name)? {
        TextCodec::Utf8 => Ok(contents.as_bytes().to_vec()),
        // Truncation to the low byte is how latin1 and ascii writers behave.
        #[allow(clippy::cast_possible_truncation)]
        TextCodec::Ascii | TextCodec::Latin1 => {
            Ok(contents.chars().map(|c| c as u32 as u8).collect())
        }
        TextCodec::Base64 => STANDARD.decode(contents.trim()).map_err(|e| EncodingError {
            code: INVALID_ARG_VALUE,
            message: format!("invalid base64 contents: {e}"),
        }),
        TextCodec::Hex => Ok(decode_hex_prefix(contents)),
        TextCodec::Utf16Le => Ok(contents.encode_utf16().flat_map(u16::to_le_bytes).collect()),
    }
}

// Stops at the first pair that is not valid hex, like node's hex decoder.
fn decode_hex_prefix(contents: &str) -> Vec<u8> {
    contents
        .as_bytes()
        .chunks_exact(2)
        .map_while(|pair| {
            std::str::from_utf8(pair).ok().and_then(|s| u8::from_str_radix(s, 16).ok())
        })
        .collect()
}
