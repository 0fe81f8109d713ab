use std::io::Read;

use flate2::read::{GzDecoder, ZlibDecoder};

use crate::resolver_error::str_to_io_error;
use crate::utils::constants::{ENCODING_DEFLATE, ENCODING_GZIP};

pub const fn is_gzip(bytes: &[u8]) -> bool {
    // Gzip files start with the bytes 0x1F 0x8B
    bytes.len() >= 2 && bytes[0] == 0x1F && bytes[1] == 0x8B
}

pub const fn is_deflate(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[0] == 0x78 && (bytes[1] == 0x01 || bytes[1] == 0x9C || bytes[1] == 0xDA)
}

/// Sniffs the payload, the magic bytes win over a declared `Content-Encoding`.
pub fn detect_encoding(bytes: &[u8], declared: Option<&str>) -> Option<String> {
    if is_gzip(bytes) {
        Some(ENCODING_GZIP.to_string())
    } else if is_deflate(bytes) {
        Some(ENCODING_DEFLATE.to_string())
    } else {
        declared.map(str::to_lowercase)
    }
}

/// Decodes a text body, `None` as encoding means plain utf-8.
pub fn decode_text(bytes: &[u8], encoding: Option<&str>) -> std::io::Result<String> {
    let mut decode_buffer = String::new();
    match encoding {
        Some(ENCODING_GZIP) => {
            GzDecoder::new(bytes).read_to_string(&mut decode_buffer)
                .map_err(|err| str_to_io_error(&format!("failed to decode gzip content {err}")))?;
        }
        Some(ENCODING_DEFLATE) => {
            ZlibDecoder::new(bytes).read_to_string(&mut decode_buffer)
                .map_err(|err| str_to_io_error(&format!("failed to decode zlib content {err}")))?;
        }
        _ => {
            decode_buffer = String::from_utf8(bytes.to_vec())
                .map_err(|err| str_to_io_error(&format!("failed to plain text content {err}")))?;
        }
    }
    Ok(decode_buffer)
}
