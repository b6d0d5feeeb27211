//! LZMA archive codec (C3).
//!
//! Compresses a structured message's binary-encoded form with LZMA and
//! base64-encodes the result into a URL-safe string, for embedding in a
//! pairing URI's `jsonData` parameter or a `.vult` container body. Must
//! round-trip bit-exact (spec §4.3).

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine;
use std::io::{Read, Write};
use vultisig_core::{Result, VultisigError};
use xz2::read::XzDecoder;
use xz2::write::XzEncoder;

/// LZMA preset matching the "7-zip" compression level used by the reference
/// implementation.
const LZMA_PRESET: u32 = 6;

/// Compress `bytes` with LZMA.
pub fn compress(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = XzEncoder::new(Vec::new(), LZMA_PRESET);
    encoder
        .write_all(bytes)
        .map_err(|e| VultisigError::protocol(format!("LZMA compression failed: {e}")))?;
    encoder
        .finish()
        .map_err(|e| VultisigError::protocol(format!("LZMA compression failed: {e}")))
}

/// Decompress an LZMA stream produced by [`compress`].
pub fn decompress(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = XzDecoder::new(bytes);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| VultisigError::protocol(format!("LZMA decompression failed: {e}")))?;
    Ok(out)
}

/// Compress then base64-encode (URL-safe, unpadded) — the form embedded in
/// a `vultisig://` pairing URI.
pub fn compress_to_base64_urlsafe(bytes: &[u8]) -> Result<String> {
    Ok(URL_SAFE.encode(compress(bytes)?))
}

/// Inverse of [`compress_to_base64_urlsafe`].
pub fn decompress_from_base64_urlsafe(encoded: &str) -> Result<Vec<u8>> {
    let compressed = URL_SAFE
        .decode(encoded.trim())
        .map_err(|e| VultisigError::protocol(format!("invalid base64: {e}")))?;
    decompress(&compressed)
}

/// Compress then base64-encode with the standard alphabet, used by the
/// vault container's outer text framing.
pub fn compress_to_base64_standard(bytes: &[u8]) -> Result<String> {
    Ok(STANDARD.encode(compress(bytes)?))
}

/// Inverse of [`compress_to_base64_standard`].
pub fn decompress_from_base64_standard(encoded: &str) -> Result<Vec<u8>> {
    let compressed = STANDARD
        .decode(encoded.trim())
        .map_err(|e| VultisigError::protocol(format!("invalid base64: {e}")))?;
    decompress(&compressed)
}
