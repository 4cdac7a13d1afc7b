//! Reversible packing of serialized payloads into URL-safe token bodies.
//!
//! A token body is `base64url(zstd(json))` with no padding, so it survives
//! URL fragments, copy-paste, and chat clients without escaping. Compression
//! matters here: the whole game state has to fit comfortably inside common
//! browser URL limits, and JSON state is highly compressible.
//!
//! Unpacking is guarded by a decompressed-size limit so a short hostile token
//! cannot expand into an arbitrarily large allocation. The limit comes from
//! [`ProtocolConfig::max_payload_len`](crate::ProtocolConfig).

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use std::io::Read;

use crate::error::DecompressReason;
use crate::error::SyncError;

/// zstd level used for token bodies. Tokens are tiny and encoded once per
/// turn, so the slowest/densest setting is the right trade.
const COMPRESSION_LEVEL: i32 = 19;

/// Packs payload bytes into a URL-safe token body.
pub fn pack(payload: &[u8]) -> Result<String, SyncError> {
    let compressed = zstd::encode_all(payload, COMPRESSION_LEVEL)
        .map_err(|e| SyncError::serialization(format!("compression failed: {e}")))?;
    Ok(URL_SAFE_NO_PAD.encode(compressed))
}

/// Unpacks a token body back into payload bytes.
///
/// # Errors
///
/// Returns a [`SyncError::DecompressionFailure`] when the body is not valid
/// URL-safe base64, the compressed frame is corrupt, or the decompressed
/// payload would exceed `max_payload_len`.
pub fn unpack(body: &str, max_payload_len: usize) -> Result<Vec<u8>, SyncError> {
    let compressed = URL_SAFE_NO_PAD
        .decode(body)
        .map_err(|_| DecompressReason::InvalidBase64)?;

    let decoder =
        zstd::Decoder::new(compressed.as_slice()).map_err(|_| DecompressReason::CorruptPayload)?;

    // Read one byte past the limit so an oversized payload is distinguishable
    // from one that is exactly at it.
    let mut payload = Vec::new();
    decoder
        .take(max_payload_len as u64 + 1)
        .read_to_end(&mut payload)
        .map_err(|_| DecompressReason::CorruptPayload)?;

    if payload.len() > max_payload_len {
        return Err(DecompressReason::OversizedPayload {
            limit: max_payload_len,
        }
        .into());
    }

    Ok(payload)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const MAX: usize = 256 * 1024;

    #[test]
    fn pack_unpack_roundtrip() {
        let payload = br#"{"game_id":"g-1","turn":7,"chain":["a","b","c"]}"#;
        let body = pack(payload).unwrap();
        assert_eq!(unpack(&body, MAX).unwrap(), payload);
    }

    #[test]
    fn body_is_url_safe() {
        let payload = vec![0xFFu8; 512];
        let body = pack(&payload).unwrap();
        assert!(body
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn unpack_rejects_invalid_base64() {
        let err = unpack("not base64 ???", MAX).unwrap_err();
        assert!(matches!(
            err,
            SyncError::DecompressionFailure {
                reason: DecompressReason::InvalidBase64
            }
        ));
    }

    #[test]
    fn unpack_rejects_corrupt_frame() {
        // Valid base64 that is not a zstd frame.
        let body = URL_SAFE_NO_PAD.encode(b"definitely not zstd");
        let err = unpack(&body, MAX).unwrap_err();
        assert!(matches!(
            err,
            SyncError::DecompressionFailure {
                reason: DecompressReason::CorruptPayload
            }
        ));
    }

    #[test]
    fn unpack_rejects_truncated_frame() {
        let body = pack(b"some payload that compresses").unwrap();
        let truncated: String = body.chars().take(body.len() / 2).collect();
        assert!(unpack(&truncated, MAX).is_err());
    }

    #[test]
    fn unpack_enforces_size_guard() {
        let payload = vec![b'a'; 4096];
        let body = pack(&payload).unwrap();

        let err = unpack(&body, 1024).unwrap_err();
        assert!(matches!(
            err,
            SyncError::DecompressionFailure {
                reason: DecompressReason::OversizedPayload { limit: 1024 }
            }
        ));

        // Exactly at the limit is fine.
        assert_eq!(unpack(&body, 4096).unwrap().len(), 4096);
    }

    #[test]
    fn repetitive_json_compresses_well() {
        // States are JSON with long repeated key names; the token must end up
        // much smaller than the raw payload for the URL budget to hold.
        let payload = br#"{"cells":[null,null,null,null,null,null,null,null,null]}"#.repeat(8);
        let body = pack(&payload).unwrap();
        assert!(body.len() < payload.len() / 2);
    }
}

// =============================================================================
// Property-Based Tests
// =============================================================================
