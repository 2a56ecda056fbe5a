//! Opaque, URL-safe keyset pagination tokens.
//!
//! A token encodes a `(created_at, id)` pair so that `query`'s keyset scan
//! can resume exactly where the previous page left off. The encoding is
//! deterministic within a build but carries no cross-version guarantee.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::time::to_rfc3339_z;

/// Encodes a `(created_at, id)` pair into an opaque, URL-safe token.
pub fn encode_after_key(created_at: &DateTime<Utc>, id: i64) -> String {
    let raw = format!("{}|{}", to_rfc3339_z(created_at), id);
    URL_SAFE_NO_PAD.encode(raw.as_bytes())
}

/// Decodes a token produced by [`encode_after_key`] back into its pair.
pub fn decode_after_key(token: &str) -> Result<(DateTime<Utc>, i64)> {
    let bytes = URL_SAFE_NO_PAD
        .decode(token.as_bytes())
        .map_err(|e| Error::InvalidToken(e.to_string()))?;
    let text = String::from_utf8(bytes).map_err(|e| Error::InvalidToken(e.to_string()))?;
    let (ts_part, id_part) = text
        .split_once('|')
        .ok_or_else(|| Error::InvalidToken(token.to_string()))?;
    let created_at = crate::time::parse_utc(ts_part)
        .map_err(|_| Error::InvalidToken(token.to_string()))?
        .ok_or_else(|| Error::InvalidToken(token.to_string()))?;
    let id: i64 = id_part
        .parse()
        .map_err(|_| Error::InvalidToken(token.to_string()))?;
    Ok((created_at, id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn round_trips_valid_pair() {
        let ts = Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap();
        let token = encode_after_key(&ts, 42);
        let (decoded_ts, decoded_id) = decode_after_key(&token).unwrap();
        assert_eq!(decoded_ts, ts);
        assert_eq!(decoded_id, 42);
    }

    #[test]
    fn token_is_url_safe() {
        let ts = Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap();
        let token = encode_after_key(&ts, 1);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn rejects_garbage_token() {
        let err = decode_after_key("not-valid-base64!!!").unwrap_err();
        assert!(matches!(err, Error::InvalidToken(_)));
    }

    #[test]
    fn rejects_truncated_token() {
        let bad = URL_SAFE_NO_PAD.encode(b"2025-05-01T12:00:00Z");
        let err = decode_after_key(&bad).unwrap_err();
        assert!(matches!(err, Error::InvalidToken(_)));
    }
}
