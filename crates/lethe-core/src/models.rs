//! Persisted data model: media kinds and sealed media records.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::{Error, Result};
use crate::uuid_utils::new_v7;

/// Width of the per-record content key (AES-256).
pub const CONTENT_KEY_LEN: usize = 32;

/// Width of the plaintext integrity digest (SHA-256).
pub const DIGEST_LEN: usize = 32;

// =============================================================================
// MEDIA KIND
// =============================================================================

/// Closed set of media kinds. A record's kind selects its storage partition
/// and never changes after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Video,
    Audio,
    Text,
}

impl MediaKind {
    /// Every kind, in partition order.
    pub const ALL: [MediaKind; 4] = [
        MediaKind::Photo,
        MediaKind::Video,
        MediaKind::Audio,
        MediaKind::Text,
    ];

    /// Partition name (lowercase).
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Photo => "photo",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Text => "text",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "photo" => Ok(MediaKind::Photo),
            "video" => Ok(MediaKind::Video),
            "audio" => Ok(MediaKind::Audio),
            "text" => Ok(MediaKind::Text),
            other => Err(Error::InvalidInput(format!("Unknown media kind: {}", other))),
        }
    }
}

// =============================================================================
// ENCRYPTED CONTENT
// =============================================================================

/// Output of inner (per-object) encryption: the ciphertext token, the random
/// key that sealed it and the digest of the original plaintext.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptedContent {
    pub ciphertext: Vec<u8>,
    pub key: [u8; CONTENT_KEY_LEN],
    pub digest: [u8; DIGEST_LEN],
}

impl fmt::Debug for EncryptedContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptedContent")
            .field("ciphertext_len", &self.ciphertext.len())
            .field("key", &"[REDACTED]")
            .field("digest", &hex::encode(self.digest))
            .finish()
    }
}

// =============================================================================
// MEDIA RECORD
// =============================================================================

/// The persisted unit of the vault.
///
/// `cipher_content` is always the inner-encrypted payload; the plaintext is
/// never stored. `content_key` lives next to the ciphertext it unlocks:
/// protection against a copied store comes from the outer, host-keyed layer.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRecord {
    pub id: String,
    pub media_kind: MediaKind,
    pub owner_id: String,
    #[serde(with = "base64_bytes_vec")]
    pub cipher_content: Vec<u8>,
    #[serde(with = "base64_bytes")]
    pub content_key: [u8; CONTENT_KEY_LEN],
    #[serde(with = "hex_digest")]
    pub integrity_digest: [u8; DIGEST_LEN],
    pub time_created: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_last_loaded: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_last_parsed: Option<DateTime<Utc>>,
}

impl MediaRecord {
    /// Build a record from freshly encrypted content.
    ///
    /// Fails if `id` is not usable as a partition key.
    pub fn new(
        id: impl Into<String>,
        media_kind: MediaKind,
        owner_id: impl Into<String>,
        content: EncryptedContent,
        time_created: DateTime<Utc>,
    ) -> Result<Self> {
        let id = id.into();
        validate_media_id(&id)?;
        Ok(Self {
            id,
            media_kind,
            owner_id: owner_id.into(),
            cipher_content: content.ciphertext,
            content_key: content.key,
            integrity_digest: content.digest,
            time_created,
            time_last_loaded: None,
            time_last_parsed: None,
        })
    }

    /// Generate a fresh, time-ordered media id.
    pub fn generate_id() -> String {
        new_v7().to_string()
    }

    /// Hex form of the plaintext digest (for audit logs).
    pub fn digest_hex(&self) -> String {
        hex::encode(self.integrity_digest)
    }
}

impl fmt::Debug for MediaRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaRecord")
            .field("id", &self.id)
            .field("media_kind", &self.media_kind)
            .field("owner_id", &self.owner_id)
            .field("cipher_content_len", &self.cipher_content.len())
            .field("content_key", &"[REDACTED]")
            .field("integrity_digest", &self.digest_hex())
            .field("time_created", &self.time_created)
            .field("time_last_loaded", &self.time_last_loaded)
            .field("time_last_parsed", &self.time_last_parsed)
            .finish()
    }
}

/// Check that an id can be used as a partition key on every backend.
///
/// Accepts ASCII alphanumerics plus `-`, `_` and `.`; rejects empty ids,
/// `.`/`..`, and ids longer than [`defaults::MEDIA_ID_MAX_LENGTH`].
pub fn validate_media_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(Error::InvalidInput("Media id must not be empty".into()));
    }
    if id.len() > defaults::MEDIA_ID_MAX_LENGTH {
        return Err(Error::InvalidInput(format!(
            "Media id exceeds {} bytes",
            defaults::MEDIA_ID_MAX_LENGTH
        )));
    }
    if id == "." || id == ".." {
        return Err(Error::InvalidInput(format!("Invalid media id: {}", id)));
    }
    if let Some(c) = id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(Error::InvalidInput(format!(
            "Media id contains invalid character {:?}",
            c
        )));
    }
    Ok(())
}

// =============================================================================
// STATUS REPORTS
// =============================================================================

/// Decay evaluation for one record at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecayStatus {
    pub age_minutes: f64,
    pub probability: f64,
    pub expired: bool,
}

/// Decay evaluation plus the record's identity and access timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaStatus {
    pub media_id: String,
    pub media_kind: MediaKind,
    #[serde(flatten)]
    pub decay: DecayStatus,
    pub time_created: DateTime<Utc>,
    pub time_last_loaded: Option<DateTime<Utc>>,
    pub time_last_parsed: Option<DateTime<Utc>>,
}

// =============================================================================
// SERDE HELPERS
// =============================================================================

/// Serde helper for base64-encoded fixed 32-byte arrays.
mod base64_bytes {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        serializer.serialize_str(&encoded)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; 32], D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(&s)
            .map_err(serde::de::Error::custom)?;
        <[u8; 32]>::try_from(bytes.as_slice()).map_err(|_| {
            serde::de::Error::custom(format!("Expected 32 bytes, got {}", bytes.len()))
        })
    }
}

/// Serde helper for base64-encoded Vec<u8>.
mod base64_bytes_vec {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        serializer.serialize_str(&encoded)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD
            .decode(&s)
            .map_err(serde::de::Error::custom)
    }
}

/// Serde helper for lowercase-hex 32-byte digests.
mod hex_digest {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; 32], D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let mut out = [0u8; 32];
        hex::decode_to_slice(&s, &mut out).map_err(serde::de::Error::custom)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_content() -> EncryptedContent {
        EncryptedContent {
            ciphertext: vec![1, 2, 3, 4],
            key: [7u8; CONTENT_KEY_LEN],
            digest: [9u8; DIGEST_LEN],
        }
    }

    fn sample_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_media_kind_as_str() {
        assert_eq!(MediaKind::Photo.as_str(), "photo");
        assert_eq!(MediaKind::Video.as_str(), "video");
        assert_eq!(MediaKind::Audio.as_str(), "audio");
        assert_eq!(MediaKind::Text.as_str(), "text");
    }

    #[test]
    fn test_media_kind_from_str() {
        assert_eq!("photo".parse::<MediaKind>().unwrap(), MediaKind::Photo);
        assert_eq!(" Video ".parse::<MediaKind>().unwrap(), MediaKind::Video);
        assert!("gif".parse::<MediaKind>().is_err());
    }

    #[test]
    fn test_media_kind_serializes_lowercase() {
        let json = serde_json::to_string(&MediaKind::Audio).unwrap();
        assert_eq!(json, "\"audio\"");
    }

    #[test]
    fn test_media_kind_all_is_complete() {
        assert_eq!(MediaKind::ALL.len(), 4);
        for kind in MediaKind::ALL {
            assert_eq!(kind.as_str().parse::<MediaKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_record_new_sets_fields() {
        let record =
            MediaRecord::new("m-1", MediaKind::Photo, "user-1", sample_content(), sample_time())
                .unwrap();
        assert_eq!(record.id, "m-1");
        assert_eq!(record.media_kind, MediaKind::Photo);
        assert_eq!(record.owner_id, "user-1");
        assert_eq!(record.cipher_content, vec![1, 2, 3, 4]);
        assert_eq!(record.time_created, sample_time());
        assert!(record.time_last_loaded.is_none());
        assert!(record.time_last_parsed.is_none());
    }

    #[test]
    fn test_record_new_rejects_bad_id() {
        let result = MediaRecord::new(
            "../escape",
            MediaKind::Text,
            "user-1",
            sample_content(),
            sample_time(),
        );
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_record_json_roundtrip_preserves_bytes() {
        let mut record =
            MediaRecord::new("m-2", MediaKind::Audio, "user-2", sample_content(), sample_time())
                .unwrap();
        record.time_last_loaded = Some(sample_time());

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains(&"09".repeat(32)));
        assert!(!json.contains("time_last_parsed"));

        let parsed: MediaRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_record_rejects_short_key() {
        let record =
            MediaRecord::new("m-3", MediaKind::Video, "user-3", sample_content(), sample_time())
                .unwrap();
        let mut value = serde_json::to_value(&record).unwrap();
        value["content_key"] = serde_json::Value::String("AAAA".into());
        let result: std::result::Result<MediaRecord, _> = serde_json::from_value(value);
        assert!(result.is_err());
    }

    #[test]
    fn test_record_debug_redacts_key() {
        let record =
            MediaRecord::new("m-4", MediaKind::Photo, "user-4", sample_content(), sample_time())
                .unwrap();
        let debug = format!("{:?}", record);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("[7, 7"));
    }

    #[test]
    fn test_generate_id_is_valid_and_unique() {
        let a = MediaRecord::generate_id();
        let b = MediaRecord::generate_id();
        assert_ne!(a, b);
        assert!(validate_media_id(&a).is_ok());
    }

    #[test]
    fn test_validate_media_id() {
        assert!(validate_media_id("photo_001.raw").is_ok());
        assert!(validate_media_id("").is_err());
        assert!(validate_media_id(".").is_err());
        assert!(validate_media_id("..").is_err());
        assert!(validate_media_id("a/b").is_err());
        assert!(validate_media_id("a\\b").is_err());
        assert!(validate_media_id(&"x".repeat(defaults::MEDIA_ID_MAX_LENGTH)).is_ok());
        assert!(validate_media_id(&"x".repeat(defaults::MEDIA_ID_MAX_LENGTH + 1)).is_err());
    }
}
