//! Content fingerprinting using BLAKE3

use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A content fingerprint using BLAKE3 (256-bit).
///
/// Used strictly for change detection by equality comparison, never for
/// security guarantees. Serializes as a lowercase hex string so it can live
/// inside the JSON signature index of a document.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Fingerprint arbitrary bytes. Empty input is valid.
    #[must_use]
    pub fn from_bytes(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Construct from a raw digest.
    #[must_use]
    pub fn from_raw(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse from a hex string.
    ///
    /// # Errors
    /// Returns an error if the input is not 64 hex characters.
    pub fn from_hex(s: &str) -> color_eyre::Result<Self> {
        let bytes = hex::decode(s)?;
        let raw: [u8; 32] = bytes
            .try_into()
            .map_err(|_| color_eyre::eyre::eyre!("fingerprint must be 32 bytes"))?;
        Ok(Self(raw))
    }

    /// Get raw bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for Fingerprint {
    type Err = color_eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "Fingerprint({})", hex.get(..16).unwrap_or(&hex))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "{}", hex.get(..16).unwrap_or(&hex))
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(|e| D::Error::custom(format!("invalid fingerprint: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_deterministic() {
        let data = b"hello world";
        let h1 = Fingerprint::from_bytes(data);
        let h2 = Fingerprint::from_bytes(data);
        assert_eq!(h1, h2);
    }

    #[test]
    fn test_fingerprint_different_data() {
        let h1 = Fingerprint::from_bytes(b"hello");
        let h2 = Fingerprint::from_bytes(b"world");
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_empty_input_is_valid() {
        let h = Fingerprint::from_bytes(b"");
        assert_eq!(h, Fingerprint::from_bytes(b""));
        assert_eq!(h.to_hex().len(), 64);
    }

    #[test]
    fn test_hex_roundtrip() {
        let h = Fingerprint::from_bytes(b"some content");
        let parsed = Fingerprint::from_hex(&h.to_hex()).unwrap();
        assert_eq!(h, parsed);
    }

    #[test]
    fn test_serde_as_hex_string() {
        let h = Fingerprint::from_bytes(b"x");
        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(json, format!("\"{}\"", h.to_hex()));

        let back: Fingerprint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, h);
    }

    #[test]
    fn test_invalid_hex_rejected() {
        assert!(Fingerprint::from_hex("not hex").is_err());
        assert!(Fingerprint::from_hex("abcd").is_err());
    }
}
