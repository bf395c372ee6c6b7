//! # Domain Identity Newtypes
//!
//! Newtype wrappers for identifiers. These prevent accidental confusion:
//! a `CourseId` cannot be passed where a `CertificateKey` is expected, and
//! an author identity is never a bare string.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Field, ValidationError};

/// Opaque lookup handle for a certificate record.
///
/// Freshly issued keys are 64 lowercase hex characters (a SHA-256 digest,
/// see [`crate::keygen`]). Keys read back from a datastore are accepted as
/// stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CertificateKey(String);

impl CertificateKey {
    /// Length of a derived key in hex characters.
    pub const LEN: usize = 64;

    /// Parse a caller-supplied key, trimming whitespace and requiring the
    /// derived-key shape.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::BlankKey);
        }
        let well_formed = trimmed.len() == Self::LEN
            && trimmed
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !well_formed {
            return Err(ValidationError::OutOfRange {
                field: Field::CertificateKey,
                reason: format!("must be {} lowercase hex characters", Self::LEN),
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub(crate) fn from_digest(bytes: &[u8]) -> Self {
        Self(bytes.iter().map(|b| format!("{b:02x}")).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight characters, for log lines.
    pub fn short(&self) -> &str {
        self.0.get(..8).unwrap_or(&self.0)
    }
}

impl std::fmt::Display for CertificateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CourseId(pub Uuid);

impl CourseId {
    /// Generate a new random course identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for CourseId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CourseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "course:{}", self.0)
    }
}

/// User identifier issued by the external identity provider.
///
/// Carried verbatim; the only local rule is that it is not blank.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorId(String);

impl AuthorId {
    pub fn new(s: impl Into<String>) -> Result<Self, ValidationError> {
        let s = s.into();
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::MissingField {
                field: Field::Author,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AuthorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEX: &str = "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a";

    #[test]
    fn parse_trims_and_accepts_hex() {
        let key = CertificateKey::parse(&format!("  {HEX}\n")).unwrap();
        assert_eq!(key.as_str(), HEX);
        assert_eq!(key.short(), "44136fa3");
    }

    #[test]
    fn parse_blank_is_blank_key() {
        assert_eq!(CertificateKey::parse("   "), Err(ValidationError::BlankKey));
    }

    #[test]
    fn parse_rejects_uppercase_and_wrong_length() {
        assert!(CertificateKey::parse(&HEX.to_uppercase()).is_err());
        assert!(CertificateKey::parse(&HEX[..63]).is_err());
        assert!(CertificateKey::parse("xyz").is_err());
    }

    #[test]
    fn from_digest_renders_lowercase_hex() {
        let key = CertificateKey::from_digest(&[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(key.as_str(), "deadbeef");
    }

    #[test]
    fn key_serializes_as_plain_string() {
        let key = CertificateKey::parse(HEX).unwrap();
        assert_eq!(serde_json::to_string(&key).unwrap(), format!("\"{HEX}\""));
    }

    #[test]
    fn author_rejects_blank() {
        assert!(AuthorId::new(" ").is_err());
        assert_eq!(AuthorId::new(" user_2x ").unwrap().as_str(), "user_2x");
    }

    #[test]
    fn course_id_display_is_prefixed() {
        let id = CourseId::new();
        assert!(id.to_string().starts_with("course:"));
    }
}
