//! # Certificate Key Derivation
//!
//! A certificate key is the SHA-256 digest, rendered as lowercase hex, of
//!
//! ```text
//! {student_name}-{course_name}-{certificate_type}-{YYYY-MM-DD}-{epoch_millis}
//! ```
//!
//! The issuance instant is part of the preimage, so two submissions with
//! identical fields made at different milliseconds get different keys. The
//! key is not a content fingerprint: it cannot be recomputed from a stored
//! record, which is why issuance must hand it back to the submitter.

use chrono::NaiveDate;
use sha2::{Digest, Sha256};

use crate::identity::CertificateKey;
use crate::temporal::Timestamp;

/// Field separator in the digest preimage.
pub const SEPARATOR: char = '-';

/// Derive a certificate key from the identifying fields and the issuance instant.
///
/// Pure apart from its inputs; callers read `issued_at` from a [`crate::Clock`].
pub fn derive_certificate_key(
    student_name: &str,
    course_name: &str,
    certificate_type: &str,
    date_awarded: NaiveDate,
    issued_at: Timestamp,
) -> CertificateKey {
    let preimage = format!(
        "{student_name}{SEPARATOR}{course_name}{SEPARATOR}{certificate_type}{SEPARATOR}{}{SEPARATOR}{}",
        date_awarded.format("%Y-%m-%d"),
        issued_at.epoch_millis(),
    );
    let hash = Sha256::digest(preimage.as_bytes());
    CertificateKey::from_digest(&hash)
}
