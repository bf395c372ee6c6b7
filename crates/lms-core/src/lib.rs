//! # lms-core: Foundational Types for the LMS Stack
//!
//! This crate is the leaf of the workspace dependency graph. It defines the
//! domain records and primitives shared by the certificate and course crates,
//! the storage backends, the HTTP service, and the CLI.
//!
//! ## Key Design Principles
//!
//! 1. **Raw input and validated input are different types.**
//!    `CertificateDraft` is what a caller submits; `CertificateFields` is what
//!    survives validation (trimmed, date parsed, not in the future). Only the
//!    latter can be hashed or persisted.
//!
//! 2. **Keys are derived in exactly one place.** [`derive_certificate_key`]
//!    is the only producer of fresh `CertificateKey` values.
//!
//! 3. **The clock is injected.** Key derivation and the future-date check
//!    read time through the [`Clock`] trait so tests can pin the instant.
//!
//! 4. **UTC-only timestamps** with millisecond precision.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `lms-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod catalog;
pub mod certificate;
pub mod course;
pub mod error;
pub mod identity;
pub mod keygen;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use certificate::{CertificateDraft, CertificateFields, CertificateRecord};
pub use course::{CourseDraft, CourseFields, CourseQuery, CourseRecord, Subject};
pub use error::{Field, ValidationError};
pub use identity::{AuthorId, CertificateKey, CourseId};
pub use keygen::derive_certificate_key;
pub use temporal::{Clock, FixedClock, SystemClock, Timestamp};
