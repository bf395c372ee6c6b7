//! # lms-certs: Certificate Issuance and Validation
//!
//! Two independent use cases sharing only the key format:
//!
//! - [`CertificateIssuer`]: validate a draft, derive its key, reject a
//!   duplicate tuple, persist. See [`issuance`].
//! - [`CertificateValidator`]: look a key up and report found or not found.
//!   See [`validation`].
//!
//! Both take their [`Datastore`](lms_store::Datastore) as an `Arc` handle
//! and never retry. Each invocation walks the [`FlowState`] machine; the
//! `*_traced` variants return the [`FlowTracker`] alongside the result.

pub mod error;
pub mod issuance;
pub mod state;
pub mod validation;

pub use error::{CertificateError, DuplicateCheck};
pub use issuance::CertificateIssuer;
pub use state::{FlowError, FlowState, FlowTracker};
pub use validation::{CertificateValidator, Validation};

/// A flow result together with the states the flow passed through.
#[derive(Debug)]
pub struct Traced<T> {
    pub result: Result<T, CertificateError>,
    pub tracker: FlowTracker,
}
