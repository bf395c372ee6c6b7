//! # Certificate Validation
//!
//! Looks a certificate up by key. "No such certificate" is a successful
//! outcome ([`Validation::NotFound`]); only an unreachable or failing store
//! is an error. A blank key is rejected before the store is touched.

use std::sync::Arc;

use lms_core::{CertificateRecord, ValidationError};
use lms_store::schema::certificates;
use lms_store::{from_row, Datastore, Filter};
use serde::Serialize;
use tracing::Instrument;

use crate::error::CertificateError;
use crate::state::{FlowState, FlowTracker};
use crate::Traced;

pub const FLOW: &str = "certificate.validate";

/// Result of a key lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "certificate", rename_all = "snake_case")]
pub enum Validation {
    Found(CertificateRecord),
    NotFound,
}

impl Validation {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn record(&self) -> Option<&CertificateRecord> {
        match self {
            Self::Found(record) => Some(record),
            Self::NotFound => None,
        }
    }

    pub fn into_record(self) -> Option<CertificateRecord> {
        match self {
            Self::Found(record) => Some(record),
            Self::NotFound => None,
        }
    }
}

/// Runs the validation flow against a datastore.
pub struct CertificateValidator<D: ?Sized = dyn Datastore> {
    store: Arc<D>,
}

impl<D: ?Sized> Clone for CertificateValidator<D> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<D: Datastore + ?Sized> CertificateValidator<D> {
    pub fn new(store: Arc<D>) -> Self {
        Self { store }
    }

    /// Look up the certificate issued under `key`.
    pub async fn validate(&self, key: &str) -> Result<Validation, CertificateError> {
        self.validate_traced(key).await.result
    }

    /// Like [`validate`](Self::validate), also returning the states visited.
    pub async fn validate_traced(&self, key: &str) -> Traced<Validation> {
        let span = tracing::info_span!("certificate.validate", key = tracing::field::Empty);
        let mut tracker = FlowTracker::new(FLOW);
        let result = self.run(key, &mut tracker).instrument(span).await;
        Traced { result, tracker }
    }

    async fn run(&self, key: &str, tracker: &mut FlowTracker) -> Result<Validation, CertificateError> {
        tracker.enter(FlowState::Validating);
        let key = key.trim();
        if key.is_empty() {
            tracing::info!("blank certificate key");
            tracker.fail();
            return Err(ValidationError::BlankKey.into());
        }
        let prefix: String = key.chars().take(8).collect();
        tracing::Span::current().record("key", prefix.as_str());

        tracker.enter(FlowState::Querying);
        let filter = Filter::new().eq(certificates::KEY, key);
        let found = match self.store.find(certificates::TABLE, &filter).await {
            Ok(found) => found,
            Err(err) => {
                tracing::warn!(error = %err, "certificate lookup failed");
                tracker.fail();
                return Err(err.into());
            }
        };

        let outcome = match found {
            None => Validation::NotFound,
            Some(row) => match from_row::<CertificateRecord>(certificates::TABLE, row) {
                Ok(record) => Validation::Found(record),
                Err(err) => {
                    tracing::warn!(error = %err, "stored certificate is unreadable");
                    tracker.fail();
                    return Err(err.into());
                }
            },
        };
        tracing::info!(found = outcome.is_found(), "certificate lookup complete");
        tracker.succeed();
        Ok(outcome)
    }
}
