//! # Certificate Issuance
//!
//! validate → derive key → duplicate lookup → insert, strictly in that
//! order and each step at most once. The lookup and the insert are two
//! separate round trips; when the backend also enforces the tuple
//! constraint, a concurrent duplicate that slips past the lookup is caught
//! at insert time and reported the same way.

use std::sync::Arc;

use lms_core::{CertificateDraft, CertificateFields, CertificateRecord, Clock};
use lms_store::schema::certificates;
use lms_store::{from_row, to_row, Datastore, Filter, StoreError};
use tracing::Instrument;

use crate::error::{CertificateError, DuplicateCheck};
use crate::state::{FlowState, FlowTracker};
use crate::Traced;

pub const FLOW: &str = "certificate.issue";

/// Runs the issuance flow against a datastore.
pub struct CertificateIssuer<D: ?Sized = dyn Datastore> {
    store: Arc<D>,
    clock: Arc<dyn Clock>,
}

impl<D: ?Sized> Clone for CertificateIssuer<D> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<D: Datastore + ?Sized> CertificateIssuer<D> {
    pub fn new(store: Arc<D>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Issue a certificate for `draft`.
    ///
    /// Returns the persisted record, whose key is the only handle for later
    /// lookup.
    pub async fn issue(&self, draft: &CertificateDraft) -> Result<CertificateRecord, CertificateError> {
        self.issue_traced(draft).await.result
    }

    /// Like [`issue`](Self::issue), also returning the states visited.
    pub async fn issue_traced(&self, draft: &CertificateDraft) -> Traced<CertificateRecord> {
        let span = tracing::info_span!("certificate.issue", key = tracing::field::Empty);
        let mut tracker = FlowTracker::new(FLOW);
        let result = self.run(draft, &mut tracker).instrument(span).await;
        Traced { result, tracker }
    }

    async fn run(
        &self,
        draft: &CertificateDraft,
        tracker: &mut FlowTracker,
    ) -> Result<CertificateRecord, CertificateError> {
        tracker.enter(FlowState::Validating);
        let fields = match draft.validate(self.clock.today()) {
            Ok(fields) => fields,
            Err(err) => {
                tracing::info!(field = err.field().as_str(), "certificate rejected");
                tracker.fail();
                return Err(err.into());
            }
        };

        let issued_at = self.clock.now();
        let key = fields.derive_key(issued_at);
        tracing::Span::current().record("key", key.short());

        tracker.enter(FlowState::Querying);
        match self.store.find(certificates::TABLE, &tuple_filter(&fields)).await {
            Ok(None) => {}
            Ok(Some(_)) => {
                tracing::info!("duplicate certificate tuple");
                tracker.fail();
                return Err(CertificateError::Duplicate {
                    detected_by: DuplicateCheck::Lookup,
                });
            }
            Err(err) => {
                tracing::warn!(error = %err, "duplicate lookup failed");
                tracker.fail();
                return Err(err.into());
            }
        }

        tracker.enter(FlowState::Persisting);
        let record = fields.into_record(key, issued_at);
        match self.persist(&record).await {
            Ok(persisted) => {
                tracing::info!(date_awarded = %persisted.date_awarded, "certificate issued");
                tracker.succeed();
                Ok(persisted)
            }
            Err(StoreError::Conflict { constraint, .. }) => {
                tracing::info!(%constraint, "duplicate certificate rejected by store");
                tracker.fail();
                Err(CertificateError::Duplicate {
                    detected_by: DuplicateCheck::Constraint,
                })
            }
            Err(err) => {
                tracing::warn!(error = %err, "certificate insert failed");
                tracker.fail();
                Err(err.into())
            }
        }
    }

    async fn persist(&self, record: &CertificateRecord) -> Result<CertificateRecord, StoreError> {
        let row = to_row(certificates::TABLE, record)?;
        let persisted = self.store.insert(certificates::TABLE, row).await?;
        from_row(certificates::TABLE, persisted)
    }
}

/// Exact-match filter over the duplicate tuple.
pub fn tuple_filter(fields: &CertificateFields) -> Filter {
    Filter::new()
        .eq(certificates::STUDENT_NAME, fields.student_name.as_str())
        .eq(certificates::COURSE_NAME, fields.course_name.as_str())
        .eq(certificates::CERTIFICATE_TYPE, fields.certificate_type.as_str())
        .eq(
            certificates::DATE_AWARDED,
            fields.date_awarded.format("%Y-%m-%d").to_string(),
        )
}
