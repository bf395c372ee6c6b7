//! # Certificate Subcommands
//!
//! `key`, `issue`, and `validate`. The first is offline; the other two run
//! the flows from `lms-certs` against whichever datastore is configured.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use lms_certs::{CertificateIssuer, CertificateValidator, Validation};
use lms_core::{CertificateDraft, CertificateRecord, Clock, Timestamp};
use lms_store::Datastore;

use crate::{write_json, EXIT_NOT_FOUND, EXIT_OK};

/// Certificate fields shared by `key` and `issue`.
#[derive(Args, Debug, Clone)]
pub struct CertificateFieldArgs {
    /// Student's full name.
    #[arg(long)]
    pub student: String,
    /// Course name (e.g. "Python Course LM6E").
    #[arg(long)]
    pub course: String,
    /// Certificate type (e.g. "Completion").
    #[arg(long = "type")]
    pub certificate_type: String,
    /// Award date, YYYY-MM-DD. Must not be after today (UTC).
    #[arg(long)]
    pub date: String,
}

impl From<&CertificateFieldArgs> for CertificateDraft {
    fn from(args: &CertificateFieldArgs) -> Self {
        CertificateDraft::new(
            args.student.clone(),
            args.course.clone(),
            args.certificate_type.clone(),
            args.date.clone(),
        )
    }
}

/// Arguments for `lms key`.
#[derive(Args, Debug)]
pub struct KeyArgs {
    #[command(flatten)]
    pub fields: CertificateFieldArgs,

    /// Issuance instant (RFC 3339) to hash instead of the current time.
    #[arg(long)]
    pub at: Option<String>,
}

/// Arguments for `lms issue`.
#[derive(Args, Debug)]
pub struct IssueArgs {
    #[command(flatten)]
    pub fields: CertificateFieldArgs,
}

/// Arguments for `lms validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// The 64-character certificate key.
    pub key: String,
}

#[derive(Serialize)]
struct KeyOutput<'a> {
    certificate_key: &'a str,
    issued_at: String,
}

/// Derive and print the key the given fields would receive at `--at` (or now).
pub fn run_key(args: &KeyArgs, clock: &dyn Clock, json: bool, out: &mut dyn Write) -> Result<u8> {
    let issued_at = match &args.at {
        Some(raw) => Timestamp::parse_lenient(raw)
            .with_context(|| format!("--at is not an RFC 3339 timestamp: {raw}"))?,
        None => clock.now(),
    };
    let fields = CertificateDraft::from(&args.fields)
        .validate(clock.today())
        .context("certificate fields are invalid")?;
    let key = fields.derive_key(issued_at);

    if json {
        write_json(
            out,
            &KeyOutput {
                certificate_key: key.as_str(),
                issued_at: issued_at.to_iso8601(),
            },
        )?;
    } else {
        writeln!(out, "{key}")?;
    }
    Ok(EXIT_OK)
}

/// Issue a certificate and print the stored record.
pub async fn run_issue(
    args: &IssueArgs,
    store: Arc<dyn Datastore>,
    clock: Arc<dyn Clock>,
    json: bool,
    out: &mut dyn Write,
) -> Result<u8> {
    let draft = CertificateDraft::from(&args.fields);
    let record = CertificateIssuer::new(store, clock)
        .issue(&draft)
        .await
        .context("certificate was not issued")?;

    if json {
        write_json(out, &record)?;
    } else {
        writeln!(out, "Certificate issued")?;
        print_record(out, &record)?;
    }
    Ok(EXIT_OK)
}

/// Look a key up. Exit 0 when found, 2 when not.
pub async fn run_validate(
    args: &ValidateArgs,
    store: Arc<dyn Datastore>,
    json: bool,
    out: &mut dyn Write,
) -> Result<u8> {
    let outcome = CertificateValidator::new(store)
        .validate(&args.key)
        .await
        .context("certificate could not be validated")?;

    if json {
        write_json(out, &outcome)?;
    }
    match outcome {
        Validation::Found(record) => {
            if !json {
                writeln!(out, "Certificate is valid")?;
                print_record(out, &record)?;
            }
            Ok(EXIT_OK)
        }
        Validation::NotFound => {
            if !json {
                writeln!(out, "No certificate found for this key")?;
            }
            Ok(EXIT_NOT_FOUND)
        }
    }
}

fn print_record(out: &mut dyn Write, record: &CertificateRecord) -> Result<()> {
    writeln!(out, "  key:          {}", record.key)?;
    writeln!(out, "  student:      {}", record.student_name)?;
    writeln!(out, "  course:       {}", record.course_name)?;
    writeln!(out, "  type:         {}", record.certificate_type)?;
    writeln!(out, "  awarded:      {}", record.date_awarded.format("%Y-%m-%d"))?;
    writeln!(out, "  issued at:    {}", record.created_at.to_iso8601())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use lms_core::FixedClock;
    use lms_store::MemoryStore;

    fn fields() -> CertificateFieldArgs {
        CertificateFieldArgs {
            student: "  Ada Lovelace ".into(),
            course: "Python Course LM6E".into(),
            certificate_type: "Completion".into(),
            date: "2026-01-14".into(),
        }
    }

    fn clock() -> Arc<FixedClock> {
        Arc::new(FixedClock::new(
            Timestamp::parse("2026-01-15T12:00:00.000Z").unwrap(),
        ))
    }

    fn output(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn key_matches_direct_derivation_on_trimmed_fields() {
        let args = KeyArgs {
            fields: fields(),
            at: None,
        };
        let clock = clock();
        let mut buf = Vec::new();
        let code = run_key(&args, clock.as_ref(), false, &mut buf).unwrap();
        assert_eq!(code, EXIT_OK);

        let expected = lms_core::derive_certificate_key(
            "Ada Lovelace",
            "Python Course LM6E",
            "Completion",
            NaiveDate::from_ymd_opt(2026, 1, 14).unwrap(),
            clock.now(),
        );
        assert_eq!(output(buf).trim(), expected.as_str());
    }

    #[test]
    fn key_with_explicit_instant_is_reproducible() {
        let args = KeyArgs {
            fields: fields(),
            at: Some("2025-06-01T08:30:00.123Z".into()),
        };
        let mut first = Vec::new();
        let mut second = Vec::new();
        run_key(&args, clock().as_ref(), true, &mut first).unwrap();
        run_key(&args, clock().as_ref(), true, &mut second).unwrap();
        assert_eq!(first, second);

        let value: serde_json::Value = serde_json::from_slice(&first).unwrap();
        assert_eq!(value["issued_at"], "2025-06-01T08:30:00.123Z");
        assert_eq!(value["certificate_key"].as_str().unwrap().len(), 64);
    }

    #[test]
    fn key_rejects_future_date() {
        let mut f = fields();
        f.date = "2026-01-16".into();
        let args = KeyArgs { fields: f, at: None };
        let err = run_key(&args, clock().as_ref(), false, &mut Vec::new()).unwrap_err();
        assert!(format!("{err:#}").contains("future"));
    }

    #[tokio::test]
    async fn issue_then_validate_round_trip() {
        let store: Arc<dyn Datastore> = Arc::new(MemoryStore::with_default_schema());
        let mut buf = Vec::new();
        let code = run_issue(
            &IssueArgs { fields: fields() },
            Arc::clone(&store),
            clock(),
            true,
            &mut buf,
        )
        .await
        .unwrap();
        assert_eq!(code, EXIT_OK);
        let record: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        let key = record["certificate_key"].as_str().unwrap().to_string();
        assert_eq!(record["student_name"], "Ada Lovelace");

        let mut buf = Vec::new();
        let code = run_validate(&ValidateArgs { key }, store, false, &mut buf)
            .await
            .unwrap();
        assert_eq!(code, EXIT_OK);
        assert!(output(buf).contains("student:      Ada Lovelace"));
    }

    #[tokio::test]
    async fn issue_duplicate_is_an_error() {
        let store: Arc<dyn Datastore> = Arc::new(MemoryStore::with_default_schema());
        let args = IssueArgs { fields: fields() };
        run_issue(&args, Arc::clone(&store), clock(), false, &mut Vec::new())
            .await
            .unwrap();
        let err = run_issue(&args, store, clock(), false, &mut Vec::new())
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("already exists"));
    }

    #[tokio::test]
    async fn validate_unknown_key_exits_not_found() {
        let store: Arc<dyn Datastore> = Arc::new(MemoryStore::with_default_schema());
        let mut buf = Vec::new();
        let code = run_validate(
            &ValidateArgs {
                key: "f".repeat(64),
            },
            store,
            true,
            &mut buf,
        )
        .await
        .unwrap();
        assert_eq!(code, EXIT_NOT_FOUND);
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["status"], "not_found");
    }

    #[tokio::test]
    async fn validate_offline_store_is_an_error() {
        let store = Arc::new(MemoryStore::with_default_schema());
        store.set_offline(true);
        let result = run_validate(
            &ValidateArgs {
                key: "f".repeat(64),
            },
            store,
            false,
            &mut Vec::new(),
        )
        .await;
        assert!(result.is_err());
    }
}
