//! # lms-cli: Operator Command-Line Interface
//!
//! ## Subcommands
//!
//! - `key`: Derive a certificate key without storing anything
//! - `issue`: Run the issuance flow against the configured datastore
//! - `validate`: Look a key up (exit 0 found, 2 not found, 1 error)
//! - `course`: Create or list courses
//!
//! ## Crate Policy
//!
//! - Argument parsing lives here; behaviour lives in `lms-certs` and
//!   `lms-courses`.
//! - Handlers write to a caller-supplied writer and return the exit code.

pub mod certificate;
pub mod course;

use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;

/// Exit code for a successful command.
pub const EXIT_OK: u8 = 0;
/// Exit code when `validate` finds no certificate.
pub const EXIT_NOT_FOUND: u8 = 2;

/// Write `value` as pretty JSON followed by a newline.
pub(crate) fn write_json<T: Serialize>(out: &mut dyn Write, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to encode output")?;
    writeln!(out, "{text}").context("failed to write output")?;
    Ok(())
}
