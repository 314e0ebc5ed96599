//! # cert-check
//! Validate digital certificates against a JSON schema.
//!
//! A certificate (PEM or DER) is reduced to a small record holding the
//! issuer, validity window, subject common name and organization, and the
//! basicConstraints CA flag. The record is then checked against a JSON
//! Schema, by default the one packaged in `schema/x509-schema.json`.
//!
//! ```no_run
//! use cert_check::{check, CertificateSchema};
//!
//! let schema = CertificateSchema::embedded()?;
//! let record = check("server.pem".as_ref(), &schema)?;
//! println!("{}", record.to_json()?);
//! # Ok::<(), cert_check::Error>(())
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::info;

pub mod error;
pub mod loader;
pub mod schema;
pub mod types;

pub use error::{DecodeError, Error, Result, SchemaError, ValidationError};
pub use loader::{Certificate, Encoding};
pub use schema::{CertificateSchema, EMBEDDED_SCHEMA};
pub use types::{BasicConstraint, CertificateRecord, Extensions, Subject};

/// Load, project and validate one certificate file.
///
/// # Errors
///
/// Decoding and I/O failures, or [`Error::Validation`] with the first
/// schema violation.
pub fn check(path: &Path, schema: &CertificateSchema) -> Result<CertificateRecord> {
    let cert = Certificate::from_file(path)?;
    let record = cert.project()?;
    schema.validate(&record)?;
    info!("{} conforms to the schema", path.display());
    Ok(record)
}

/// Write a record to `path` as indented JSON.
///
/// # Errors
///
/// The file cannot be created or written.
pub fn save_record(record: &CertificateRecord, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut writer = BufWriter::new(file);
    record.write_json(&mut writer).map_err(|e| {
        if e.is_io() {
            Error::io(path, e.into())
        } else {
            Error::Json(e)
        }
    })?;
    writer.flush().map_err(|e| Error::io(path, e))?;
    info!("wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
fn sample_record() -> CertificateRecord {
    CertificateRecord {
        issuer: "CN=example.com".into(),
        valid_from: "2023-11-14T22:13:20".into(),
        valid_to: "2027-01-15T08:00:00".into(),
        subject: Subject {
            common_name: Some("example.com".into()),
            organization: None,
        },
        extensions: Extensions::default(),
    }
}

#[test]
fn save_record_writes_indented_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("record.json");
    save_record(&sample_record(), &path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text, sample_record().to_json().unwrap());
}

#[test]
fn save_record_failures_name_the_output_path() {
    let dir = tempfile::tempdir().unwrap();
    match save_record(&sample_record(), dir.path()) {
        Err(Error::Io { path, .. }) => assert_eq!(path, dir.path()),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[cfg(target_os = "linux")]
#[test]
fn write_errors_name_the_output_path() {
    let full = Path::new("/dev/full");
    if !full.exists() {
        return;
    }
    match save_record(&sample_record(), full) {
        Err(Error::Io { path, source }) => {
            assert_eq!(path, full);
            assert!(Error::io(full, source).to_string().starts_with("/dev/full: "));
        }
        other => panic!("unexpected result: {:?}", other),
    }
}
