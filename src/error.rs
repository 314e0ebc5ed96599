use std::path::PathBuf;

use thiserror::Error;
use x509_parser::error::{PEMError, X509Error};

/// Result type alias for certificate checks
pub type Result<T> = std::result::Result<T, Error>;

/// Failures turning raw bytes into a certificate
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Input has no PEM framing and does not parse as DER either
    #[error("input is neither a PEM nor a DER encoded X.509 certificate: {0}")]
    NotACertificate(#[source] X509Error),

    /// PEM header was found but the block around it is broken
    #[error("malformed PEM block: {0}")]
    Pem(#[source] PEMError),

    /// PEM block carries something other than a certificate
    #[error("PEM block is labelled {0:?}, expected CERTIFICATE")]
    UnexpectedLabel(String),

    /// Certificate structure is malformed
    #[error("malformed certificate: {0}")]
    Der(#[source] X509Error),

    /// A known extension whose payload does not parse
    #[error("malformed {0} extension")]
    MalformedExtension(&'static str),

    /// Bytes left over after the certificate
    #[error("{0} trailing bytes after certificate")]
    TrailingData(usize),
}

/// First schema violation found in a record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    /// Human readable description of the violation
    pub message: String,
    /// JSON pointer of the offending value, empty for the document root
    pub instance_path: String,
}

/// Failures building the schema validator
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("cannot read schema {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("schema is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("schema is not a valid JSON Schema: {0}")]
    Invalid(String),
}

/// Errors that can occur while checking a certificate
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
