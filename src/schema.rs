//! JSON Schema check of projected certificate records.

use std::fmt;
use std::path::Path;

use jsonschema::Validator;
use log::debug;
use serde_json::Value;

use crate::error::{Result, SchemaError, ValidationError};
use crate::types::CertificateRecord;

/// Schema packaged with the tool
pub const EMBEDDED_SCHEMA: &str = include_str!("../schema/x509-schema.json");

/// A compiled schema. Built once per run and only read afterwards.
pub struct CertificateSchema {
    document: Value,
    validator: Validator,
}

impl CertificateSchema {
    /// The schema shipped in `schema/x509-schema.json`.
    pub fn embedded() -> std::result::Result<Self, SchemaError> {
        Self::from_json_str(EMBEDDED_SCHEMA)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> std::result::Result<Self, SchemaError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SchemaError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("using schema from {}", path.display());
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> std::result::Result<Self, SchemaError> {
        Self::from_value(serde_json::from_str(text)?)
    }

    pub fn from_value(document: Value) -> std::result::Result<Self, SchemaError> {
        let validator = jsonschema::validator_for(&document)
            .map_err(|e| SchemaError::Invalid(e.to_string()))?;
        Ok(CertificateSchema {
            document,
            validator,
        })
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Validate a projected record.
    ///
    /// # Errors
    ///
    /// `Error::Validation` with the first violation found.
    pub fn validate(&self, record: &CertificateRecord) -> Result<()> {
        let instance = serde_json::to_value(record)?;
        self.validate_value(&instance)?;
        Ok(())
    }

    /// Validate any JSON value, reporting only the first violation.
    pub fn validate_value(&self, instance: &Value) -> std::result::Result<(), ValidationError> {
        self.validator
            .validate(instance)
            .map_err(|err| ValidationError {
                message: err.to_string(),
                instance_path: err.instance_path.to_string(),
            })
    }
}

impl fmt::Debug for CertificateSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateSchema")
            .field("document", &self.document)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
fn leaf_value() -> Value {
    serde_json::json!({
        "issuer": "CN=example.com",
        "validFrom": "2023-11-14T22:13:20",
        "validTo": "2027-01-15T08:00:00",
        "subject": {"commonName": "example.com", "organization": null},
        "extensions": {"basicConstraints": {"ca": false}}
    })
}

#[test]
fn embedded_schema_compiles() {
    let schema = CertificateSchema::embedded().unwrap();
    assert_eq!(schema.document()["type"], "object");
}

#[test]
fn accepts_well_formed_record() {
    let schema = CertificateSchema::embedded().unwrap();
    schema.validate_value(&leaf_value()).unwrap();

    let record: CertificateRecord = serde_json::from_value(leaf_value()).unwrap();
    schema.validate(&record).unwrap();
}

#[test]
fn accepts_fractional_seconds() {
    let schema = CertificateSchema::embedded().unwrap();
    let mut value = leaf_value();
    value["validFrom"] = "2023-11-14T22:13:20.250000".into();
    schema.validate_value(&value).unwrap();
}

#[test]
fn missing_subject_names_the_property() {
    let schema = CertificateSchema::embedded().unwrap();
    let mut value = leaf_value();
    value.as_object_mut().unwrap().remove("subject");
    let err = schema.validate_value(&value).unwrap_err();
    assert!(err.message.contains("subject"), "{}", err.message);
    assert_eq!(err.instance_path, "");
}

#[test]
fn wrong_type_reports_location() {
    let schema = CertificateSchema::embedded().unwrap();
    let mut value = leaf_value();
    value["extensions"]["basicConstraints"]["ca"] = "yes".into();
    let err = schema.validate_value(&value).unwrap_err();
    assert_eq!(err.instance_path, "/extensions/basicConstraints/ca");
}

#[test]
fn rejects_unzoned_timestamp_shape() {
    let schema = CertificateSchema::embedded().unwrap();
    let mut value = leaf_value();
    value["validTo"] = "Jan 15 08:00:00 2027 GMT".into();
    let err = schema.validate_value(&value).unwrap_err();
    assert_eq!(err.instance_path, "/validTo");
}

#[test]
fn rejects_unknown_keys() {
    let schema = CertificateSchema::embedded().unwrap();
    let mut value = leaf_value();
    value["serial"] = "01".into();
    assert!(schema.validate_value(&value).is_err());
}

#[test]
fn invalid_schema_documents_are_rejected() {
    assert!(matches!(
        CertificateSchema::from_json_str("{not json"),
        Err(SchemaError::Parse(_))
    ));
    assert!(matches!(
        CertificateSchema::from_value(serde_json::json!({"type": 12})),
        Err(SchemaError::Invalid(_))
    ));
    assert!(matches!(
        CertificateSchema::from_path("/nonexistent/cert-check/schema.json"),
        Err(SchemaError::Read { .. })
    ));
}
