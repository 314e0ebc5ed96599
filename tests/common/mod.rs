#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use openssl::asn1::{Asn1Object, Asn1OctetString, Asn1Time, Asn1Type};
use openssl::bn::{BigNum, MsbOption};
use openssl::ec::{EcGroup, EcKey};
use openssl::error::ErrorStack;
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::x509::extension::BasicConstraints;
use openssl::x509::{X509Extension, X509Name, X509};

/// 2023-11-14T22:13:20 UTC
pub const NOT_BEFORE: i64 = 1_700_000_000;
/// 2027-01-15T08:00:00 UTC
pub const NOT_AFTER: i64 = 1_800_000_000;

/// Self-signed certificate description; issuer equals subject.
#[derive(Clone, Debug, Default)]
pub struct CertTemplate {
    pub subject: Vec<(Nid, &'static str)>,
    /// Appended after `subject`, each stored with an explicit string type
    pub typed_subject: Vec<(Nid, &'static str, Asn1Type)>,
    /// `None` leaves the extension out, `Some(ca)` adds it with that flag
    pub basic_constraints: Option<bool>,
    /// Extensions added verbatim as (dotted OID, DER payload)
    pub raw_extensions: Vec<(&'static str, Vec<u8>)>,
}

impl CertTemplate {
    pub fn leaf(common_name: &'static str) -> Self {
        CertTemplate {
            subject: vec![(Nid::COMMONNAME, common_name)],
            ..CertTemplate::default()
        }
    }

    pub fn ca(common_name: &'static str) -> Self {
        CertTemplate {
            subject: vec![(Nid::COMMONNAME, common_name)],
            basic_constraints: Some(true),
            ..CertTemplate::default()
        }
    }

    pub fn with(mut self, nid: Nid, value: &'static str) -> Self {
        self.subject.push((nid, value));
        self
    }

    pub fn with_typed(mut self, nid: Nid, value: &'static str, ty: Asn1Type) -> Self {
        self.typed_subject.push((nid, value, ty));
        self
    }

    pub fn raw_extension(mut self, oid: &'static str, payload: &[u8]) -> Self {
        self.raw_extensions.push((oid, payload.to_vec()));
        self
    }

    pub fn basic_constraints(mut self, ca: bool) -> Self {
        self.basic_constraints = Some(ca);
        self
    }

    pub fn build(&self) -> Result<X509, ErrorStack> {
        let key = signing_key()?;

        let mut name = X509Name::builder()?;
        for (nid, value) in &self.subject {
            name.append_entry_by_nid(*nid, value)?;
        }
        for (nid, value, ty) in &self.typed_subject {
            name.append_entry_by_nid_with_type(*nid, value, *ty)?;
        }
        let name = name.build();

        let mut builder = X509::builder()?;
        builder.set_version(2)?;
        let serial_number = {
            let mut serial = BigNum::new()?;
            serial.rand(63, MsbOption::MAYBE_ZERO, false)?;
            serial.to_asn1_integer()?
        };
        builder.set_serial_number(&serial_number)?;
        builder.set_subject_name(&name)?;
        builder.set_issuer_name(&name)?;
        builder.set_pubkey(&key)?;
        let nb = Asn1Time::from_unix(NOT_BEFORE)?;
        builder.set_not_before(&nb)?;
        let na = Asn1Time::from_unix(NOT_AFTER)?;
        builder.set_not_after(&na)?;

        if let Some(ca) = self.basic_constraints {
            let mut bc = BasicConstraints::new();
            bc.critical();
            if ca {
                bc.ca();
            }
            builder.append_extension(bc.build()?)?;
        }
        for (oid, payload) in &self.raw_extensions {
            let oid = Asn1Object::from_str(oid)?;
            let payload = Asn1OctetString::new_from_bytes(payload)?;
            builder.append_extension(X509Extension::new_from_der(&oid, false, &payload)?)?;
        }

        builder.sign(&key, MessageDigest::sha256())?;
        Ok(builder.build())
    }

    pub fn pem(&self) -> Vec<u8> {
        self.build().unwrap().to_pem().unwrap()
    }

    pub fn der(&self) -> Vec<u8> {
        self.build().unwrap().to_der().unwrap()
    }
}

fn signing_key() -> Result<PKey<Private>, ErrorStack> {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1)?;
    PKey::from_ec_key(EcKey::generate(&group)?)
}

pub fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}
