use std::io::Write;

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::ser::{PrettyFormatter, Serializer};
use x509_parser::certificate::X509Certificate;
use x509_parser::time::ASN1Time;
use x509_parser::x509::{AttributeTypeAndValue, X509Name};

/// Attribute types rendered by short name in RFC 4514 strings.
/// Anything else is written as a dotted OID.
const SHORT_NAMES: &[(&str, &str)] = &[
    ("2.5.4.3", "CN"),
    ("2.5.4.7", "L"),
    ("2.5.4.8", "ST"),
    ("2.5.4.10", "O"),
    ("2.5.4.11", "OU"),
    ("2.5.4.6", "C"),
    ("2.5.4.9", "STREET"),
    ("0.9.2342.19200300.100.1.25", "DC"),
    ("0.9.2342.19200300.100.1.1", "UID"),
];

/// Universal tags of the string types `as_str` does not decode
const TAG_T61_STRING: u32 = 20;
const TAG_UNIVERSAL_STRING: u32 = 28;
const TAG_BMP_STRING: u32 = 30;

#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CertificateRecord {
    pub issuer: String,
    pub valid_from: String,
    pub valid_to: String,
    pub subject: Subject,
    pub extensions: Extensions,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub common_name: Option<String>,
    pub organization: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Extensions {
    pub basic_constraints: BasicConstraint,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, Eq, PartialEq)]
pub struct BasicConstraint {
    pub ca: bool,
}

impl CertificateRecord {
    /// Write the record as JSON indented by four spaces.
    pub fn write_json<W: Write>(&self, writer: W) -> serde_json::Result<()> {
        let mut ser = Serializer::with_formatter(writer, PrettyFormatter::with_indent(b"    "));
        self.serialize(&mut ser)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        let mut buf = Vec::new();
        self.write_json(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

impl From<&X509Certificate<'_>> for CertificateRecord {
    fn from(cert: &X509Certificate<'_>) -> CertificateRecord {
        let validity = cert.validity();
        // a duplicated extension is rejected when loading
        let ca = cert
            .basic_constraints()
            .ok()
            .flatten()
            .map_or(false, |ext| ext.value.ca);

        CertificateRecord {
            issuer: rfc4514_string(cert.issuer()),
            valid_from: iso8601(&validity.not_before),
            valid_to: iso8601(&validity.not_after),
            subject: Subject::from(cert.subject()),
            extensions: Extensions {
                basic_constraints: BasicConstraint { ca },
            },
        }
    }
}

impl From<&X509Name<'_>> for Subject {
    fn from(name: &X509Name<'_>) -> Subject {
        Subject {
            common_name: last_string(name.iter_common_name()),
            organization: last_string(name.iter_organization()),
        }
    }
}

fn last_string<'a, 'b: 'a>(
    attrs: impl Iterator<Item = &'a AttributeTypeAndValue<'b>>,
) -> Option<String> {
    attrs.filter_map(attribute_text).last()
}

/// Text of a directory string attribute, or `None` for non-string values.
fn attribute_text(attr: &AttributeTypeAndValue<'_>) -> Option<String> {
    if let Ok(s) = attr.as_str() {
        return Some(s.to_owned());
    }
    let value = attr.attr_value();
    decode_string(value.header.tag().0, value.data)
}

/// Decode the wide and legacy string types: BMPString is UTF-16BE,
/// UniversalString is UCS-4BE, TeletexString is read as Latin-1.
fn decode_string(tag: u32, data: &[u8]) -> Option<String> {
    match tag {
        TAG_BMP_STRING => {
            if data.len() % 2 != 0 {
                return None;
            }
            let units = data.chunks_exact(2).map(|c| u16::from_be_bytes([c[0], c[1]]));
            char::decode_utf16(units).collect::<Result<String, _>>().ok()
        }
        TAG_UNIVERSAL_STRING => {
            if data.len() % 4 != 0 {
                return None;
            }
            data.chunks_exact(4)
                .map(|c| char::from_u32(u32::from_be_bytes([c[0], c[1], c[2], c[3]])))
                .collect()
        }
        TAG_T61_STRING => Some(data.iter().map(|&b| char::from(b)).collect()),
        _ => None,
    }
}

/// Render a distinguished name per RFC 4514: last RDN first, RDNs joined
/// by `,` and multi-valued RDN members by `+`.
pub fn rfc4514_string(name: &X509Name<'_>) -> String {
    let rdns: Vec<_> = name.iter().collect();
    rdns.iter()
        .rev()
        .map(|rdn| {
            rdn.iter()
                .map(render_attribute)
                .collect::<Vec<_>>()
                .join("+")
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn render_attribute(attr: &AttributeTypeAndValue<'_>) -> String {
    let oid = attr.attr_type().to_id_string();
    let key = SHORT_NAMES
        .iter()
        .find(|(dotted, _)| oid == *dotted)
        .map_or(oid.as_str(), |&(_, short)| short);
    let value = match attribute_text(attr) {
        Some(s) => escape_value(&s),
        None => hex_value(attr.attr_value().data),
    };
    format!("{}={}", key, value)
}

pub fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' | '"' | '+' | ',' | ';' | '<' | '>' => {
                out.push('\\');
                out.push(c);
            }
            '\0' => out.push_str("\\00"),
            _ => out.push(c),
        }
    }
    if out.starts_with('#') || out.starts_with(' ') {
        out.insert(0, '\\');
    }
    if out.ends_with(' ') {
        out.pop();
        out.push_str("\\ ");
    }
    out
}

fn hex_value(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(1 + bytes.len() * 2);
    out.push('#');
    for b in bytes {
        out.push_str(&format!("{:02x}", b));
    }
    out
}

/// ISO-8601 in UTC without a zone suffix; microseconds only when present.
pub fn iso8601(time: &ASN1Time) -> String {
    format_utc(time.timestamp(), time.to_datetime().nanosecond())
        .unwrap_or_else(|| time.to_string())
}

fn format_utc(secs: i64, nanos: u32) -> Option<String> {
    let dt = DateTime::from_timestamp(secs, nanos)?;
    let rendered = if nanos >= 1_000 {
        dt.format("%Y-%m-%dT%H:%M:%S%.6f")
    } else {
        dt.format("%Y-%m-%dT%H:%M:%S")
    };
    Some(rendered.to_string())
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
fn escapes_special_characters() {
    assert_eq!(escape_value("Acme, Inc."), "Acme\\, Inc.");
    assert_eq!(escape_value("a+b;c<d>e\"f\\g"), "a\\+b\\;c\\<d\\>e\\\"f\\\\g");
    assert_eq!(escape_value("nul\0byte"), "nul\\00byte");
    assert_eq!(escape_value("plain"), "plain");
    assert_eq!(escape_value(""), "");
}

#[test]
fn escapes_leading_and_trailing_positions() {
    assert_eq!(escape_value("#hash"), "\\#hash");
    assert_eq!(escape_value(" padded "), "\\ padded\\ ");
    assert_eq!(escape_value("mid#dle"), "mid#dle");
}

#[test]
fn hex_fallback_for_non_string_values() {
    assert_eq!(hex_value(&[0x03, 0x01, 0xff]), "#0301ff");
}

#[test]
fn decodes_wide_and_legacy_strings() {
    assert_eq!(
        decode_string(TAG_BMP_STRING, &[0x00, 0x41, 0x00, 0xe9, 0x04, 0x16]).as_deref(),
        Some("Aé\u{416}")
    );
    assert_eq!(
        decode_string(TAG_UNIVERSAL_STRING, &[0, 0, 0, 0x41, 0, 0x01, 0xf6, 0x00]).as_deref(),
        Some("A\u{1f600}")
    );
    assert_eq!(decode_string(TAG_T61_STRING, b"Caf\xe9").as_deref(), Some("Café"));
    // odd lengths and unpaired surrogates are not text
    assert_eq!(decode_string(TAG_BMP_STRING, &[0x00, 0x41, 0x00]), None);
    assert_eq!(decode_string(TAG_BMP_STRING, &[0xd8, 0x00]), None);
    assert_eq!(decode_string(TAG_UNIVERSAL_STRING, &[0, 0x11, 0, 0]), None);
    // INTEGER
    assert_eq!(decode_string(2, &[0x05]), None);
}

/// DER name: C=US, then a two-valued RDN {CN=a, O=b}, then
/// serialNumber carried as an INTEGER and CN as a BMPString.
#[cfg(test)]
const MIXED_NAME_DER: &[u8] = &[
    0x30, 0x3c, //
    0x31, 0x0b, 0x30, 0x09, 0x06, 0x03, 0x55, 0x04, 0x06, 0x13, 0x02, 0x55, 0x53, //
    0x31, 0x14, //
    0x30, 0x08, 0x06, 0x03, 0x55, 0x04, 0x03, 0x0c, 0x01, 0x61, //
    0x30, 0x08, 0x06, 0x03, 0x55, 0x04, 0x0a, 0x0c, 0x01, 0x62, //
    0x31, 0x0a, 0x30, 0x08, 0x06, 0x03, 0x55, 0x04, 0x05, 0x02, 0x01, 0x05, //
    0x31, 0x0b, 0x30, 0x09, 0x06, 0x03, 0x55, 0x04, 0x03, 0x1e, 0x02, 0x00, 0x7a, //
];

#[test]
fn renders_multi_valued_and_non_string_attributes() {
    use x509_parser::prelude::FromDer;

    let (rest, name) = X509Name::from_der(MIXED_NAME_DER).unwrap();
    assert!(rest.is_empty());
    assert_eq!(rfc4514_string(&name), "CN=z,2.5.4.5=#05,CN=a+O=b,C=US");

    let subject = Subject::from(&name);
    assert_eq!(subject.common_name.as_deref(), Some("z"));
    assert_eq!(subject.organization.as_deref(), Some("b"));
}

#[test]
fn formats_fractional_seconds_as_microseconds() {
    assert_eq!(
        format_utc(1_700_000_000, 250_000_000).as_deref(),
        Some("2023-11-14T22:13:20.250000")
    );
    assert_eq!(
        format_utc(1_700_000_000, 0).as_deref(),
        Some("2023-11-14T22:13:20")
    );
    // below a microsecond is dropped
    assert_eq!(
        format_utc(1_700_000_000, 999).as_deref(),
        Some("2023-11-14T22:13:20")
    );
}

#[test]
fn serializes_with_camel_case_keys_and_nulls() {
    let value = serde_json::to_value(sample_record()).unwrap();
    assert_eq!(
        value,
        serde_json::json!({
            "issuer": "CN=example.com",
            "validFrom": "2023-11-14T22:13:20",
            "validTo": "2027-01-15T08:00:00",
            "subject": {"commonName": "example.com", "organization": null},
            "extensions": {"basicConstraints": {"ca": false}}
        })
    );
}

#[test]
fn pretty_output_keeps_field_order_and_indent() {
    let json = sample_record().to_json().unwrap();
    let keys: Vec<_> = ["\"issuer\"", "\"validFrom\"", "\"validTo\"", "\"subject\"", "\"extensions\""]
        .iter()
        .map(|k| json.find(k).unwrap())
        .collect();
    assert!(keys.windows(2).all(|w| w[0] < w[1]), "{}", json);
    assert!(json.starts_with("{\n    \"issuer\": \"CN=example.com\",\n"), "{}", json);
    assert!(json.contains("\n        \"organization\": null\n"), "{}", json);
}

#[test]
fn record_deserializes_from_its_json() {
    let record = sample_record();
    let parsed: CertificateRecord = serde_json::from_str(&record.to_json().unwrap()).unwrap();
    assert_eq!(parsed, record);
}
