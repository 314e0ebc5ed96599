use cert_check::{Certificate, CertificateSchema};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use openssl::asn1::Asn1Time;
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::PKey;
use openssl::x509::extension::BasicConstraints;
use openssl::x509::{X509Name, X509};

fn sample_certificate() -> X509 {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    let key = PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap();

    let mut name = X509Name::builder().unwrap();
    name.append_entry_by_nid(Nid::COUNTRYNAME, "US").unwrap();
    name.append_entry_by_nid(Nid::ORGANIZATIONNAME, "Bench Org").unwrap();
    name.append_entry_by_nid(Nid::COMMONNAME, "bench.example").unwrap();
    let name = name.build();

    let mut builder = X509::builder().unwrap();
    builder.set_version(2).unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(&key).unwrap();
    let nb = Asn1Time::days_from_now(0).unwrap();
    builder.set_not_before(&nb).unwrap();
    let na = Asn1Time::days_from_now(365).unwrap();
    builder.set_not_after(&na).unwrap();
    builder
        .append_extension(BasicConstraints::new().critical().ca().build().unwrap())
        .unwrap();
    builder.sign(&key, MessageDigest::sha256()).unwrap();
    builder.build()
}

fn bench_check(c: &mut Criterion) {
    let x509 = sample_certificate();
    let pem = x509.to_pem().unwrap();
    let der = x509.to_der().unwrap();
    let schema = CertificateSchema::embedded().unwrap();

    c.bench_function("load pem", |b| {
        b.iter(|| Certificate::from_bytes(black_box(&pem)).unwrap())
    });
    c.bench_function("load der", |b| {
        b.iter(|| Certificate::from_bytes(black_box(&der)).unwrap())
    });

    let cert = Certificate::from_bytes(&pem).unwrap();
    c.bench_function("project", |b| b.iter(|| cert.project().unwrap()));

    let record = cert.project().unwrap();
    c.bench_function("validate", |b| b.iter(|| schema.validate(black_box(&record)).unwrap()));
}

criterion_group!(benches, bench_check);
criterion_main!(benches);
