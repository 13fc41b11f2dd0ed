// Copyright (c) 2023 The MobileCoin Foundation

//! Certificates generated on the fly and a scripted validator for tests

use super::{AuthType, Certificate, CertificateChain, StandardValidator, ValidationFailure};
use core::str::FromStr;
use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use der::asn1::{Ia5String, UtcTime};
use der::Decode;
use p256::ecdsa::{DerSignature, SigningKey};
use p256::pkcs8::EncodePublicKey;
use rand::rngs::OsRng;
use rustls::pki_types::UnixTime;
use std::time::Duration;
use x509_cert::builder::{Builder, CertificateBuilder, Profile};
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::ext::pkix::SubjectAltName;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::SubjectPublicKeyInfoOwned;
use x509_cert::time::{Time, Validity};

/// 2023-11-14T22:13:20Z
pub(crate) const NOW: u64 = 1_700_000_000;
pub(crate) const DAY: u64 = 86_400;
pub(crate) const YEAR: u64 = 365 * DAY;

static SERIAL: AtomicU32 = AtomicU32::new(1);

pub(crate) fn at(secs: u64) -> UnixTime {
    UnixTime::since_unix_epoch(Duration::from_secs(secs))
}

/// A server certificate for `host` signed by its own freshly generated key.
pub(crate) fn self_signed(host: &str, not_before: u64, not_after: u64) -> Certificate {
    let key = SigningKey::random(&mut OsRng);
    sign(
        Profile::Manual { issuer: None },
        host,
        Some(host),
        (not_before, not_after),
        &key,
        &key,
    )
}

/// A root certificate authority that can issue server certificates.
pub(crate) struct Authority {
    key: SigningKey,
    certificate: Certificate,
}

impl Authority {
    pub(crate) fn new(common_name: &str) -> Self {
        let key = SigningKey::random(&mut OsRng);
        let certificate = sign(
            Profile::Root,
            common_name,
            None,
            (NOW - 10 * YEAR, NOW + 10 * YEAR),
            &key,
            &key,
        );
        Self { key, certificate }
    }

    pub(crate) fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    /// Issue a server certificate for `host`.
    pub(crate) fn issue(&self, host: &str, not_before: u64, not_after: u64) -> Certificate {
        let profile = Profile::Manual {
            issuer: Some(self.certificate.subject().clone()),
        };
        let leaf_key = SigningKey::random(&mut OsRng);
        sign(
            profile,
            host,
            Some(host),
            (not_before, not_after),
            &leaf_key,
            &self.key,
        )
    }
}

// Server certificates always get a subject alternative name. Without any
// extension the builder emits an X509 v1 certificate, which webpki refuses.
fn sign(
    profile: Profile,
    common_name: &str,
    host: Option<&str>,
    (not_before, not_after): (u64, u64),
    subject_key: &SigningKey,
    signer: &SigningKey,
) -> Certificate {
    let serial_number = SerialNumber::from(SERIAL.fetch_add(1, Ordering::Relaxed));
    let validity = Validity {
        not_before: time(not_before),
        not_after: time(not_after),
    };
    let subject = Name::from_str(&format!("CN={common_name}")).expect("Invalid subject");
    let public_key = subject_key
        .verifying_key()
        .to_public_key_der()
        .expect("Failed encoding public key");
    let spki = SubjectPublicKeyInfoOwned::from_der(public_key.as_bytes())
        .expect("Failed decoding public key");

    let mut builder =
        CertificateBuilder::new(profile, serial_number, validity, subject, spki, signer)
            .expect("Failed creating certificate builder");
    if let Some(host) = host {
        let dns_name = Ia5String::new(host).expect("Invalid DNS name");
        builder
            .add_extension(&SubjectAltName(vec![GeneralName::DnsName(dns_name)]))
            .expect("Failed adding subject alternative name");
    }
    let certificate = builder
        .build::<DerSignature>()
        .expect("Failed signing certificate");
    Certificate::try_from(certificate).expect("Failed encoding certificate")
}

fn time(secs: u64) -> Time {
    let utc = UtcTime::from_unix_duration(Duration::from_secs(secs)).expect("Time out of range");
    Time::UtcTime(utc)
}

/// A validator that gives the same answer for every chain and counts how
/// often it is asked about servers.
#[derive(Debug)]
pub(crate) struct ScriptedValidator {
    outcome: Result<(), ValidationFailure>,
    issuers: Vec<Certificate>,
    calls: AtomicUsize,
}

impl ScriptedValidator {
    pub(crate) fn accepting() -> Self {
        Self::new(Ok(()))
    }

    pub(crate) fn rejecting(failure: impl Into<ValidationFailure>) -> Self {
        Self::new(Err(failure.into()))
    }

    pub(crate) fn new(outcome: Result<(), ValidationFailure>) -> Self {
        Self {
            outcome,
            issuers: Vec::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_issuers(mut self, issuers: Vec<Certificate>) -> Self {
        self.issuers = issuers;
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl StandardValidator for ScriptedValidator {
    fn check_server_trusted(
        &self,
        _chain: &CertificateChain,
        _auth_type: &AuthType,
        _now: UnixTime,
    ) -> Result<(), ValidationFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }

    fn check_client_trusted(
        &self,
        _chain: &CertificateChain,
        _auth_type: &AuthType,
        _now: UnixTime,
    ) -> Result<(), ValidationFailure> {
        self.outcome.clone()
    }

    fn accepted_issuers(&self) -> Vec<Certificate> {
        self.issuers.clone()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use x509_cert::certificate::Version;

    #[test]
    fn generated_certificates_are_v3() {
        let authority = Authority::new("Version Root CA");
        let issued = authority.issue("issued.example.com", NOW, NOW + YEAR);
        let own = self_signed("self.example.com", NOW, NOW + YEAR);

        for certificate in [authority.certificate(), &issued, &own] {
            assert_eq!(certificate.x509().tbs_certificate.version, Version::V3);
        }
    }
}
