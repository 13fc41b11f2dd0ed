// Copyright (c) 2023 The MobileCoin Foundation

//! Certificates presented by a server and the checks made directly on them

use crate::{Error, Result};
use core::fmt::{Debug, Display, Formatter};
use der::{pem::LineEnding, DateTime, Decode, DecodePem, Encode, EncodePem};
use rustls::pki_types::{CertificateDer, UnixTime};
use sha2::{Digest, Sha256};
use x509_cert::name::Name;
use x509_cert::time::Validity;
use x509_cert::Certificate as X509Certificate;

/// An X509 certificate as presented in a TLS handshake.
///
/// The identity of a certificate is its exact DER encoding. Two certificates
/// compare equal only if they are byte for byte the same.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    // Kept alongside the parsed form so the certificate can be handed back to
    // rustls without re-encoding.
    der: CertificateDer<'static>,
    certificate: X509Certificate,
}

impl Certificate {
    /// Decode a certificate from a PEM encoded string.
    ///
    /// # Errors
    /// `Error::CertificateDecoding` if `pem` is not a single PEM certificate.
    pub fn from_pem(pem: impl AsRef<[u8]>) -> Result<Self> {
        let certificate = X509Certificate::from_pem(pem)?;
        Self::try_from(certificate)
    }

    /// Encode the certificate as PEM.
    pub fn to_pem(&self) -> Result<String> {
        Ok(self.certificate.to_pem(LineEnding::LF)?)
    }

    /// The DER encoding of the certificate.
    pub fn der(&self) -> &CertificateDer<'static> {
        &self.der
    }

    /// The parsed X509 certificate.
    pub fn x509(&self) -> &X509Certificate {
        &self.certificate
    }

    /// The subject name of the certificate.
    pub fn subject(&self) -> &Name {
        &self.certificate.tbs_certificate.subject
    }

    /// The issuer name of the certificate.
    pub fn issuer(&self) -> &Name {
        &self.certificate.tbs_certificate.issuer
    }

    /// The validity period of the certificate.
    pub fn validity(&self) -> &Validity {
        &self.certificate.tbs_certificate.validity
    }

    /// SHA-256 digest of the DER encoding.
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint(Sha256::digest(self.der.as_ref()).into())
    }

    /// Check the validity period of the certificate against `now`.
    ///
    /// Both bounds of the validity period are inclusive. A certificate whose
    /// `notBefore` is after its `notAfter` is reported as not yet valid.
    ///
    /// # Errors
    /// `ValidityError::NotYetValid` if `now` is before `notBefore`,
    /// `ValidityError::Expired` if `now` is after `notAfter`.
    pub fn check_validity(&self, now: UnixTime) -> core::result::Result<(), ValidityError> {
        let validity = self.validity();
        let checked_at = now.as_secs();
        let not_before = validity.not_before.to_unix_duration().as_secs();
        let not_after = validity.not_after.to_unix_duration().as_secs();

        if checked_at < not_before {
            Err(ValidityError::NotYetValid(CertificateNotYetValid {
                not_before: validity.not_before.to_date_time(),
                checked_at: now,
            }))
        } else if checked_at > not_after {
            Err(ValidityError::Expired(CertificateExpired {
                not_after: validity.not_after.to_date_time(),
                checked_at: now,
            }))
        } else {
            Ok(())
        }
    }
}

impl TryFrom<X509Certificate> for Certificate {
    type Error = Error;

    fn try_from(certificate: X509Certificate) -> core::result::Result<Self, Self::Error> {
        let der = CertificateDer::from(certificate.to_der()?);
        Ok(Self { der, certificate })
    }
}

impl TryFrom<CertificateDer<'_>> for Certificate {
    type Error = Error;

    fn try_from(der: CertificateDer<'_>) -> core::result::Result<Self, Self::Error> {
        let certificate = X509Certificate::from_der(der.as_ref())?;
        Ok(Self {
            der: der.into_owned(),
            certificate,
        })
    }
}

impl TryFrom<&CertificateDer<'_>> for Certificate {
    type Error = Error;

    fn try_from(der: &CertificateDer<'_>) -> core::result::Result<Self, Self::Error> {
        Self::try_from(der.clone())
    }
}

impl TryFrom<&[u8]> for Certificate {
    type Error = Error;

    fn try_from(der: &[u8]) -> core::result::Result<Self, Self::Error> {
        Self::try_from(CertificateDer::from(der))
    }
}

/// SHA-256 fingerprint of a certificate's DER encoding.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl Display for Fingerprint {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl Debug for Fingerprint {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "Fingerprint({self})")
    }
}

/// The certificate expired at {not_after}
#[derive(displaydoc::Display, Debug, Clone, PartialEq, Eq)]
pub struct CertificateExpired {
    not_after: DateTime,
    checked_at: UnixTime,
}

impl CertificateExpired {
    /// The end of the certificate's validity period.
    pub fn not_after(&self) -> DateTime {
        self.not_after
    }

    /// The time the certificate was checked at.
    pub fn checked_at(&self) -> UnixTime {
        self.checked_at
    }
}

/// The certificate is not valid before {not_before}
#[derive(displaydoc::Display, Debug, Clone, PartialEq, Eq)]
pub struct CertificateNotYetValid {
    not_before: DateTime,
    checked_at: UnixTime,
}

impl CertificateNotYetValid {
    /// The start of the certificate's validity period.
    pub fn not_before(&self) -> DateTime {
        self.not_before
    }

    /// The time the certificate was checked at.
    pub fn checked_at(&self) -> UnixTime {
        self.checked_at
    }
}

/// Outcome of a failed validity period check
#[derive(displaydoc::Display, Debug, Clone, PartialEq, Eq)]
pub enum ValidityError {
    /// {0}
    Expired(CertificateExpired),
    /// {0}
    NotYetValid(CertificateNotYetValid),
}
