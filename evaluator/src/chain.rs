// Copyright (c) 2023 The MobileCoin Foundation

//! Certificate chains presented by a server

use crate::{Certificate, Error, Result};
use core::fmt::{Display, Formatter};
use rustls::pki_types::CertificateDer;
use x509_cert::spki::ObjectIdentifier;

const OID_PKCS1_RSA_ENCRYPTION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
const OID_RSASSA_PSS: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.10");
const OID_EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
const OID_ED25519: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.112");
const OID_ED448: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.113");

/// An X509 certificate chain as sent by a server.
///
/// The chain is ordered leaf first, the server's own certificate followed by
/// the certificates of its issuers. A chain always holds at least the leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateChain {
    certificates: Vec<Certificate>,
}

impl CertificateChain {
    /// Create a new certificate chain from leaf first `certificates`.
    ///
    /// # Errors
    /// `Error::EmptyChain` if `certificates` is empty.
    pub fn new(certificates: Vec<Certificate>) -> Result<Self> {
        if certificates.is_empty() {
            return Err(Error::EmptyChain);
        }
        Ok(Self { certificates })
    }

    /// Create a certificate chain from the certificates of a TLS handshake.
    ///
    /// # Errors
    /// `Error::CertificateDecoding` if one of the certificates is not valid
    /// DER.
    pub fn try_from_handshake(
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
    ) -> Result<Self> {
        let certificates = core::iter::once(end_entity)
            .chain(intermediates)
            .map(Certificate::try_from)
            .collect::<Result<Vec<_>>>()?;
        Self::new(certificates)
    }

    /// The server's own certificate.
    pub fn leaf(&self) -> &Certificate {
        // `new()` refuses empty chains
        &self.certificates[0]
    }

    /// The issuer certificates that follow the leaf.
    pub fn intermediates(&self) -> &[Certificate] {
        &self.certificates[1..]
    }

    /// The number of certificates in the chain, including the leaf.
    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    /// Always `false`, a chain holds at least its leaf.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterate over the certificates, leaf first.
    pub fn iter(&self) -> impl Iterator<Item = &Certificate> {
        self.certificates.iter()
    }
}

impl AsRef<[Certificate]> for CertificateChain {
    fn as_ref(&self) -> &[Certificate] {
        &self.certificates
    }
}

impl TryFrom<Vec<Certificate>> for CertificateChain {
    type Error = Error;

    fn try_from(certificates: Vec<Certificate>) -> core::result::Result<Self, Self::Error> {
        Self::new(certificates)
    }
}

impl TryFrom<&[&[u8]]> for CertificateChain {
    type Error = Error;

    fn try_from(ders: &[&[u8]]) -> core::result::Result<Self, Self::Error> {
        let certificates = ders
            .iter()
            .map(|der| Certificate::try_from(*der))
            .collect::<Result<Vec<_>>>()?;
        Self::new(certificates)
    }
}

impl From<Certificate> for CertificateChain {
    fn from(leaf: Certificate) -> Self {
        Self {
            certificates: vec![leaf],
        }
    }
}

/// The key exchange or authentication algorithm label of a handshake.
///
/// This is opaque to the evaluator, it is only handed to the standard
/// validator to select its policy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AuthType(String);

impl AuthType {
    /// Create a new label.
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// Derive the label from the public key algorithm of `certificate`.
    ///
    /// For transports that don't report the key exchange, like TLS 1.3.
    pub fn from_certificate(certificate: &Certificate) -> Self {
        let algorithm = &certificate
            .x509()
            .tbs_certificate
            .subject_public_key_info
            .algorithm;
        let label = match algorithm.oid {
            OID_PKCS1_RSA_ENCRYPTION | OID_RSASSA_PSS => "RSA",
            OID_EC_PUBLIC_KEY => "ECDSA",
            OID_ED25519 | OID_ED448 => "EdDSA",
            _ => "UNKNOWN",
        };
        Self::new(label)
    }

    /// The label as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for AuthType {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AuthType {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}
