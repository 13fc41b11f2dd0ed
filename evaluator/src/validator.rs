// Copyright (c) 2023 The MobileCoin Foundation

//! Trait and failure types for standard certificate chain validation

use crate::{AuthType, Certificate, CertificateChain};
use core::fmt::Debug;
use rustls::pki_types::UnixTime;

/// Why a chain of trust could not be established from the leaf to a trust
/// anchor.
#[derive(displaydoc::Display, Debug, Clone, PartialEq, Eq)]
pub enum PathValidationError {
    /// The certificate chain is not issued by a trusted root
    UnknownIssuer,
    /// A signature in the certificate chain does not match its issuer
    BadSignature,
    /// A certificate in the certification path has expired
    Expired,
    /// A certificate in the certification path is not yet valid
    NotYetValid,
}

/// A validator failure that is not a broken chain of trust.
#[derive(displaydoc::Display, Debug, Clone, PartialEq, Eq)]
pub enum OtherValidationError {
    /// A certificate in the chain could not be decoded
    BadEncoding,
    /// A certificate in the chain has been revoked
    Revoked,
    /// The revocation status of a certificate could not be determined
    UnknownRevocationStatus,
    /// A certificate contains an unsupported critical extension
    UnhandledCriticalExtension,
    /// The certificate is not valid for the requested purpose
    InvalidPurpose,
    /// The certificate is not valid for the server name
    NotValidForName,
    /// The certificate chain was rejected: {0}
    Rejected(String),
}

/// A failure reported by a [`StandardValidator`].
///
/// Validators classify their failures when they produce them, so callers
/// never need to dig through nested causes to tell a broken chain of trust
/// from any other rejection.
#[derive(displaydoc::Display, Debug, Clone, PartialEq, Eq)]
pub enum ValidationFailure {
    /// Certification path validation failed: {0}
    PathValidation(PathValidationError),
    /// {0}
    Other(OtherValidationError),
}

impl From<PathValidationError> for ValidationFailure {
    fn from(error: PathValidationError) -> Self {
        ValidationFailure::PathValidation(error)
    }
}

impl From<OtherValidationError> for ValidationFailure {
    fn from(error: OtherValidationError) -> Self {
        ValidationFailure::Other(error)
    }
}

impl std::error::Error for ValidationFailure {}

/// Full chain of trust validation against a set of trust anchors.
///
/// Implementations are shared between connections and must be safe for
/// concurrent use.
pub trait StandardValidator: Debug + Send + Sync {
    /// Validate a server's certificate chain.
    ///
    /// # Arguments
    /// * `chain` - The leaf first certificate chain sent by the server.
    /// * `auth_type` - The key exchange label, used only to select policy.
    /// * `now` - The time to validate the chain at.
    ///
    /// # Errors
    /// The classified [`ValidationFailure`] if the chain is not trusted.
    fn check_server_trusted(
        &self,
        chain: &CertificateChain,
        auth_type: &AuthType,
        now: UnixTime,
    ) -> Result<(), ValidationFailure>;

    /// Validate a client's certificate chain.
    ///
    /// # Errors
    /// The classified [`ValidationFailure`] if the chain is not trusted.
    fn check_client_trusted(
        &self,
        chain: &CertificateChain,
        auth_type: &AuthType,
        now: UnixTime,
    ) -> Result<(), ValidationFailure>;

    /// The certificates of the issuers this validator trusts.
    fn accepted_issuers(&self) -> Vec<Certificate>;
}
