// Copyright (c) 2023 The MobileCoin Foundation

//! Implementation of standard chain validation using rustls and webpki.

use crate::{
    AuthType, Certificate, CertificateChain, Error, OtherValidationError, PathValidationError,
    Result, StandardValidator, ValidationFailure,
};
use core::fmt::{Debug, Formatter};
use rustls::client::verify_server_cert_signed_by_trust_anchor;
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, UnixTime};
use rustls::server::danger::ClientCertVerifier;
use rustls::server::{ParsedCertificate, VerifierBuilderError, WebPkiClientVerifier};
use rustls::{CertificateError, OtherError, RootCertStore};
use std::sync::Arc;

/// A [`StandardValidator`] backed by the rustls webpki verifier.
///
/// The default instance trusts the operating system's root certificates and
/// nothing else. Certificates a user explicitly trusted are *not* added as
/// trust anchors, the evaluator consults those separately.
#[derive(Clone)]
pub struct PlatformValidator {
    roots: Arc<RootCertStore>,
    issuers: Vec<Certificate>,
    provider: Arc<CryptoProvider>,
    client_verifier: Arc<dyn ClientCertVerifier>,
}

impl Debug for PlatformValidator {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "PlatformValidator{{anchors: {}}}", self.roots.len())
    }
}

impl PlatformValidator {
    /// Create a new instance trusting the system root certificates.
    ///
    /// # Errors
    /// * `Error::StoreUnavailable` if the system root store can't be read.
    /// * `Error::NoValidatorAvailable` if none of the roots are usable.
    /// * `Error::AlgorithmUnavailable` if no crypto provider is available.
    pub fn new() -> Result<Self> {
        let native = rustls_native_certs::load_native_certs();
        for error in &native.errors {
            tracing::warn!(%error, "failed loading system root certificates");
        }
        if native.certs.is_empty() {
            if let Some(error) = native.errors.first() {
                return Err(Error::StoreUnavailable(error.to_string()));
            }
        }
        Self::with_anchors(native.certs)
    }

    /// Create a new instance trusting `anchors`, with the process default
    /// crypto provider.
    ///
    /// When no process default provider has been installed the `ring` provider
    /// is used.
    ///
    /// # Errors
    /// * `Error::NoValidatorAvailable` if none of `anchors` are usable.
    /// * `Error::AlgorithmUnavailable` if the provider can't verify
    ///   signatures.
    pub fn with_anchors(
        anchors: impl IntoIterator<Item = CertificateDer<'static>>,
    ) -> Result<Self> {
        let provider = CryptoProvider::get_default()
            .cloned()
            .unwrap_or_else(|| Arc::new(rustls::crypto::ring::default_provider()));
        Self::with_provider(anchors, provider)
    }

    /// Create a new instance trusting `anchors` and verifying signatures with
    /// `provider`.
    ///
    /// Anchors that can't be parsed are skipped.
    ///
    /// # Errors
    /// * `Error::NoValidatorAvailable` if none of `anchors` are usable.
    /// * `Error::AlgorithmUnavailable` if the provider can't verify
    ///   signatures.
    pub fn with_provider(
        anchors: impl IntoIterator<Item = CertificateDer<'static>>,
        provider: Arc<CryptoProvider>,
    ) -> Result<Self> {
        if provider.signature_verification_algorithms.all.is_empty() {
            return Err(Error::AlgorithmUnavailable);
        }

        let mut roots = RootCertStore::empty();
        let mut issuers = Vec::new();
        let mut skipped = 0usize;
        for anchor in anchors {
            if roots.add(anchor.clone()).is_err() {
                skipped += 1;
                continue;
            }
            match Certificate::try_from(anchor) {
                Ok(issuer) => issuers.push(issuer),
                Err(error) => tracing::warn!(%error, "trust anchor is not a valid X509 certificate"),
            }
        }
        if skipped > 0 {
            tracing::warn!(skipped, "ignored unusable trust anchors");
        }

        let roots = Arc::new(roots);
        let client_verifier =
            WebPkiClientVerifier::builder_with_provider(roots.clone(), provider.clone())
                .build()
                .map_err(|error| match error {
                    VerifierBuilderError::NoRootAnchors => Error::NoValidatorAvailable,
                    _ => Error::AlgorithmUnavailable,
                })?;
        tracing::debug!(anchors = roots.len(), "built platform certificate validator");

        Ok(Self {
            roots,
            issuers,
            provider,
            client_verifier,
        })
    }

    /// The crypto provider signatures are verified with.
    pub fn provider(&self) -> &Arc<CryptoProvider> {
        &self.provider
    }
}

impl StandardValidator for PlatformValidator {
    // Note: `_auth_type` is not needed, webpki picks the signature algorithms
    // from the certificates themselves.
    fn check_server_trusted(
        &self,
        chain: &CertificateChain,
        _auth_type: &AuthType,
        now: UnixTime,
    ) -> core::result::Result<(), ValidationFailure> {
        let end_entity = ParsedCertificate::try_from(chain.leaf().der()).map_err(classify)?;
        let intermediates = intermediate_ders(chain);
        verify_server_cert_signed_by_trust_anchor(
            &end_entity,
            &self.roots,
            &intermediates,
            now,
            self.provider.signature_verification_algorithms.all,
        )
        .map_err(classify)
    }

    fn check_client_trusted(
        &self,
        chain: &CertificateChain,
        _auth_type: &AuthType,
        now: UnixTime,
    ) -> core::result::Result<(), ValidationFailure> {
        let intermediates = intermediate_ders(chain);
        self.client_verifier
            .verify_client_cert(chain.leaf().der(), &intermediates, now)
            .map(|_| ())
            .map_err(classify)
    }

    fn accepted_issuers(&self) -> Vec<Certificate> {
        self.issuers.clone()
    }
}

fn intermediate_ders(chain: &CertificateChain) -> Vec<CertificateDer<'static>> {
    chain
        .intermediates()
        .iter()
        .map(|certificate| certificate.der().clone())
        .collect()
}

/// Sort a rustls error into a broken chain of trust or anything else.
fn classify(error: rustls::Error) -> ValidationFailure {
    let error = match error {
        rustls::Error::InvalidCertificate(error) => error,
        other => return OtherValidationError::Rejected(other.to_string()).into(),
    };
    match error {
        CertificateError::UnknownIssuer => PathValidationError::UnknownIssuer.into(),
        CertificateError::BadSignature => PathValidationError::BadSignature.into(),
        // Time checks at this level concern every certificate in the path,
        // not just the leaf.
        CertificateError::Expired | CertificateError::ExpiredContext { .. } => {
            PathValidationError::Expired.into()
        }
        CertificateError::NotValidYet | CertificateError::NotValidYetContext { .. } => {
            PathValidationError::NotYetValid.into()
        }
        CertificateError::BadEncoding => OtherValidationError::BadEncoding.into(),
        CertificateError::Revoked => OtherValidationError::Revoked.into(),
        CertificateError::UnknownRevocationStatus => {
            OtherValidationError::UnknownRevocationStatus.into()
        }
        CertificateError::UnhandledCriticalExtension => {
            OtherValidationError::UnhandledCriticalExtension.into()
        }
        CertificateError::InvalidPurpose => OtherValidationError::InvalidPurpose.into(),
        CertificateError::NotValidForName | CertificateError::NotValidForNameContext { .. } => {
            OtherValidationError::NotValidForName.into()
        }
        CertificateError::Other(OtherError(error)) => {
            OtherValidationError::Rejected(error.to_string()).into()
        }
        other => {
            OtherValidationError::Rejected(rustls::Error::InvalidCertificate(other).to_string())
                .into()
        }
    }
}
