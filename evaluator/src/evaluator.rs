// Copyright (c) 2023 The MobileCoin Foundation

//! Trust decisions for server certificate chains

use crate::{
    AuthType, Certificate, CertificateChain, CombinedTrustFailure, KnownServerStore,
    PlatformValidator, Result, StandardValidator, ValidationFailure,
};
use rustls::pki_types::UnixTime;
use std::sync::Arc;

/// Why a server certificate chain was trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustBasis {
    /// The user explicitly trusted the server certificate. Standard
    /// validation was skipped.
    KnownServer,
    /// The chain validated against the standard trust anchors.
    Validated,
}

/// The outcome of evaluating a server certificate chain.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustDecision {
    /// The chain is trusted.
    Trusted(TrustBasis),
    /// The chain is not trusted, for every reason listed.
    Untrusted(CombinedTrustFailure),
}

impl TrustDecision {
    /// Whether the chain is trusted.
    pub fn is_trusted(&self) -> bool {
        matches!(self, TrustDecision::Trusted(_))
    }

    /// The failure, if the chain is not trusted.
    pub fn failure(&self) -> Option<&CombinedTrustFailure> {
        match self {
            TrustDecision::Trusted(_) => None,
            TrustDecision::Untrusted(failure) => Some(failure),
        }
    }

    /// Convert into a [`Result`], trusted chains being `Ok`.
    pub fn into_result(self) -> core::result::Result<TrustBasis, CombinedTrustFailure> {
        match self {
            TrustDecision::Trusted(basis) => Ok(basis),
            TrustDecision::Untrusted(failure) => Err(failure),
        }
    }
}

/// Decides whether to trust the certificate chain a server presents.
///
/// A server certificate the user explicitly trusted, as recorded in the
/// [`KnownServerStore`], is always trusted. Any other chain is checked by the
/// [`StandardValidator`] *and* by a validity period check of the server
/// certificate. When either fails, every reason is reported together in a
/// [`CombinedTrustFailure`] so the user can be asked about all of them at
/// once.
///
/// The evaluator holds no mutable state and can be shared between
/// connections.
#[derive(Debug)]
pub struct TrustEvaluator<V = PlatformValidator> {
    validator: V,
    known_servers: Arc<dyn KnownServerStore>,
}

impl TrustEvaluator<PlatformValidator> {
    /// Create a new instance using the system trust anchors.
    ///
    /// # Errors
    /// * `Error::NoValidatorAvailable` if no usable trust anchor was found.
    /// * `Error::AlgorithmUnavailable` if no crypto provider is available.
    /// * `Error::StoreUnavailable` if the system trust store can't be read.
    pub fn new(known_servers: Arc<dyn KnownServerStore>) -> Result<Self> {
        let validator = PlatformValidator::new()?;
        Ok(Self::with_validator(validator, known_servers))
    }
}

impl<V: StandardValidator> TrustEvaluator<V> {
    /// Create a new instance with a specific standard validator.
    pub fn with_validator(validator: V, known_servers: Arc<dyn KnownServerStore>) -> Self {
        Self {
            validator,
            known_servers,
        }
    }

    /// The standard validator used for chains of unknown servers.
    pub fn validator(&self) -> &V {
        &self.validator
    }

    /// Evaluate a server's certificate chain at the current time.
    ///
    /// See [`TrustEvaluator::evaluate_server_at()`].
    pub fn evaluate_server(&self, chain: &CertificateChain, auth_type: &AuthType) -> TrustDecision {
        self.evaluate_server_at(chain, auth_type, UnixTime::now())
    }

    /// Evaluate a server's certificate chain.
    ///
    /// # Arguments
    /// * `chain` - The leaf first certificate chain sent by the server.
    /// * `auth_type` - The key exchange label, passed through to the standard
    ///   validator.
    /// * `now` - The time to evaluate the chain at.
    pub fn evaluate_server_at(
        &self,
        chain: &CertificateChain,
        auth_type: &AuthType,
        now: UnixTime,
    ) -> TrustDecision {
        let leaf = chain.leaf();
        if self.is_known_server(leaf) {
            tracing::debug!(
                fingerprint = %leaf.fingerprint(),
                "server certificate explicitly trusted, skipping validation"
            );
            return TrustDecision::Trusted(TrustBasis::KnownServer);
        }

        let mut failure = CombinedTrustFailure::new(leaf.clone());
        if let Err(error) = leaf.check_validity(now) {
            failure.record_validity(error);
        }
        if let Err(error) = self.validator.check_server_trusted(chain, auth_type, now) {
            failure.record_validation(error);
        }

        if failure.has_failures() {
            tracing::info!(
                fingerprint = %leaf.fingerprint(),
                %auth_type,
                reasons = %failure,
                "server certificate chain not trusted"
            );
            TrustDecision::Untrusted(failure)
        } else {
            tracing::debug!(fingerprint = %leaf.fingerprint(), "server certificate chain validated");
            TrustDecision::Trusted(TrustBasis::Validated)
        }
    }

    /// Validate a client's certificate chain at the current time.
    ///
    /// This goes straight to the standard validator, the known servers play
    /// no part in it.
    ///
    /// # Errors
    /// The validator's [`ValidationFailure`], as is.
    pub fn check_client_trusted(
        &self,
        chain: &CertificateChain,
        auth_type: &AuthType,
    ) -> core::result::Result<(), ValidationFailure> {
        self.check_client_trusted_at(chain, auth_type, UnixTime::now())
    }

    /// Validate a client's certificate chain at `now`.
    ///
    /// # Errors
    /// The validator's [`ValidationFailure`], as is.
    pub fn check_client_trusted_at(
        &self,
        chain: &CertificateChain,
        auth_type: &AuthType,
        now: UnixTime,
    ) -> core::result::Result<(), ValidationFailure> {
        self.validator.check_client_trusted(chain, auth_type, now)
    }

    /// The issuers accepted by the standard validator.
    pub fn accepted_issuers(&self) -> Vec<Certificate> {
        self.validator.accepted_issuers()
    }

    /// Whether the user explicitly trusted `certificate`.
    ///
    /// A store that can't be read knows no servers, so a failing lookup never
    /// grants trust.
    pub fn is_known_server(&self, certificate: &Certificate) -> bool {
        match self.known_servers.lookup(certificate) {
            Ok(alias) => alias.is_some(),
            Err(error) => {
                tracing::warn!(
                    fingerprint = %certificate.fingerprint(),
                    %error,
                    "failed checking certificate in the known servers store"
                );
                false
            }
        }
    }
}
