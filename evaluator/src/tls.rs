// Copyright (c) 2023 The MobileCoin Foundation

//! Use of a [`TrustEvaluator`] as the server certificate verifier of a rustls
//! client.

use crate::{
    AuthType, CertificateChain, CombinedTrustFailure, OtherValidationError, PlatformValidator,
    TrustBasis, TrustDecision, TrustEvaluator,
};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::verify_server_name;
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::server::ParsedCertificate;
use rustls::{CertificateError, ClientConfig, DigitallySignedStruct, OtherError, SignatureScheme};
use std::sync::Arc;

/// A rustls [`ServerCertVerifier`] that defers to a [`TrustEvaluator`].
///
/// Server certificates the user explicitly trusted are accepted for any
/// server name, as the user pinned that exact certificate. Every other chain
/// must validate *and* be issued for the server name being connected to.
///
/// A rejected chain fails the handshake with
/// `CertificateError::Other`, carrying the [`CombinedTrustFailure`]. A chain
/// that validates for another server name is rejected the same way, with
/// [`OtherValidationError::NotValidForName`] as its other failure. Use
/// [`trust_failure()`] to get it back out of the handshake error.
#[derive(Debug)]
pub struct KnownServerVerifier {
    evaluator: Arc<TrustEvaluator<PlatformValidator>>,
}

impl KnownServerVerifier {
    /// Create a new instance
    pub fn new(evaluator: Arc<TrustEvaluator<PlatformValidator>>) -> Self {
        Self { evaluator }
    }

    /// The evaluator making the trust decisions.
    pub fn evaluator(&self) -> &TrustEvaluator<PlatformValidator> {
        &self.evaluator
    }

    /// Build a client configuration that verifies servers with this verifier.
    ///
    /// # Errors
    /// Propagates any error from
    /// [`rustls::ConfigBuilder::with_safe_default_protocol_versions`].
    pub fn client_config(self: Arc<Self>) -> Result<ClientConfig, rustls::Error> {
        let provider = self.provider().clone();
        Ok(ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()?
            .dangerous()
            .with_custom_certificate_verifier(self)
            .with_no_client_auth())
    }

    fn provider(&self) -> &Arc<CryptoProvider> {
        self.evaluator.validator().provider()
    }
}

impl ServerCertVerifier for KnownServerVerifier {
    // Note: OCSP responses are not checked, neither the evaluator nor the
    // platform validator does revocation checking.
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        let chain = CertificateChain::try_from_handshake(end_entity, intermediates)
            .map_err(|_| rustls::Error::InvalidCertificate(CertificateError::BadEncoding))?;
        let auth_type = AuthType::from_certificate(chain.leaf());

        match self.evaluator.evaluate_server_at(&chain, &auth_type, now) {
            TrustDecision::Trusted(TrustBasis::KnownServer) => Ok(ServerCertVerified::assertion()),
            TrustDecision::Trusted(TrustBasis::Validated) => {
                let end_entity = ParsedCertificate::try_from(end_entity)?;
                match verify_server_name(&end_entity, server_name) {
                    Ok(()) => Ok(ServerCertVerified::assertion()),
                    Err(rustls::Error::InvalidCertificate(
                        CertificateError::NotValidForName
                        | CertificateError::NotValidForNameContext { .. },
                    )) => {
                        tracing::info!(
                            fingerprint = %chain.leaf().fingerprint(),
                            ?server_name,
                            "server certificate not issued for server name"
                        );
                        let mut failure = CombinedTrustFailure::new(chain.leaf().clone());
                        failure.record_validation(OtherValidationError::NotValidForName.into());
                        Err(untrusted(failure))
                    }
                    Err(error) => Err(error),
                }
            }
            TrustDecision::Untrusted(failure) => Err(untrusted(failure)),
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider().signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider().signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider()
            .signature_verification_algorithms
            .supported_schemes()
    }
}

fn untrusted(failure: CombinedTrustFailure) -> rustls::Error {
    rustls::Error::InvalidCertificate(CertificateError::Other(OtherError(Arc::new(failure))))
}

/// The [`CombinedTrustFailure`] a [`KnownServerVerifier`] rejected a
/// handshake with, if that is what `error` is.
pub fn trust_failure(error: &rustls::Error) -> Option<&CombinedTrustFailure> {
    match error {
        rustls::Error::InvalidCertificate(CertificateError::Other(OtherError(inner))) => {
            inner.downcast_ref::<CombinedTrustFailure>()
        }
        _ => None,
    }
}
