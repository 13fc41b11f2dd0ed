// Copyright (c) 2023 The MobileCoin Foundation

//! Errors that can occur building an evaluator or decoding its inputs

/// Result type for this crate
pub type Result<T> = core::result::Result<T, Error>;

/// Error constructing a trust evaluator or decoding certificates for it.
///
/// Trust denials are *not* reported through this type, see
/// [`CombinedTrustFailure`](crate::CombinedTrustFailure).
#[derive(displaydoc::Display, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No X509 validator could be built from the system trust anchors
    NoValidatorAvailable,
    /// No crypto provider offers signature verification algorithms
    AlgorithmUnavailable,
    /// The system trust store could not be read: {0}
    StoreUnavailable(String),
    /// An error occurred decoding a certificate: {0}
    CertificateDecoding(der::Error),
    /// A certificate chain must contain at least the server certificate
    EmptyChain,
}

impl From<der::Error> for Error {
    fn from(src: der::Error) -> Self {
        Error::CertificateDecoding(src)
    }
}

impl std::error::Error for Error {}
