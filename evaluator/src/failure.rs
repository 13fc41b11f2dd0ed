// Copyright (c) 2023 The MobileCoin Foundation

//! Every reason a server certificate chain was not trusted

use crate::{
    Certificate, CertificateExpired, CertificateNotYetValid, OtherValidationError,
    PathValidationError, ValidationFailure, ValidityError,
};
use core::fmt::{Display, Formatter};

/// The reasons a server certificate chain was not trusted.
///
/// The reasons are independent of each other: a certificate can be expired
/// *and* be issued by an unknown root. At most one of
/// [`path_validation_failure()`](Self::path_validation_failure) and
/// [`other_failure()`](Self::other_failure) is present, and at most one of
/// [`expired()`](Self::expired) and [`not_yet_valid()`](Self::not_yet_valid).
///
/// An instance handed out by the evaluator always has at least one reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinedTrustFailure {
    server_certificate: Certificate,
    expired: Option<CertificateExpired>,
    not_yet_valid: Option<CertificateNotYetValid>,
    path_validation_failure: Option<PathValidationError>,
    other_failure: Option<OtherValidationError>,
}

impl CombinedTrustFailure {
    /// Start collecting the reasons `server_certificate` is not trusted.
    pub(crate) fn new(server_certificate: Certificate) -> Self {
        Self {
            server_certificate,
            expired: None,
            not_yet_valid: None,
            path_validation_failure: None,
            other_failure: None,
        }
    }

    pub(crate) fn record_validity(&mut self, error: ValidityError) {
        match error {
            ValidityError::Expired(expired) => self.expired = Some(expired),
            ValidityError::NotYetValid(not_yet_valid) => self.not_yet_valid = Some(not_yet_valid),
        }
    }

    pub(crate) fn record_validation(&mut self, failure: ValidationFailure) {
        match failure {
            ValidationFailure::PathValidation(error) => {
                self.other_failure = None;
                self.path_validation_failure = Some(error);
            }
            ValidationFailure::Other(error) => {
                self.path_validation_failure = None;
                self.other_failure = Some(error);
            }
        }
    }

    /// Whether any reason has been recorded.
    pub fn has_failures(&self) -> bool {
        self.expired.is_some()
            || self.not_yet_valid.is_some()
            || self.path_validation_failure.is_some()
            || self.other_failure.is_some()
    }

    /// The server certificate the chain was rejected for.
    ///
    /// This is the certificate to add to a
    /// [`KnownServers`](crate::KnownServers) store if the user decides to
    /// trust it anyway.
    pub fn server_certificate(&self) -> &Certificate {
        &self.server_certificate
    }

    /// Present if the server certificate has expired.
    pub fn expired(&self) -> Option<&CertificateExpired> {
        self.expired.as_ref()
    }

    /// Present if the server certificate is not valid yet.
    pub fn not_yet_valid(&self) -> Option<&CertificateNotYetValid> {
        self.not_yet_valid.as_ref()
    }

    /// Present if no chain of trust leads to a trusted root.
    pub fn path_validation_failure(&self) -> Option<&PathValidationError> {
        self.path_validation_failure.as_ref()
    }

    /// Present if validation failed for any other reason.
    pub fn other_failure(&self) -> Option<&OtherValidationError> {
        self.other_failure.as_ref()
    }
}

impl Display for CombinedTrustFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "Server certificate for {} is not trusted",
            self.server_certificate.subject()
        )?;
        let mut separator = ": ";
        let mut reason = |f: &mut Formatter<'_>, text: &dyn Display| {
            let result = write!(f, "{separator}{text}");
            separator = "; ";
            result
        };
        if let Some(expired) = &self.expired {
            reason(f, expired)?;
        }
        if let Some(not_yet_valid) = &self.not_yet_valid {
            reason(f, not_yet_valid)?;
        }
        if let Some(error) = &self.path_validation_failure {
            reason(f, &ValidationFailure::PathValidation(error.clone()))?;
        }
        if let Some(error) = &self.other_failure {
            reason(f, error)?;
        }
        Ok(())
    }
}

impl std::error::Error for CombinedTrustFailure {}
