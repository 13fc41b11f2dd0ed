// Copyright (c) 2023 The MobileCoin Foundation

#![doc = include_str!("../README.md")]
#![deny(missing_docs, missing_debug_implementations, unsafe_code)]

mod certificate;
mod chain;
mod error;
mod evaluator;
mod failure;
mod known_servers;
mod platform;
mod tls;
mod validator;

#[cfg(test)]
mod test_support;

pub use crate::{
    certificate::{
        Certificate, CertificateExpired, CertificateNotYetValid, Fingerprint, ValidityError,
    },
    chain::{AuthType, CertificateChain},
    error::{Error, Result},
    evaluator::{TrustBasis, TrustDecision, TrustEvaluator},
    failure::CombinedTrustFailure,
    known_servers::{Alias, KnownServerStore, KnownServers, StoreError},
    platform::PlatformValidator,
    tls::{trust_failure, KnownServerVerifier},
    validator::{OtherValidationError, PathValidationError, StandardValidator, ValidationFailure},
};
