// Copyright (c) 2023 The MobileCoin Foundation

//! Server certificates the user has explicitly chosen to trust

use crate::{Certificate, Result};
use core::fmt::{Debug, Display, Formatter};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use x509_cert::Certificate as X509Certificate;

/// The key a certificate is stored under in a [`KnownServerStore`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Alias(String);

impl Alias {
    /// Create a new alias.
    pub fn new(alias: impl Into<String>) -> Self {
        Self(alias.into())
    }

    /// The alias as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Alias {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&Certificate> for Alias {
    fn from(certificate: &Certificate) -> Self {
        Self(certificate.fingerprint().to_string())
    }
}

/// Error reading a [`KnownServerStore`]
#[derive(displaydoc::Display, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The known server store could not be read: {0}
    Unavailable(String),
}

impl std::error::Error for StoreError {}

/// Lookup of server certificates a user explicitly trusted.
///
/// The store is shared by every connection and may be written to, by the
/// user accepting or revoking a certificate, while lookups are in flight.
/// Implementations own their thread safety.
pub trait KnownServerStore: Debug + Send + Sync {
    /// Find the alias `certificate` is stored under.
    ///
    /// # Returns
    /// `None` if the certificate is not a known server.
    ///
    /// # Errors
    /// `StoreError` if the backing storage could not be read.
    fn lookup(&self, certificate: &Certificate) -> core::result::Result<Option<Alias>, StoreError>;
}

/// An in memory [`KnownServerStore`].
///
/// Certificates are keyed by the hex SHA-256 fingerprint of their DER
/// encoding, so trusting the same certificate twice keeps one entry.
#[derive(Debug, Default)]
pub struct KnownServers {
    certificates: RwLock<BTreeMap<Alias, Certificate>>,
}

impl KnownServers {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store from a bundle of PEM encoded certificates.
    ///
    /// # Errors
    /// `Error::CertificateDecoding` if the bundle is not a sequence of PEM
    /// certificates.
    pub fn from_pem(pem: impl AsRef<[u8]>) -> Result<Self> {
        let store = Self::new();
        for certificate in X509Certificate::load_pem_chain(pem.as_ref())? {
            store.trust(Certificate::try_from(certificate)?);
        }
        Ok(store)
    }

    /// Encode every stored certificate as a PEM bundle, ordered by alias.
    pub fn to_pem(&self) -> Result<String> {
        self.certificates
            .read()
            .values()
            .map(Certificate::to_pem)
            .collect()
    }

    /// Trust `certificate`, returning the alias it is stored under.
    pub fn trust(&self, certificate: Certificate) -> Alias {
        let alias = Alias::from(&certificate);
        tracing::debug!(%alias, subject = %certificate.subject(), "trusting server certificate");
        self.certificates.write().insert(alias.clone(), certificate);
        alias
    }

    /// Stop trusting the certificate stored under `alias`.
    pub fn revoke(&self, alias: &Alias) -> Option<Certificate> {
        let removed = self.certificates.write().remove(alias);
        if removed.is_some() {
            tracing::debug!(%alias, "revoked trust in server certificate");
        }
        removed
    }

    /// The certificate stored under `alias`.
    pub fn get(&self, alias: &Alias) -> Option<Certificate> {
        self.certificates.read().get(alias).cloned()
    }

    /// Whether `certificate` is trusted.
    pub fn contains(&self, certificate: &Certificate) -> bool {
        self.certificates
            .read()
            .get(&Alias::from(certificate))
            .is_some_and(|stored| stored == certificate)
    }

    /// Every alias in the store, in order.
    pub fn aliases(&self) -> Vec<Alias> {
        self.certificates.read().keys().cloned().collect()
    }

    /// The number of trusted certificates.
    pub fn len(&self) -> usize {
        self.certificates.read().len()
    }

    /// Whether no certificates are trusted.
    pub fn is_empty(&self) -> bool {
        self.certificates.read().is_empty()
    }
}

impl KnownServerStore for KnownServers {
    fn lookup(&self, certificate: &Certificate) -> core::result::Result<Option<Alias>, StoreError> {
        let alias = Alias::from(certificate);
        let known = self
            .certificates
            .read()
            .get(&alias)
            .is_some_and(|stored| stored == certificate);
        Ok(known.then_some(alias))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_support::{self, NOW, YEAR};
    use crate::Error;
    use assert_matches::assert_matches;
    use std::sync::Arc;

    #[test]
    fn empty_store_knows_nothing() {
        let store = KnownServers::new();
        let cert = test_support::self_signed("nobody.example.com", NOW, NOW + YEAR);
        assert!(store.is_empty());
        assert_eq!(store.lookup(&cert), Ok(None));
    }

    #[test]
    fn trusted_certificate_is_found_by_alias() {
        let store = KnownServers::new();
        let cert = test_support::self_signed("known.example.com", NOW, NOW + YEAR);
        let alias = store.trust(cert.clone());

        assert_eq!(alias.as_str(), cert.fingerprint().to_string());
        assert_eq!(store.lookup(&cert), Ok(Some(alias.clone())));
        assert_eq!(store.get(&alias), Some(cert.clone()));
        assert!(store.contains(&cert));
    }

    #[test]
    fn trusting_twice_keeps_one_entry() {
        let store = KnownServers::new();
        let cert = test_support::self_signed("twice.example.com", NOW, NOW + YEAR);
        let first = store.trust(cert.clone());
        let second = store.trust(cert);
        assert_eq!(first, second);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn same_subject_different_key_is_unknown() {
        let store = KnownServers::new();
        let trusted = test_support::self_signed("twin.example.com", NOW, NOW + YEAR);
        let impostor = test_support::self_signed("twin.example.com", NOW, NOW + YEAR);
        store.trust(trusted);
        assert_eq!(store.lookup(&impostor), Ok(None));
    }

    #[test]
    fn revoked_certificate_is_unknown() {
        let store = KnownServers::new();
        let cert = test_support::self_signed("revoked.example.com", NOW, NOW + YEAR);
        let alias = store.trust(cert.clone());

        assert_eq!(store.revoke(&alias), Some(cert.clone()));
        assert_eq!(store.lookup(&cert), Ok(None));
        assert_eq!(store.revoke(&alias), None);
    }

    #[test]
    fn pem_bundle_round_trip() {
        let store = KnownServers::new();
        let first = test_support::self_signed("first.example.com", NOW, NOW + YEAR);
        let second = test_support::self_signed("second.example.com", NOW, NOW + YEAR);
        store.trust(first.clone());
        store.trust(second.clone());

        let pem = store.to_pem().expect("Failed encoding store");
        let restored = KnownServers::from_pem(pem).expect("Failed decoding store");

        assert_eq!(restored.aliases(), store.aliases());
        assert!(restored.contains(&first));
        assert!(restored.contains(&second));
    }

    #[test]
    fn pem_bundle_with_garbage_fails() {
        let pem = "-----BEGIN CERTIFICATE-----\nAAAA\n-----END CERTIFICATE-----\n";
        assert_matches!(
            KnownServers::from_pem(pem),
            Err(Error::CertificateDecoding(_))
        );
    }

    #[test]
    fn lookups_interleave_with_writes() {
        let store = Arc::new(KnownServers::new());
        let certs = (0..8)
            .map(|i| test_support::self_signed(&format!("host{i}.example.com"), NOW, NOW + YEAR))
            .collect::<Vec<_>>();

        let writer = {
            let store = store.clone();
            let certs = certs.clone();
            std::thread::spawn(move || {
                for cert in certs {
                    store.trust(cert);
                }
            })
        };
        for cert in &certs {
            assert!(store.lookup(cert).is_ok());
        }
        writer.join().expect("Writer thread panicked");

        for cert in &certs {
            assert_eq!(store.lookup(cert), Ok(Some(Alias::from(cert))));
        }
    }
}
