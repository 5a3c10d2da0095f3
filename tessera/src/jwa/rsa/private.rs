use std::{fmt, sync::Arc};

use ring::signature::{RsaKeyPair, RsaPublicKeyComponents};

use super::{PublicKey, SigningAlgorithm};
use crate::{error, jwa, jws};

const PKCS8_LABEL: &str = "PRIVATE KEY";
const PKCS1_LABEL: &str = "RSA PRIVATE KEY";

/// RSA private key
#[derive(Clone)]
#[must_use]
pub struct PrivateKey {
    public_key: PublicKey,
    der: Vec<u8>,
    ring_cache: Arc<RsaKeyPair>,
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.der == other.der
    }
}

impl Eq for PrivateKey {}

impl PrivateKey {
    /// Imports an RSA key pair from a PEM file
    ///
    /// # Errors
    ///
    /// The provided PEM file is not a valid RSA private key.
    pub fn from_pem(pem: &str) -> Result<Self, error::KeyRejected> {
        match jwa::pem_label(pem) {
            Some(PKCS8_LABEL) => Self::from_pkcs8_der(&jwa::pem_to_der(pem, PKCS8_LABEL)?),
            Some(PKCS1_LABEL) => Self::from_pkcs1_der(&jwa::pem_to_der(pem, PKCS1_LABEL)?),
            _ => Err(error::key_rejected(
                "expected a PRIVATE KEY or RSA PRIVATE KEY PEM block",
            )),
        }
    }

    /// Imports an RSA key pair from a PKCS#8 document
    ///
    /// # Errors
    ///
    /// The document is not a valid RSA private key.
    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self, error::KeyRejected> {
        let key_pair = RsaKeyPair::from_pkcs8(der).map_err(|e| error::key_rejected(e.to_string()))?;
        Self::from_ring_key(der, key_pair)
    }

    /// Imports an RSA key pair from a PKCS#1 `RSAPrivateKey` structure
    ///
    /// # Errors
    ///
    /// The structure is not a valid RSA private key.
    pub fn from_pkcs1_der(der: &[u8]) -> Result<Self, error::KeyRejected> {
        let key_pair = RsaKeyPair::from_der(der).map_err(|e| error::key_rejected(e.to_string()))?;
        Self::from_ring_key(der, key_pair)
    }

    fn from_ring_key(der: &[u8], key_pair: RsaKeyPair) -> Result<Self, error::KeyRejected> {
        let components = RsaPublicKeyComponents::<Vec<u8>>::from(key_pair.public());
        let public_key = PublicKey::from_components(components.n, components.e)?;

        Ok(Self {
            public_key,
            der: der.to_owned(),
            ring_cache: Arc::new(key_pair),
        })
    }

    /// Provides access to the public key parameters
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Extracts the public key
    pub fn into_public_key(self) -> PublicKey {
        self.public_key
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

impl jws::Signer for PrivateKey {
    type Algorithm = SigningAlgorithm;
    type Error = error::Unexpected;

    fn can_sign(&self, _alg: Self::Algorithm) -> bool {
        true
    }

    fn sign(&self, alg: Self::Algorithm, data: &[u8]) -> Result<Vec<u8>, Self::Error> {
        let mut buf = vec![0; self.ring_cache.public().modulus_len()];
        self.ring_cache
            .sign(alg.into_signing_params(), jwa::rng(), data, &mut buf)
            .map_err(|e| error::unexpected(e.to_string()))?;
        Ok(buf)
    }
}
