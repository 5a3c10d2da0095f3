use std::{fmt, sync::Arc};

use aliri_base64::Base64;
use p521::ecdsa::signature::Signer as _;
use ring::{
    rand::SecureRandom,
    signature::{EcdsaKeyPair, KeyPair},
};

use super::{Curve, PublicKey, SigningAlgorithm};
use crate::{error, jwa, jws};

const PKCS8_LABEL: &str = "PRIVATE KEY";
const P521_SCALAR_SIZE: usize = 66;

/// ECC private key
#[derive(Clone)]
#[must_use]
pub struct PrivateKey {
    public_key: PublicKey,
    inner: Inner,
}

#[derive(Clone)]
enum Inner {
    Ring {
        pkcs8: Base64,
        key_pair: Arc<EcdsaKeyPair>,
    },
    P521 {
        scalar: Vec<u8>,
        key: Arc<p521::ecdsa::SigningKey>,
    },
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        match (&self.inner, &other.inner) {
            (Inner::Ring { pkcs8: a, .. }, Inner::Ring { pkcs8: b, .. }) => a == b,
            (Inner::P521 { scalar: a, .. }, Inner::P521 { scalar: b, .. }) => a == b,
            _ => false,
        }
    }
}

impl Eq for PrivateKey {}

fn ring_signing_algorithm(curve: Curve) -> Option<&'static ring::signature::EcdsaSigningAlgorithm> {
    match curve {
        Curve::P256 => Some(&ring::signature::ECDSA_P256_SHA256_FIXED_SIGNING),
        Curve::P384 => Some(&ring::signature::ECDSA_P384_SHA384_FIXED_SIGNING),
        Curve::P521 => None,
    }
}

impl PrivateKey {
    /// Generates a new ECC key pair using the specified curve
    ///
    /// # Errors
    ///
    /// Unable to generate a private key.
    pub fn generate(curve: Curve) -> Result<Self, error::Unexpected> {
        let rng = jwa::rng();

        if let Some(alg) = ring_signing_algorithm(curve) {
            let pkcs8 = EcdsaKeyPair::generate_pkcs8(alg, rng)
                .map_err(|e| error::unexpected(e.to_string()))?;
            return Self::from_ring_pkcs8(curve, alg, pkcs8.as_ref()).map_err(error::unexpected);
        }

        // Rejection sampling over 521-bit candidates
        let mut scalar = [0u8; P521_SCALAR_SIZE];
        loop {
            rng.fill(&mut scalar)
                .map_err(|e| error::unexpected(e.to_string()))?;
            scalar[0] &= 0x01;

            if let Ok(key) = Self::from_p521_scalar(&scalar) {
                return Ok(key);
            }
        }
    }

    /// Constructs a P-256 or P-384 key pair from a PKCS#8 PEM file
    ///
    /// # Errors
    ///
    /// The provided PEM file is not a valid P-256 or P-384 private key.
    pub fn from_pem(pem: &str) -> Result<Self, error::KeyRejected> {
        let der = jwa::pem_to_der(pem, PKCS8_LABEL)?;
        Self::from_pkcs8_der(&der)
    }

    /// Constructs a P-256 or P-384 key pair from a PKCS#8 document
    ///
    /// # Errors
    ///
    /// The document is not a valid P-256 or P-384 private key.
    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self, error::KeyRejected> {
        for curve in [Curve::P256, Curve::P384] {
            if let Some(alg) = ring_signing_algorithm(curve) {
                if let Ok(key) = Self::from_ring_pkcs8(curve, alg, der) {
                    return Ok(key);
                }
            }
        }

        Err(error::key_rejected(
            "not a P-256 or P-384 PKCS#8 private key",
        ))
    }

    fn from_ring_pkcs8(
        curve: Curve,
        alg: &'static ring::signature::EcdsaSigningAlgorithm,
        der: &[u8],
    ) -> Result<Self, error::KeyRejected> {
        let key_pair = EcdsaKeyPair::from_pkcs8(alg, der, jwa::rng())
            .map_err(|e| error::key_rejected(e.to_string()))?;
        let public_key = PublicKey::from_sec1(curve, key_pair.public_key().as_ref())?;

        Ok(Self {
            public_key,
            inner: Inner::Ring {
                pkcs8: Base64::from_raw(der),
                key_pair: Arc::new(key_pair),
            },
        })
    }

    /// Constructs a P-521 key pair from its big-endian private scalar
    ///
    /// Scalars shorter than the field size are left-padded.
    ///
    /// # Errors
    ///
    /// The scalar is zero or not less than the curve order.
    pub fn from_p521_scalar(scalar: &[u8]) -> Result<Self, error::KeyRejected> {
        if scalar.len() > P521_SCALAR_SIZE {
            return Err(error::key_rejected("P-521 scalar too wide"));
        }

        let mut padded = vec![0; P521_SCALAR_SIZE - scalar.len()];
        padded.extend_from_slice(scalar);

        let key = p521::ecdsa::SigningKey::from_slice(&padded)
            .map_err(|e| error::key_rejected(e.to_string()))?;
        let verifying_key = p521::ecdsa::VerifyingKey::from(&key);
        let public_key =
            PublicKey::from_sec1(Curve::P521, verifying_key.to_encoded_point(false).as_bytes())?;

        Ok(Self {
            public_key,
            inner: Inner::P521 {
                scalar: padded,
                key: Arc::new(key),
            },
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

impl jws::Signer for PrivateKey {
    type Algorithm = SigningAlgorithm;
    type Error = error::SigningError;

    fn can_sign(&self, alg: Self::Algorithm) -> bool {
        self.public_key.curve() == Curve::from(alg)
    }

    fn sign(&self, alg: Self::Algorithm, data: &[u8]) -> Result<Vec<u8>, Self::Error> {
        if !self.can_sign(alg) {
            return Err(error::key_mismatch(alg).into());
        }

        match &self.inner {
            Inner::Ring { key_pair, .. } => {
                let signature = key_pair
                    .sign(jwa::rng(), data)
                    .map_err(|e| error::unexpected(e.to_string()))?;
                Ok(signature.as_ref().to_owned())
            }
            Inner::P521 { key, .. } => {
                let signature: p521::ecdsa::Signature = key
                    .try_sign(data)
                    .map_err(|e| error::unexpected(e.to_string()))?;
                Ok(signature.to_bytes().to_vec())
            }
        }
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::ec::*;

    #[test]
    fn pem_and_der_agree() {
        let der = jwa::pem_to_der(P256_PKCS8, PKCS8_LABEL).unwrap();
        let a = PrivateKey::from_pkcs8_der(&der).unwrap();
        let b = PrivateKey::from_pem(P256_PKCS8).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn debug_redacts_private_material() {
        let key = PrivateKey::from_pem(P384_PKCS8).unwrap();
        assert!(format!("{:?}", key).contains("<redacted>"));
    }

    #[test]
    fn p521_keys_compare_by_scalar() {
        let a = PrivateKey::generate(Curve::P521).unwrap();
        let b = PrivateKey::generate(Curve::P521).unwrap();
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }
}
