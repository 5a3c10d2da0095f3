//! HMAC JSON Web Algorithm implementations

use std::{convert::TryFrom, fmt};

use aliri_base64::{Base64Url, Base64UrlRef};
use ring::rand::SecureRandom;

use crate::{error, jwa, jws};

/// HMAC secret
///
/// Any length of secret is accepted, including an empty one.
#[derive(Clone, PartialEq, Eq)]
#[must_use]
pub struct Hmac {
    secret: Base64Url,
}

impl fmt::Debug for Hmac {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Hmac { secret }")
    }
}

impl Hmac {
    /// HMAC using the provided secret
    pub fn new(secret: impl Into<Base64Url>) -> Self {
        let secret = secret.into();
        Self { secret }
    }

    /// Generates a new HMAC secret
    ///
    /// # Errors
    ///
    /// Unable to generate a new HMAC secret.
    pub fn generate(alg: SigningAlgorithm) -> Result<Self, error::Unexpected> {
        Self::generate_with_rng(alg, jwa::rng())
    }

    /// Generates a new HMAC secret using the provided source of randomness
    ///
    /// # Errors
    ///
    /// Unable to generate a new HMAC secret from the provided RNG.
    pub fn generate_with_rng(
        alg: SigningAlgorithm,
        rng: &dyn SecureRandom,
    ) -> Result<Self, error::Unexpected> {
        let bytes = alg.recommended_key_size();
        let mut secret = Base64Url::from_raw(vec![0; bytes]);

        rng.fill(secret.as_mut_slice())
            .map_err(|_| error::unexpected("random number generator failure"))?;

        Ok(Self { secret })
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub(crate) fn secret(&self) -> &Base64UrlRef {
        &self.secret
    }

    fn ring_key(&self, alg: SigningAlgorithm) -> ring::hmac::Key {
        ring::hmac::Key::new(alg.into_ring_algorithm(), self.secret.as_slice())
    }
}

/// HMAC signing algorithms
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)]
pub enum SigningAlgorithm {
    /// HMAC using SHA-256
    HS256,
    /// HMAC using SHA-384
    HS384,
    /// HMAC using SHA-512
    HS512,
}

impl SigningAlgorithm {
    /// Recommended key size in bytes for an HMAC secret
    #[must_use]
    fn recommended_key_size(self) -> usize {
        self.signature_size()
    }

    /// The size in bytes of an HMAC signature
    #[must_use]
    pub fn signature_size(self) -> usize {
        match self {
            Self::HS256 => 256 / 8,
            Self::HS384 => 384 / 8,
            Self::HS512 => 512 / 8,
        }
    }

    fn into_ring_algorithm(self) -> ring::hmac::Algorithm {
        match self {
            SigningAlgorithm::HS256 => ring::hmac::HMAC_SHA256,
            SigningAlgorithm::HS384 => ring::hmac::HMAC_SHA384,
            SigningAlgorithm::HS512 => ring::hmac::HMAC_SHA512,
        }
    }
}

impl From<SigningAlgorithm> for jwa::Algorithm {
    fn from(alg: SigningAlgorithm) -> Self {
        match alg {
            SigningAlgorithm::HS256 => Self::HS256,
            SigningAlgorithm::HS384 => Self::HS384,
            SigningAlgorithm::HS512 => Self::HS512,
        }
    }
}

impl TryFrom<jwa::Algorithm> for SigningAlgorithm {
    type Error = error::KeyMismatch;

    fn try_from(alg: jwa::Algorithm) -> Result<Self, Self::Error> {
        match alg {
            jwa::Algorithm::HS256 => Ok(Self::HS256),
            jwa::Algorithm::HS384 => Ok(Self::HS384),
            jwa::Algorithm::HS512 => Ok(Self::HS512),
            _ => Err(error::key_mismatch(alg)),
        }
    }
}

impl jws::Signer for Hmac {
    type Algorithm = SigningAlgorithm;
    type Error = std::convert::Infallible;

    fn can_sign(&self, _alg: Self::Algorithm) -> bool {
        true
    }

    fn sign(&self, alg: Self::Algorithm, data: &[u8]) -> Result<Vec<u8>, Self::Error> {
        let digest = ring::hmac::sign(&self.ring_key(alg), data);
        Ok(digest.as_ref().to_owned())
    }
}

/// Verification recomputes the tag and compares it in constant time.
impl jws::Verifier for Hmac {
    type Algorithm = SigningAlgorithm;
    type Error = error::SignatureInvalid;

    fn can_verify(&self, _alg: Self::Algorithm) -> bool {
        true
    }

    fn verify(
        &self,
        alg: Self::Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), Self::Error> {
        ring::hmac::verify(&self.ring_key(alg), data, signature)
            .map_err(|_| error::signature_invalid())
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&jwa::Algorithm::from(*self), f)
    }
}
