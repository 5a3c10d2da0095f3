//! ECC JSON Web Algorithm implementations
//!
//! Signatures are the fixed-width `R || S` encoding, with each half
//! left-padded to the curve's coordinate size.

use std::{convert::TryFrom, fmt};

use crate::{error, jwa, jws};

mod private;
mod public;

pub use private::PrivateKey;
pub use public::PublicKey;

/// A named ECC curve
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Curve {
    /// The P-256 curve (prime256v1/secp256r1)
    P256,

    /// The P-384 curve (secp384r1)
    P384,

    /// The P-521 curve (secp521r1)
    P521,
}

impl Curve {
    /// Size in bytes of a field element on this curve
    #[must_use]
    pub const fn coordinate_size(self) -> usize {
        match self {
            Self::P256 => 32,
            Self::P384 => 48,
            Self::P521 => 66,
        }
    }

    /// The curve's registered name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::P256 => "P-256",
            Self::P384 => "P-384",
            Self::P521 => "P-521",
        }
    }
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Elliptic curve cryptography key
#[derive(Debug, Clone, Eq, PartialEq)]
#[must_use]
pub struct EllipticCurve {
    key: MaybePrivate,
}

#[derive(Debug, Clone, Eq, PartialEq)]
enum MaybePrivate {
    PublicAndPrivate(PrivateKey),
    PublicOnly(PublicKey),
}

impl EllipticCurve {
    /// Generates a newly minted key pair using the specified curve
    ///
    /// # Errors
    ///
    /// Unable to generate a private key.
    pub fn generate(curve: Curve) -> Result<Self, error::Unexpected> {
        let private_key = PrivateKey::generate(curve)?;

        Ok(Self::from(private_key))
    }

    /// Constructs a P-256 or P-384 key pair from a PKCS#8 PEM file
    ///
    /// # Errors
    ///
    /// The provided PEM file is not a valid P-256 or P-384 private key.
    pub fn private_key_from_pem(pem: &str) -> Result<Self, error::KeyRejected> {
        let private_key = PrivateKey::from_pem(pem)?;

        Ok(Self::from(private_key))
    }

    /// Constructs a P-521 key pair from its big-endian private scalar
    ///
    /// # Errors
    ///
    /// The scalar is zero or not less than the curve order.
    pub fn from_p521_scalar(scalar: &[u8]) -> Result<Self, error::KeyRejected> {
        let private_key = PrivateKey::from_p521_scalar(scalar)?;

        Ok(Self::from(private_key))
    }

    /// Constructs a public key from a SEC1 encoded point
    ///
    /// # Errors
    ///
    /// The encoding does not describe a point on the curve.
    pub fn from_public_sec1(curve: Curve, point: &[u8]) -> Result<Self, error::KeyRejected> {
        let public_key = PublicKey::from_sec1(curve, point)?;

        Ok(Self::from(public_key))
    }

    /// Constructs a public key from its affine coordinates
    ///
    /// # Errors
    ///
    /// A coordinate is too wide for the curve, or the point is not on the
    /// curve.
    pub fn from_public_coordinates(
        curve: Curve,
        x: &[u8],
        y: &[u8],
    ) -> Result<Self, error::KeyRejected> {
        let public_key = PublicKey::from_coordinates(curve, x, y)?;

        Ok(Self::from(public_key))
    }

    /// The curve this key belongs to
    #[must_use]
    pub fn curve(&self) -> Curve {
        self.public_key().curve()
    }

    /// The private key, if present
    #[must_use]
    pub fn private_key(&self) -> Option<&PrivateKey> {
        match &self.key {
            MaybePrivate::PublicAndPrivate(p) => Some(p),
            MaybePrivate::PublicOnly(_) => None,
        }
    }

    /// The public key
    #[must_use]
    pub fn public_key(&self) -> &PublicKey {
        match &self.key {
            MaybePrivate::PublicAndPrivate(p) => p.public_key(),
            MaybePrivate::PublicOnly(p) => p,
        }
    }

    /// Removes the private key components
    pub fn public_only(self) -> Self {
        match self.key {
            MaybePrivate::PublicAndPrivate(p) => Self::from(p.into_public_key()),
            MaybePrivate::PublicOnly(_) => self,
        }
    }
}

/// Elliptic curve cryptography signing algorithms
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)]
pub enum SigningAlgorithm {
    /// Elliptic curve cryptography using the P-256 curve and SHA-256
    ES256,
    /// Elliptic curve cryptography using the P-384 curve and SHA-384
    ES384,
    /// Elliptic curve cryptography using the P-521 curve and SHA-512
    ES512,
}

impl SigningAlgorithm {
    /// Size in bytes of an ECDSA signature
    #[must_use]
    pub fn signature_size(self) -> usize {
        Curve::from(self).coordinate_size() * 2
    }
}

impl From<SigningAlgorithm> for jwa::Algorithm {
    fn from(alg: SigningAlgorithm) -> Self {
        match alg {
            SigningAlgorithm::ES256 => Self::ES256,
            SigningAlgorithm::ES384 => Self::ES384,
            SigningAlgorithm::ES512 => Self::ES512,
        }
    }
}

impl TryFrom<jwa::Algorithm> for SigningAlgorithm {
    type Error = error::KeyMismatch;

    fn try_from(alg: jwa::Algorithm) -> Result<Self, Self::Error> {
        match alg {
            jwa::Algorithm::ES256 => Ok(Self::ES256),
            jwa::Algorithm::ES384 => Ok(Self::ES384),
            jwa::Algorithm::ES512 => Ok(Self::ES512),
            _ => Err(error::key_mismatch(alg)),
        }
    }
}

impl From<SigningAlgorithm> for Curve {
    fn from(alg: SigningAlgorithm) -> Self {
        match alg {
            SigningAlgorithm::ES256 => Self::P256,
            SigningAlgorithm::ES384 => Self::P384,
            SigningAlgorithm::ES512 => Self::P521,
        }
    }
}

impl From<Curve> for SigningAlgorithm {
    fn from(crv: Curve) -> Self {
        match crv {
            Curve::P256 => Self::ES256,
            Curve::P384 => Self::ES384,
            Curve::P521 => Self::ES512,
        }
    }
}

impl jws::Verifier for EllipticCurve {
    type Algorithm = SigningAlgorithm;
    type Error = error::VerifyError;

    fn can_verify(&self, alg: Self::Algorithm) -> bool {
        jws::Verifier::can_verify(self.public_key(), alg)
    }

    fn verify(
        &self,
        alg: Self::Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), Self::Error> {
        jws::Verifier::verify(self.public_key(), alg, data, signature)
    }
}

impl jws::Signer for EllipticCurve {
    type Algorithm = SigningAlgorithm;
    type Error = error::SigningError;

    fn can_sign(&self, alg: Self::Algorithm) -> bool {
        if let Some(p) = self.private_key() {
            jws::Signer::can_sign(p, alg)
        } else {
            false
        }
    }

    fn sign(&self, alg: Self::Algorithm, data: &[u8]) -> Result<Vec<u8>, Self::Error> {
        if let Some(p) = self.private_key() {
            jws::Signer::sign(p, alg, data)
        } else {
            Err(error::key_mismatch(alg).into())
        }
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&jwa::Algorithm::from(*self), f)
    }
}

impl From<PublicKey> for EllipticCurve {
    fn from(key: PublicKey) -> Self {
        Self {
            key: MaybePrivate::PublicOnly(key),
        }
    }
}

impl From<PrivateKey> for EllipticCurve {
    fn from(key: PrivateKey) -> Self {
        Self {
            key: MaybePrivate::PublicAndPrivate(key),
        }
    }
}
