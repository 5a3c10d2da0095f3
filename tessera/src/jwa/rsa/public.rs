use aliri_base64::{Base64Url, Base64UrlRef};

use super::SigningAlgorithm;
use crate::{error, jws};

const MIN_MODULUS_BYTES: usize = 2048 / 8;
const MAX_MODULUS_BYTES: usize = 8192 / 8;

/// RSA public key components
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PublicKey {
    /// The public modulus
    modulus: Base64Url,

    /// The public exponent
    exponent: Base64Url,
}

impl PublicKey {
    /// The public key's modulus, big-endian without leading zeros
    pub fn modulus(&self) -> &Base64UrlRef {
        &self.modulus
    }

    /// The public key's exponent, big-endian without leading zeros
    pub fn exponent(&self) -> &Base64UrlRef {
        &self.exponent
    }

    /// Constructs a public key from the modulus and exponent
    ///
    /// # Errors
    ///
    /// The modulus is not between 2048 and 8192 bits, or the exponent
    /// is zero.
    pub fn from_components(
        modulus: impl Into<Base64Url>,
        exponent: impl Into<Base64Url>,
    ) -> Result<Self, error::KeyRejected> {
        let modulus = strip_leading_zeros(modulus.into());
        let exponent = strip_leading_zeros(exponent.into());

        let len = modulus.as_slice().len();
        if !(MIN_MODULUS_BYTES..=MAX_MODULUS_BYTES).contains(&len) {
            return Err(error::key_rejected(
                "key modulus must be between 2048 and 8192 bits",
            ));
        }

        if exponent.as_slice().is_empty() {
            return Err(error::key_rejected("key exponent must not be zero"));
        }

        Ok(Self { modulus, exponent })
    }
}

fn strip_leading_zeros(value: Base64Url) -> Base64Url {
    let bytes = value.as_slice();
    match bytes.iter().position(|&b| b != 0) {
        Some(0) => value,
        Some(idx) => Base64Url::from_raw(&bytes[idx..]),
        None => Base64Url::new(),
    }
}

impl jws::Verifier for PublicKey {
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
        let pk = ring::signature::RsaPublicKeyComponents {
            n: self.modulus.as_slice(),
            e: self.exponent.as_slice(),
        };

        pk.verify(alg.into_verification_params(), data, signature)
            .map_err(|_| error::signature_invalid())
    }
}
