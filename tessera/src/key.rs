//! Keys of any supported algorithm family
//!
//! A [`Key`] dispatches on the [`Family`][jwa::Family] of the requested
//! algorithm. Asking a key to serve an algorithm from another family is a
//! [`KeyMismatch`][error::KeyMismatch] and never touches the signature.

use std::convert::TryInto;

use crate::{
    error, jwa,
    jws::{Signer, Verifier},
};

/// A signing or verification key
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Key {
    /// The empty key used for unsecured tokens
    Unsecured(jwa::Unsecured),

    /// HMAC symmetric
    Hmac(jwa::Hmac),

    /// RSA
    Rsa(jwa::Rsa),

    /// Elliptic curve cryptography
    EllipticCurve(jwa::EllipticCurve),
}

impl Key {
    /// The algorithm family this key serves
    #[must_use]
    pub fn family(&self) -> jwa::Family {
        match self {
            Self::Unsecured(_) => jwa::Family::None,
            Self::Hmac(_) => jwa::Family::Hmac,
            Self::Rsa(_) => jwa::Family::Rsa,
            Self::EllipticCurve(_) => jwa::Family::Ecdsa,
        }
    }

    /// Removes any private key components
    ///
    /// HMAC secrets are symmetric and are kept.
    pub fn public_only(self) -> Self {
        match self {
            Self::Rsa(k) => Self::Rsa(k.public_only()),
            Self::EllipticCurve(k) => Self::EllipticCurve(k.public_only()),
            Self::Unsecured(_) | Self::Hmac(_) => self,
        }
    }
}

impl From<jwa::Unsecured> for Key {
    fn from(key: jwa::Unsecured) -> Self {
        Self::Unsecured(key)
    }
}

impl From<jwa::Hmac> for Key {
    fn from(key: jwa::Hmac) -> Self {
        Self::Hmac(key)
    }
}

impl From<jwa::Rsa> for Key {
    fn from(key: jwa::Rsa) -> Self {
        Self::Rsa(key)
    }
}

impl From<jwa::rsa::PublicKey> for Key {
    fn from(key: jwa::rsa::PublicKey) -> Self {
        Self::Rsa(key.into())
    }
}

impl From<jwa::rsa::PrivateKey> for Key {
    fn from(key: jwa::rsa::PrivateKey) -> Self {
        Self::Rsa(key.into())
    }
}

impl From<jwa::EllipticCurve> for Key {
    fn from(key: jwa::EllipticCurve) -> Self {
        Self::EllipticCurve(key)
    }
}

impl From<jwa::ec::PublicKey> for Key {
    fn from(key: jwa::ec::PublicKey) -> Self {
        Self::EllipticCurve(key.into())
    }
}

impl From<jwa::ec::PrivateKey> for Key {
    fn from(key: jwa::ec::PrivateKey) -> Self {
        Self::EllipticCurve(key.into())
    }
}

impl Verifier for Key {
    type Algorithm = jwa::Algorithm;
    type Error = error::VerifyError;

    fn can_verify(&self, alg: Self::Algorithm) -> bool {
        match self {
            Self::Unsecured(p) => p.can_verify(alg),
            Self::Hmac(p) => {
                if let Ok(alg) = alg.try_into() {
                    p.can_verify(alg)
                } else {
                    false
                }
            }
            Self::Rsa(p) => {
                if let Ok(alg) = alg.try_into() {
                    p.can_verify(alg)
                } else {
                    false
                }
            }
            Self::EllipticCurve(p) => {
                if let Ok(alg) = alg.try_into() {
                    p.can_verify(alg)
                } else {
                    false
                }
            }
        }
    }

    fn verify(
        &self,
        alg: Self::Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), Self::Error> {
        match self {
            Self::Unsecured(p) => p.verify(alg, data, signature)?,
            Self::Hmac(p) => p.verify(alg.try_into()?, data, signature)?,
            Self::Rsa(p) => p.verify(alg.try_into()?, data, signature)?,
            Self::EllipticCurve(p) => p.verify(alg.try_into()?, data, signature)?,
        }

        Ok(())
    }
}

impl Signer for Key {
    type Algorithm = jwa::Algorithm;
    type Error = error::SigningError;

    fn can_sign(&self, alg: Self::Algorithm) -> bool {
        match self {
            Self::Unsecured(p) => p.can_sign(alg),
            Self::Hmac(p) => {
                if let Ok(alg) = alg.try_into() {
                    p.can_sign(alg)
                } else {
                    false
                }
            }
            Self::Rsa(p) => {
                if let Ok(alg) = alg.try_into() {
                    p.can_sign(alg)
                } else {
                    false
                }
            }
            Self::EllipticCurve(p) => {
                if let Ok(alg) = alg.try_into() {
                    p.can_sign(alg)
                } else {
                    false
                }
            }
        }
    }

    fn sign(&self, alg: Self::Algorithm, data: &[u8]) -> Result<Vec<u8>, Self::Error> {
        let signature = match self {
            Self::Unsecured(p) => p.sign(alg, data)?,
            Self::Hmac(p) => p.sign(alg.try_into()?, data)?,
            Self::Rsa(p) => p.sign(alg.try_into()?, data)?,
            Self::EllipticCurve(p) => p.sign(alg.try_into()?, data)?,
        };

        Ok(signature)
    }
}

#[cfg(test)]
mod tests {
    use color_eyre::Result;

    use super::*;
    use crate::test;

    const MESSAGE: &[u8] = b"header.payload";

    fn keys() -> Result<Vec<(Key, jwa::Algorithm)>> {
        Ok(vec![
            (jwa::Unsecured.into(), jwa::Algorithm::NONE),
            (jwa::Hmac::new(&b"secret-key"[..]).into(), jwa::Algorithm::HS256),
            (
                jwa::Rsa::private_key_from_pem(test::rsa::PRIVATE_PKCS8)?.into(),
                jwa::Algorithm::RS384,
            ),
            (
                jwa::EllipticCurve::private_key_from_pem(test::ec::P256_PKCS8)?.into(),
                jwa::Algorithm::ES256,
            ),
        ])
    }

    #[test]
    fn each_key_serves_only_its_family() -> Result<()> {
        for (key, own) in keys()? {
            assert!(key.can_sign(own));
            let sig = key.sign(own, MESSAGE)?;
            key.verify(own, MESSAGE, &sig)?;

            for alg in jwa::Algorithm::ALL {
                if alg.family() == own.family() {
                    continue;
                }

                assert!(!key.can_sign(alg), "{:?} signed {}", key.family(), alg);
                assert!(!key.can_verify(alg), "{:?} verified {}", key.family(), alg);

                let err = key.sign(alg, MESSAGE).unwrap_err();
                assert!(matches!(err, error::SigningError::KeyMismatch(_)));

                let err = key.verify(alg, MESSAGE, &sig).unwrap_err();
                assert!(err.is_key_mismatch());
            }
        }

        Ok(())
    }

    #[test]
    fn hmac_secret_never_verifies_rsa_signature() -> Result<()> {
        let rsa = jwa::Rsa::private_key_from_pem(test::rsa::PRIVATE_PKCS8)?;
        let secret = rsa.public_key().modulus().as_slice().to_vec();
        let sig = Key::from(rsa).sign(jwa::Algorithm::RS256, MESSAGE)?;

        let hmac = Key::from(jwa::Hmac::new(secret));
        assert!(hmac.verify(jwa::Algorithm::RS256, MESSAGE, &sig).is_err());
        assert!(hmac.verify(jwa::Algorithm::HS256, MESSAGE, &sig).is_err());
        Ok(())
    }

    #[test]
    fn public_only_keeps_verification() -> Result<()> {
        let key = Key::from(jwa::EllipticCurve::generate(jwa::ec::Curve::P384)?);
        let sig = key.sign(jwa::Algorithm::ES384, MESSAGE)?;

        let public = key.public_only();
        assert!(!public.can_sign(jwa::Algorithm::ES384));
        public.verify(jwa::Algorithm::ES384, MESSAGE, &sig)?;
        Ok(())
    }
}
