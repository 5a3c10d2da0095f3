//! The unsecured (`NONE`) algorithm
//!
//! An unsecured token carries an empty signature. The backend here only
//! checks that shape; whether such a token is acceptable at all is decided
//! by the caller through [`CoreValidator::allow_unsecured()`][crate::jwt::CoreValidator::allow_unsecured].

use crate::{error, jwa, jws};

/// The key for unsecured tokens
///
/// Holds nothing. Using it for any algorithm other than
/// [`NONE`][jwa::Algorithm::NONE] is a key mismatch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[must_use]
pub struct Unsecured;

impl jws::Signer for Unsecured {
    type Algorithm = jwa::Algorithm;
    type Error = error::SigningError;

    fn can_sign(&self, alg: Self::Algorithm) -> bool {
        alg == jwa::Algorithm::NONE
    }

    fn sign(&self, alg: Self::Algorithm, _data: &[u8]) -> Result<Vec<u8>, Self::Error> {
        if !self.can_sign(alg) {
            return Err(error::key_mismatch(alg).into());
        }

        Ok(Vec::new())
    }
}

impl jws::Verifier for Unsecured {
    type Algorithm = jwa::Algorithm;
    type Error = error::VerifyError;

    fn can_verify(&self, alg: Self::Algorithm) -> bool {
        alg == jwa::Algorithm::NONE
    }

    fn verify(
        &self,
        alg: Self::Algorithm,
        _data: &[u8],
        signature: &[u8],
    ) -> Result<(), Self::Error> {
        if !self.can_verify(alg) {
            return Err(error::key_mismatch(alg).into());
        }

        if signature.is_empty() {
            Ok(())
        } else {
            Err(error::signature_invalid().into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jws::{Signer, Verifier};

    #[test]
    fn signs_with_empty_signature() {
        let sig = Unsecured.sign(jwa::Algorithm::NONE, b"message").unwrap();
        assert!(sig.is_empty());
    }

    #[test]
    fn refuses_other_algorithms() {
        let err = Unsecured.sign(jwa::Algorithm::HS256, b"message").unwrap_err();
        assert!(matches!(err, error::SigningError::KeyMismatch(_)));

        let err = Unsecured
            .verify(jwa::Algorithm::HS256, b"message", b"")
            .unwrap_err();
        assert!(err.is_key_mismatch());
    }

    #[test]
    fn only_empty_signatures_verify() {
        assert!(Unsecured.verify(jwa::Algorithm::NONE, b"m", b"").is_ok());
        let err = Unsecured.verify(jwa::Algorithm::NONE, b"m", b"x").unwrap_err();
        assert!(err.is_signature_invalid());
    }
}
