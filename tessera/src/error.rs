//! Common errors
//!
//! Each distinct failure is its own small type so that it can be matched
//! on directly. The per-operation enums ([`JwtSigningError`],
//! [`JwtVerifyError`], and friends) compose them.

#![allow(missing_copy_implementations)]

use std::error::Error as StdError;

use thiserror::Error;

use crate::jwa;

/// The provided name could not be matched with a supported algorithm
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{alg}' does not match supported algorithms")]
pub struct UnknownAlgorithm {
    alg: String,
}

impl UnknownAlgorithm {
    /// The name that failed to match
    #[must_use]
    pub fn name(&self) -> &str {
        &self.alg
    }
}

#[inline]
pub(crate) fn unknown_algorithm(alg: impl Into<String>) -> UnknownAlgorithm {
    UnknownAlgorithm { alg: alg.into() }
}

/// The key cannot be used with the requested algorithm
///
/// Either the key belongs to a different algorithm family, is sized for a
/// different digest width, or lacks the private half needed for signing.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("key incompatible with algorithm '{alg}'")]
pub struct KeyMismatch {
    alg: jwa::Algorithm,
}

impl KeyMismatch {
    /// The algorithm the key was asked to serve
    #[must_use]
    pub fn algorithm(&self) -> jwa::Algorithm {
        self.alg
    }
}

#[inline]
pub(crate) fn key_mismatch(alg: impl Into<jwa::Algorithm>) -> KeyMismatch {
    KeyMismatch { alg: alg.into() }
}

/// The key material was rejected
#[derive(Debug, Error)]
#[error("key rejected")]
pub struct KeyRejected {
    #[from]
    source: Box<dyn StdError + Send + Sync + 'static>,
}

pub(crate) fn key_rejected(
    source: impl Into<Box<dyn StdError + Send + Sync + 'static>>,
) -> KeyRejected {
    KeyRejected {
        source: source.into(),
    }
}

/// The token does not consist of exactly three segments, or a segment is
/// not valid unpadded base64url
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("malformed JWT: {reason}")]
pub struct MalformedToken {
    reason: &'static str,
}

pub(crate) const fn malformed_token(reason: &'static str) -> MalformedToken {
    MalformedToken { reason }
}

/// A token segment exceeds the configured size bound
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("JWT {segment} segment too large ({len} bytes, maximum {max})")]
pub struct TokenTooLarge {
    segment: &'static str,
    len: usize,
    max: usize,
}

pub(crate) const fn token_too_large(segment: &'static str, len: usize, max: usize) -> TokenTooLarge {
    TokenTooLarge { segment, len, max }
}

/// The JWT header section is malformed
#[derive(Debug, Error)]
#[error("malformed JWT header")]
pub struct MalformedHeader {
    #[from]
    source: Box<dyn StdError + Send + Sync + 'static>,
}

pub(crate) fn malformed_header(
    source: impl Into<Box<dyn StdError + Send + Sync + 'static>>,
) -> MalformedHeader {
    MalformedHeader {
        source: source.into(),
    }
}

/// The JWT payload section is malformed
#[derive(Debug, Error)]
#[error("malformed JWT payload")]
pub struct MalformedPayload {
    #[from]
    source: Box<dyn StdError + Send + Sync + 'static>,
}

pub(crate) fn malformed_payload(
    source: impl Into<Box<dyn StdError + Send + Sync + 'static>>,
) -> MalformedPayload {
    MalformedPayload {
        source: source.into(),
    }
}

/// The signature did not match
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("signature invalid")]
pub struct SignatureInvalid {
    _p: (),
}

pub(crate) const fn signature_invalid() -> SignatureInvalid {
    SignatureInvalid { _p: () }
}

/// The token's algorithm is not one the caller expects
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("algorithm '{alg}' not accepted")]
pub struct AlgorithmRejected {
    alg: jwa::Algorithm,
}

impl AlgorithmRejected {
    /// The algorithm named by the token
    #[must_use]
    pub fn algorithm(&self) -> jwa::Algorithm {
        self.alg
    }
}

pub(crate) const fn algorithm_rejected(alg: jwa::Algorithm) -> AlgorithmRejected {
    AlgorithmRejected { alg }
}

/// A claim with the same case-insensitive name already exists
#[derive(Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("claim '{name}' already present")]
pub struct DuplicateClaim {
    name: String,
}

impl DuplicateClaim {
    /// The rejected claim name, as supplied
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

pub(crate) fn duplicate_claim(name: impl Into<String>) -> DuplicateClaim {
    DuplicateClaim { name: name.into() }
}

/// Unexpected error (possibly a bug)
#[derive(Debug, Error)]
#[error("unexpected error")]
pub struct Unexpected {
    #[from]
    source: Box<dyn StdError + Send + Sync + 'static>,
}

pub(crate) fn unexpected(
    source: impl Into<Box<dyn StdError + Send + Sync + 'static>>,
) -> Unexpected {
    Unexpected {
        source: source.into(),
    }
}

/// An error occurring while creating a signature
#[derive(Debug, Error)]
pub enum SigningError {
    /// The key cannot be used with this algorithm
    #[error(transparent)]
    KeyMismatch(#[from] KeyMismatch),

    /// An unexpected error
    #[error(transparent)]
    Unexpected(#[from] Unexpected),
}

impl From<std::convert::Infallible> for SigningError {
    fn from(_: std::convert::Infallible) -> Self {
        unreachable!("infallible result")
    }
}

/// An error occurring while checking a signature with a key
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The key cannot be used with this algorithm
    #[error(transparent)]
    KeyMismatch(#[from] KeyMismatch),

    /// Signature is invalid
    #[error(transparent)]
    SignatureInvalid(#[from] SignatureInvalid),
}

impl VerifyError {
    /// Whether the error is due to a key that does not fit the algorithm
    #[must_use]
    pub fn is_key_mismatch(&self) -> bool {
        matches!(self, Self::KeyMismatch(_))
    }

    /// Whether the error is due to a signature mismatch
    #[must_use]
    pub fn is_signature_invalid(&self) -> bool {
        matches!(self, Self::SignatureInvalid(_))
    }
}

/// An error occurring while encoding and signing a JWT
#[derive(Debug, Error)]
pub enum JwtSigningError {
    /// The key refused to produce a signature
    #[error(transparent)]
    Signing(#[from] SigningError),

    /// The JWT header could not be serialized
    #[error(transparent)]
    MalformedHeader(#[from] MalformedHeader),

    /// The JWT payload could not be serialized
    #[error(transparent)]
    MalformedPayload(#[from] MalformedPayload),
}

impl From<KeyMismatch> for JwtSigningError {
    fn from(err: KeyMismatch) -> Self {
        Self::Signing(err.into())
    }
}

impl JwtSigningError {
    /// Whether the error is due to a key that does not fit the algorithm
    #[must_use]
    pub fn is_key_mismatch(&self) -> bool {
        matches!(self, Self::Signing(SigningError::KeyMismatch(_)))
    }
}

/// An error occurring while decoding and verifying a JWT
#[derive(Debug, Error)]
pub enum JwtVerifyError {
    /// The JWT is malformed, without a discernible header, payload, and signature
    #[error(transparent)]
    MalformedToken(#[from] MalformedToken),

    /// A JWT segment exceeded the size bound
    #[error(transparent)]
    TokenTooLarge(#[from] TokenTooLarge),

    /// The JWT header is malformed
    #[error(transparent)]
    MalformedHeader(#[from] MalformedHeader),

    /// The JWT header names an algorithm that is not recognized
    #[error(transparent)]
    UnknownAlgorithm(#[from] UnknownAlgorithm),

    /// The JWT header names an algorithm the caller does not accept
    #[error(transparent)]
    AlgorithmRejected(#[from] AlgorithmRejected),

    /// The verification key cannot be used with the token's algorithm
    #[error(transparent)]
    KeyMismatch(#[from] KeyMismatch),

    /// The signature does not match the header and payload
    #[error(transparent)]
    SignatureInvalid(#[from] SignatureInvalid),

    /// The JWT payload is malformed
    #[error(transparent)]
    MalformedPayload(#[from] MalformedPayload),

    /// The JWT was rejected by the claims validator
    #[error("token rejected by claims validator")]
    ClaimsRejected(#[from] ClaimsRejected),
}

impl From<VerifyError> for JwtVerifyError {
    fn from(err: VerifyError) -> Self {
        match err {
            VerifyError::KeyMismatch(e) => Self::KeyMismatch(e),
            VerifyError::SignatureInvalid(e) => Self::SignatureInvalid(e),
        }
    }
}

impl JwtVerifyError {
    /// Whether the token could not be split into its segments
    #[must_use]
    pub fn is_malformed_token(&self) -> bool {
        matches!(self, Self::MalformedToken(_))
    }

    /// Whether a segment exceeded the size bound
    #[must_use]
    pub fn is_too_large(&self) -> bool {
        matches!(self, Self::TokenTooLarge(_))
    }

    /// Whether the header could not be decoded
    #[must_use]
    pub fn is_malformed_header(&self) -> bool {
        matches!(self, Self::MalformedHeader(_))
    }

    /// Whether the header named an unrecognized algorithm
    #[must_use]
    pub fn is_unknown_algorithm(&self) -> bool {
        matches!(self, Self::UnknownAlgorithm(_))
    }

    /// Whether the header named an algorithm outside the expected set
    #[must_use]
    pub fn is_algorithm_rejected(&self) -> bool {
        matches!(self, Self::AlgorithmRejected(_))
    }

    /// Whether the key did not fit the token's algorithm
    #[must_use]
    pub fn is_key_mismatch(&self) -> bool {
        matches!(self, Self::KeyMismatch(_))
    }

    /// Whether the signature failed to verify
    #[must_use]
    pub fn is_signature_invalid(&self) -> bool {
        matches!(self, Self::SignatureInvalid(_))
    }

    /// Whether the payload could not be decoded
    #[must_use]
    pub fn is_malformed_payload(&self) -> bool {
        matches!(self, Self::MalformedPayload(_))
    }

    /// The claims rejection, if that is why the token was refused
    #[must_use]
    pub fn claims_rejection(&self) -> Option<&ClaimsRejected> {
        match self {
            Self::ClaimsRejected(c) => Some(c),
            _ => None,
        }
    }
}

/// An error occurring when validating the claims of a JWT
#[derive(Debug, Error)]
pub enum ClaimsRejected {
    /// The token is expired according to the `exp` claim
    #[error("token expired")]
    TokenExpired,

    /// The token is not yet valid according to the `nbf` claim
    #[error("token not yet valid")]
    TokenNotYetValid,

    /// A claim is present but does not hold an acceptable value
    #[error("{_0} claim does not match")]
    ClaimMismatch(&'static str),

    /// A required claim is missing
    #[error("required {_0} claim missing")]
    ClaimMissing(&'static str),
}

impl ClaimsRejected {
    /// Whether the token has expired
    #[must_use]
    pub fn is_expired(&self) -> bool {
        matches!(self, Self::TokenExpired)
    }

    /// Whether the token is not yet valid
    #[must_use]
    pub fn is_not_yet_valid(&self) -> bool {
        matches!(self, Self::TokenNotYetValid)
    }
}
