use std::{convert::TryFrom, fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error;

/// A signing algorithm
///
/// Names are matched exactly and case-sensitively; alternate spellings are
/// refused rather than normalized.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[allow(clippy::upper_case_acronyms)]
pub enum Algorithm {
    /// No signature; only honored when explicitly allowed
    NONE,
    /// HMAC using SHA-256
    HS256,
    /// HMAC using SHA-384
    HS384,
    /// HMAC using SHA-512
    HS512,
    /// RSASSA-PKCS1-v1_5 using SHA-256
    RS256,
    /// RSASSA-PKCS1-v1_5 using SHA-384
    RS384,
    /// RSASSA-PKCS1-v1_5 using SHA-512
    RS512,
    /// ECDSA using P-256 and SHA-256
    ES256,
    /// ECDSA using P-384 and SHA-384
    ES384,
    /// ECDSA using P-521 and SHA-512
    ES512,
}

/// The cryptographic primitive behind an [`Algorithm`]
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub enum Family {
    /// Unsecured; no signature
    None,
    /// Keyed hash with a shared secret
    Hmac,
    /// RSA PKCS#1 v1.5 signatures
    Rsa,
    /// Elliptic curve signatures
    Ecdsa,
}

impl Algorithm {
    /// Every supported algorithm
    pub const ALL: [Algorithm; 10] = [
        Self::NONE,
        Self::HS256,
        Self::HS384,
        Self::HS512,
        Self::RS256,
        Self::RS384,
        Self::RS512,
        Self::ES256,
        Self::ES384,
        Self::ES512,
    ];

    /// The family this algorithm belongs to
    #[must_use]
    pub const fn family(self) -> Family {
        match self {
            Self::NONE => Family::None,
            Self::HS256 | Self::HS384 | Self::HS512 => Family::Hmac,
            Self::RS256 | Self::RS384 | Self::RS512 => Family::Rsa,
            Self::ES256 | Self::ES384 | Self::ES512 => Family::Ecdsa,
        }
    }

    /// Width of the SHA-2 digest used by this algorithm, in bits
    ///
    /// `NONE` computes no digest and reports the narrowest width.
    #[must_use]
    pub const fn digest_bits(self) -> u16 {
        match self {
            Self::NONE | Self::HS256 | Self::RS256 | Self::ES256 => 256,
            Self::HS384 | Self::RS384 | Self::ES384 => 384,
            Self::HS512 | Self::RS512 | Self::ES512 => 512,
        }
    }

    /// The registered name of the algorithm
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::NONE => "NONE",
            Self::HS256 => "HS256",
            Self::HS384 => "HS384",
            Self::HS512 => "HS512",
            Self::RS256 => "RS256",
            Self::RS384 => "RS384",
            Self::RS512 => "RS512",
            Self::ES256 => "ES256",
            Self::ES384 => "ES384",
            Self::ES512 => "ES512",
        }
    }

    /// Size in bytes of a signature, where it does not depend on the key
    #[must_use]
    pub const fn fixed_signature_size(self) -> Option<usize> {
        match self {
            Self::NONE => Some(0),
            Self::HS256 => Some(32),
            Self::HS384 => Some(48),
            Self::HS512 => Some(64),
            Self::RS256 | Self::RS384 | Self::RS512 => None,
            Self::ES256 => Some(64),
            Self::ES384 => Some(96),
            Self::ES512 => Some(132),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Hmac => "hmac",
            Self::Rsa => "rsa",
            Self::Ecdsa => "ecdsa",
        };

        f.write_str(s)
    }
}

impl TryFrom<&'_ str> for Algorithm {
    type Error = error::UnknownAlgorithm;

    #[inline]
    fn try_from(value: &'_ str) -> Result<Self, Self::Error> {
        Self::ALL
            .iter()
            .copied()
            .find(|alg| alg.name() == value)
            .ok_or_else(|| error::unknown_algorithm(value))
    }
}

impl TryFrom<String> for Algorithm {
    type Error = error::UnknownAlgorithm;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = error::UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s)
    }
}

impl Serialize for Algorithm {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Algorithm {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        Self::try_from(name.as_ref()).map_err(serde::de::Error::custom)
    }
}
