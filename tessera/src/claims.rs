//! Registered claim names
//!
//! The registered claims of [RFC7519 §4.1][]. Each has a fixed wire name
//! and a fixed role during validation.
//!
//! [RFC7519 §4.1]: https://tools.ietf.org/html/rfc7519#section-4.1

use std::{fmt, str::FromStr};

/// A registered claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[non_exhaustive]
pub enum RegisteredClaim {
    /// Expiration time (`exp`)
    Expiration,
    /// Not before (`nbf`)
    NotBefore,
    /// Issuer (`iss`)
    Issuer,
    /// Audience (`aud`)
    Audience,
    /// Issued at (`iat`)
    IssuedAt,
    /// Subject (`sub`)
    Subject,
    /// JWT ID (`jti`)
    JwtId,
}

impl RegisteredClaim {
    /// All registered claims, in wire-name registration order
    pub const ALL: [RegisteredClaim; 7] = [
        Self::Expiration,
        Self::NotBefore,
        Self::Issuer,
        Self::Audience,
        Self::IssuedAt,
        Self::Subject,
        Self::JwtId,
    ];

    /// The claim's name on the wire
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Expiration => "exp",
            Self::NotBefore => "nbf",
            Self::Issuer => "iss",
            Self::Audience => "aud",
            Self::IssuedAt => "iat",
            Self::Subject => "sub",
            Self::JwtId => "jti",
        }
    }

    /// Looks up a registered claim by its exact wire name
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.name() == name)
    }

    /// Whether the claim carries a NumericDate
    #[must_use]
    pub const fn is_time(self) -> bool {
        matches!(self, Self::Expiration | Self::NotBefore | Self::IssuedAt)
    }
}

impl fmt::Display for RegisteredClaim {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The name is not a registered claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("not a registered claim")]
pub struct NotRegistered {
    _p: (),
}

impl FromStr for RegisteredClaim {
    type Err = NotRegistered;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or(NotRegistered { _p: () })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for claim in RegisteredClaim::ALL {
            assert_eq!(RegisteredClaim::from_name(claim.name()), Some(claim));
        }
    }

    #[test]
    fn lookup_is_exact() {
        assert_eq!(RegisteredClaim::from_name("EXP"), None);
        assert_eq!(RegisteredClaim::from_name("custom"), None);
        assert!("Sub".parse::<RegisteredClaim>().is_err());
        assert_eq!("aud".parse::<RegisteredClaim>().ok(), Some(RegisteredClaim::Audience));
    }

    #[test]
    fn time_claims() {
        let time: Vec<_> = RegisteredClaim::ALL
            .iter()
            .filter(|c| c.is_time())
            .map(|c| c.name())
            .collect();
        assert_eq!(time, ["exp", "nbf", "iat"]);
    }
}
