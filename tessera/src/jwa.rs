//! Implementations of the JSON Web Algorithms (JWA) standard
//!
//! The specifications for these algorithms can be found in [RFC7518][].
//!
//! Every supported algorithm belongs to exactly one [`Family`], and each
//! family has its own backend module here.
//!
//! [RFC7518]: https://tools.ietf.org/html/rfc7518

pub mod ec;
pub mod hmac;
pub mod none;
pub mod rsa;

#[doc(inline)]
pub use ec::EllipticCurve;
#[doc(inline)]
pub use hmac::Hmac;
#[doc(inline)]
pub use none::Unsecured;
#[doc(inline)]
pub use rsa::Rsa;

mod algorithm;

pub use algorithm::{Algorithm, Family};

use aliri_base64::Base64;
use once_cell::sync::Lazy;
use ring::rand::SystemRandom;

use crate::error;

static RNG: Lazy<SystemRandom> = Lazy::new(SystemRandom::new);

pub(crate) fn rng() -> &'static SystemRandom {
    &RNG
}

/// Strips the armor from a PEM block with the given label and decodes the
/// DER body
pub(crate) fn pem_to_der(pem: &str, label: &str) -> Result<Vec<u8>, error::KeyRejected> {
    let begin = format!("-----BEGIN {}-----", label);
    let end = format!("-----END {}-----", label);

    let pem = pem.trim();
    let body = pem
        .strip_prefix(begin.as_str())
        .and_then(|rest| rest.strip_suffix(end.as_str()))
        .ok_or_else(|| error::key_rejected(format!("expected a PEM block labeled {}", label)))?;

    let body: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let der = Base64::from_encoded(body).map_err(error::key_rejected)?;

    Ok(der.into_inner())
}

/// The label of the first PEM block in the input, if any
pub(crate) fn pem_label(pem: &str) -> Option<&str> {
    pem.trim()
        .strip_prefix("-----BEGIN ")
        .and_then(|rest| rest.split_once("-----"))
        .map(|(label, _)| label)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PEM: &str = "-----BEGIN TEST KEY-----\naGVsbG8s\nIHdvcmxk\n-----END TEST KEY-----\n";

    #[test]
    fn pem_body_decodes() {
        assert_eq!(pem_label(PEM), Some("TEST KEY"));
        assert_eq!(pem_to_der(PEM, "TEST KEY").unwrap(), b"hello, world");
    }

    #[test]
    fn pem_label_must_match() {
        assert!(pem_to_der(PEM, "PRIVATE KEY").is_err());
        assert_eq!(pem_label("not pem"), None);
    }
}
