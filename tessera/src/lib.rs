//! This crate composes, signs, and verifies JSON Web Tokens (JWT) in their
//! compact serialization, using the algorithms of the JSON Web Signature
//! family:
//!
//! * JSON Web Signature (JWS): [RFC7515][]
//! * JSON Web Algorithms (JWA): [RFC7518][]
//! * JSON Web Token (JWT): [RFC7519][]
//!
//! Supported algorithms are `NONE`, `HS256`/`HS384`/`HS512`,
//! `RS256`/`RS384`/`RS512`, and `ES256`/`ES384`/`ES512`.
//!
//! JSON Web Encryption (JWE) and JSON Web Keys (JWK) are not supported.
//!
//! [RFC7515]: https://tools.ietf.org/html/rfc7515
//! [RFC7518]: https://tools.ietf.org/html/rfc7518
//! [RFC7519]: https://tools.ietf.org/html/rfc7519
//!
//! # Example
//!
//! ```
//! use tessera::{jwa, jwt, Key, Token};
//!
//! let key = Key::from(jwa::Hmac::new(&b"secret-key"[..]));
//!
//! let mut token = Token::new(
//!     jwt::Header::new(jwa::Algorithm::HS256),
//!     jwt::Payload::new()
//!         .with_issuer("tessera")
//!         .with_subject("alice")
//!         .with_audiences(["api", "web"]),
//! );
//!
//! let jwt = token.encode(&key).unwrap();
//! assert_eq!(jwt.as_str(), concat!(
//!     "eyJ0eXAiOiJKV1QiLCJhbGciOiJIUzI1NiJ9.",
//!     "eyJpc3MiOiJ0ZXNzZXJhIiwic3ViIjoiYWxpY2UiLCJhdWQiOlsiYXBpIiwid2ViIl19.",
//!     "IVG_TCf6LlQ_HcUNn3q-8al55U4A7eX0rW8VXVJTypw",
//! ));
//!
//! let validator = jwt::CoreValidator::default()
//!     .add_allowed_audience("api")
//!     .add_allowed_issuer("tessera");
//!
//! let verified = Token::decode_and_verify(&jwt, &key, &[jwa::Algorithm::HS256], &validator)
//!     .expect("JWT was invalid");
//! assert_eq!(verified.payload(), token.payload());
//! ```
//!
//! The caller always names the algorithms it is willing to accept. A token
//! whose header names any other algorithm is refused before any key is
//! consulted, and unsecured tokens additionally require
//! [`CoreValidator::allow_unsecured()`][jwt::CoreValidator::allow_unsecured].

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_must_use
)]

pub mod claims;
pub mod error;
pub mod jwa;
pub mod jws;
pub mod jwt;
mod key;


#[doc(inline)]
pub use claims::RegisteredClaim;
#[doc(inline)]
pub use jwt::{Jwt, JwtRef, Token};
#[doc(inline)]
pub use key::Key;
