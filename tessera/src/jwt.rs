//! Implementations of the JSON Web Tokens (JWT) standard
//!
//! The specifications for this standard can be found in [RFC7519][].
//!
//! Signed JWTs appear as three base64url-encoded segments separated by
//! `.` characters: header, payload, and signature.
//!
//! ```text
//! eyJ0eXAiOiJKV1QiLCJhbGciOiJIUzI1NiJ9.eyJzdWIiOiJhbGljZSJ9.<signature>
//! ```
//!
//! The header names the algorithm used for signing. The payload carries the
//! claims. The signature covers the first two segments exactly as they
//! appear on the wire; verification never re-serializes decoded JSON.
//!
//! Nothing in a token should be trusted until [`Token::decode_and_verify()`]
//! has checked the algorithm against the caller's expectations, verified
//! the signature, and validated the claims.
//!
//! [RFC7519]: https://tools.ietf.org/html/rfc7519

use std::{fmt, io};

use aliri_base64::{Base64Url, Base64UrlRef};
use aliri_braid::braid;
use aliri_clock::{Clock, System};

use crate::{error, jwa, jws};

mod header;
mod payload;
mod validator;

pub use header::{Header, Type};
pub use payload::Payload;
pub use validator::{CoreValidator, DEFAULT_MAX_SEGMENT_LEN};

/// An audience
#[braid(serde, ref_doc = "A borrowed reference to an [`Audience`]")]
pub struct Audience;

/// An issuer of JWTs
#[braid(serde, ref_doc = "A borrowed reference to an [`Issuer`]")]
pub struct Issuer;

/// The subject of a JWT
#[braid(serde, ref_doc = "A borrowed reference to a [`Subject`]")]
pub struct Subject;

/// A JSON Web Token in compact serialization
///
/// This type provides custom implementations of [`Display`][JwtRef#impl-Display] and
/// [`Debug`][JwtRef#impl-Debug] to prevent unintentional disclosures of sensitive values.
/// See the documentation on those trait implementations on the [`JwtRef`] type for more
/// information.
#[braid(
    serde,
    debug = "owned",
    display = "owned",
    ord = "omit",
    ref_doc = "\
    A borrowed reference to a JSON Web Token ([`Jwt`])\n\
    \n\
    This type provides custom implementations of [`Display`][Self#impl-Display] and \
    [`Debug`][Self#impl-Debug] to prevent unintentional disclosures of sensitive values. \
    See the documentation on those trait implementations for more information.
    "
)]
#[must_use]
pub struct Jwt;

/// By default, this type holds potentially sensitive information. To prevent
/// unintentional disclosure of this value, this type will not print out its
/// contents without explicitly specifying the alternate debug format,
/// i.e. `{:#?}`. When specified in this form, it will print out the entire header
/// and payload, but will omit the token's signature. To change the number of
/// characters in the signature that should be printed, specify the amount as a
/// width in the format string, i.e. `{:#25?}`.
///
/// # Example
///
/// ```
/// # use tessera::jwt::JwtRef;
/// #
/// let token = JwtRef::from_str(concat!(
///     "eyJhbGciOiJIUzI1NiJ9.",
///     "eyJzdWIiOiJBbGlyaSIsImF1ZCI6Im15X2FwaSIsImlzcyI6ImF1dGhvcml0eSJ9.",
///     "2N5yyY2UjqlUKSSCpFVWzfixfBRTWahiN2PrUuiuxbE"
/// ));
///
/// assert_eq!(format!("{:?}", token), "***JWT***");
/// assert_eq!(format!("{:#?}", token), concat!(
///     "\"eyJhbGciOiJIUzI1NiJ9.",
///     "eyJzdWIiOiJBbGlyaSIsImF1ZCI6Im15X2FwaSIsImlzcyI6ImF1dGhvcml0eSJ9.",
///     "…\""
/// ));
/// assert_eq!(format!("{:#5?}", token), concat!(
///     "\"eyJhbGciOiJIUzI1NiJ9.",
///     "eyJzdWIiOiJBbGlyaSIsImF1ZCI6Im15X2FwaSIsImlzcyI6ImF1dGhvcml0eSJ9.",
///     "2N5y…\""
/// ));
/// ```
impl fmt::Debug for JwtRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if f.alternate() {
            f.write_str("\"")?;
            if let Some(last_period) = self.0.rfind('.') {
                f.write_str(&self.0[..=last_period])?;
                limited_reveal(&self.0[last_period + 1..], &mut *f, 0)?;
            } else {
                limited_reveal(&self.0, &mut *f, 0)?;
            }
            f.write_str("\"")
        } else {
            f.write_str(concat!("***", "JWT", "***"))
        }
    }
}

/// By default, this type holds potentially sensitive information. To prevent
/// unintentional disclosure of this value, this type will not print out its
/// contents without explicitly specifying the alternate format,
/// i.e. `{:#}`. When specified in this form, it will print out the entire token by default.
/// A width, i.e. `{:#10}`, limits how much of the signature is shown.
///
/// # Example
///
/// ```
/// # use tessera::jwt::JwtRef;
/// #
/// let token = JwtRef::from_str(concat!(
///     "eyJhbGciOiJIUzI1NiJ9.",
///     "eyJzdWIiOiJBbGlyaSIsImF1ZCI6Im15X2FwaSIsImlzcyI6ImF1dGhvcml0eSJ9.",
///     "2N5yyY2UjqlUKSSCpFVWzfixfBRTWahiN2PrUuiuxbE"
/// ));
///
/// assert_eq!(format!("{}", token), "***JWT***");
/// assert_eq!(format!("{:#}", token), concat!(
///     "eyJhbGciOiJIUzI1NiJ9.",
///     "eyJzdWIiOiJBbGlyaSIsImF1ZCI6Im15X2FwaSIsImlzcyI6ImF1dGhvcml0eSJ9.",
///     "2N5yyY2UjqlUKSSCpFVWzfixfBRTWahiN2PrUuiuxbE"
/// ));
/// ```
impl fmt::Display for JwtRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if f.alternate() {
            if let Some(last_period) = self.0.rfind('.') {
                f.write_str(&self.0[..=last_period])?;
                limited_reveal(&self.0[last_period + 1..], &mut *f, usize::MAX)
            } else {
                limited_reveal(&self.0, &mut *f, usize::MAX)
            }
        } else {
            f.write_str(concat!("***", "JWT", "***"))
        }
    }
}

fn limited_reveal(unprotected: &str, f: &mut fmt::Formatter, default_len: usize) -> fmt::Result {
    let max_len = f.width().unwrap_or(default_len);
    if max_len <= 1 {
        f.write_str("…")
    } else if max_len > unprotected.len() {
        f.write_str(unprotected)
    } else {
        match unprotected.char_indices().nth(max_len - 2) {
            Some((idx, c)) if idx + c.len_utf8() < unprotected.len() => {
                f.write_str(&unprotected[0..idx + c.len_utf8()])?;
                f.write_str("…")
            }
            _ => f.write_str(unprotected),
        }
    }
}

/// The signature computed over, or verified against, a token
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    alg: jwa::Algorithm,
    bytes: Base64Url,
}

impl Signature {
    /// The algorithm that produced the signature
    #[must_use]
    pub fn alg(&self) -> jwa::Algorithm {
        self.alg
    }

    /// The raw signature
    #[must_use]
    pub fn as_bytes(&self) -> &Base64UrlRef {
        &self.bytes
    }
}

/// A JWT header, payload, and the signature last computed or verified
/// for them
///
/// Mutable access to the header or payload discards the signature, so a
/// present signature always belongs to the current contents and uses the
/// header's algorithm.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[must_use]
pub struct Token {
    header: Header,
    payload: Payload,
    signature: Option<Signature>,
}

/// A JWT split into its segments, with the header decoded
///
/// This structure is suitable for inspection to determine which key
/// should be used to verify the JWT. Nothing here has been verified.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub struct Decomposed<'a> {
    header: Header,
    message: &'a str,
    payload: &'a str,
    signature: &'a str,
}

const SEGMENTS: [&str; 3] = ["header", "payload", "signature"];

fn check_segment_len(idx: usize, encoded: &str, max: usize) -> Result<(), error::TokenTooLarge> {
    let decoded = encoded.len() / 4 * 3 + (encoded.len() % 4).saturating_sub(1);
    if decoded > max {
        return Err(error::token_too_large(SEGMENTS[idx], decoded, max));
    }
    Ok(())
}

impl JwtRef {
    /// Decomposes the JWT into its parts, preparing it for later processing
    ///
    /// Segments are bounded by [`DEFAULT_MAX_SEGMENT_LEN`].
    ///
    /// # Errors
    ///
    /// The token does not have exactly three segments, a segment is too
    /// large, or the header cannot be decoded.
    pub fn decompose(&self) -> Result<Decomposed<'_>, error::JwtVerifyError> {
        self.decompose_bounded(DEFAULT_MAX_SEGMENT_LEN)
    }

    fn decompose_bounded(&self, max: usize) -> Result<Decomposed<'_>, error::JwtVerifyError> {
        let mut segments = self.as_str().split('.');
        let (h_str, p_str, s_str) = match (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) {
            (Some(h), Some(p), Some(s), None) => (h, p, s),
            _ => return Err(error::malformed_token("expected exactly three segments").into()),
        };

        for (idx, segment) in [h_str, p_str, s_str].iter().enumerate() {
            check_segment_len(idx, segment, max)?;
        }

        let header = Header::base64_decode(h_str)?;

        let message = &self.as_str()[..h_str.len() + 1 + p_str.len()];

        Ok(Decomposed {
            header,
            message,
            payload: p_str,
            signature: s_str,
        })
    }
}

impl<'a> Decomposed<'a> {
    /// The untrusted header of the JWT
    ///
    /// **WARNING:** *This header has not been validated and should not be trusted.*
    /// An adversary can place arbitrary data into the header and payload of a JWT.
    pub fn untrusted_header(&self) -> &Header {
        &self.header
    }

    /// The untrusted, still encoded payload of the JWT
    ///
    /// **WARNING:** *This payload has not been validated and should not be trusted.*
    #[must_use]
    pub fn untrusted_payload(&self) -> &'a str {
        self.payload
    }

    /// The signing input: the encoded header and payload, separated by a `.`
    #[must_use]
    pub fn untrusted_message(&self) -> &'a str {
        self.message
    }

    /// The encoded signature
    #[must_use]
    pub fn untrusted_signature(&self) -> &'a str {
        self.signature
    }

    /// Verifies the decomposed JWT against the given key, expected
    /// algorithms, and validator
    ///
    /// # Errors
    ///
    /// The token is refused for any of the reasons in [`error::JwtVerifyError`].
    pub fn verify<V>(
        self,
        key: &V,
        expected: &[jwa::Algorithm],
        validator: &CoreValidator,
    ) -> Result<Token, error::JwtVerifyError>
    where
        V: jws::Verifier<Algorithm = jwa::Algorithm>,
        error::JwtVerifyError: From<V::Error>,
    {
        self.verify_with_clock(key, expected, validator, &System)
    }

    /// Verifies the decomposed JWT, validating time claims against the
    /// given clock
    ///
    /// # Errors
    ///
    /// The token is refused for any of the reasons in [`error::JwtVerifyError`].
    pub fn verify_with_clock<V, C>(
        self,
        key: &V,
        expected: &[jwa::Algorithm],
        validator: &CoreValidator,
        clock: &C,
    ) -> Result<Token, error::JwtVerifyError>
    where
        V: jws::Verifier<Algorithm = jwa::Algorithm>,
        error::JwtVerifyError: From<V::Error>,
        C: Clock,
    {
        let alg = self.header.alg();

        if !expected.contains(&alg) {
            #[cfg(feature = "tracing")]
            tracing::warn!(jwt.alg = %alg, "token algorithm not among expected algorithms");
            return Err(error::algorithm_rejected(alg).into());
        }

        let signature = Base64Url::from_encoded(self.signature)
            .map_err(|_| error::malformed_token("signature is not valid base64url"))?;

        if alg == jwa::Algorithm::NONE && !validator.allows_unsecured() {
            #[cfg(feature = "tracing")]
            tracing::warn!(jwt.alg = %alg, "unsecured token refused");
            return Err(error::signature_invalid().into());
        }

        if let Err(err) = key.verify(alg, self.message.as_bytes(), signature.as_slice()) {
            let err = error::JwtVerifyError::from(err);
            #[cfg(feature = "tracing")]
            tracing::warn!(jwt.alg = %alg, error = %err, "token signature rejected");
            return Err(err);
        }

        let payload = Payload::base64_decode(self.payload)?;

        if let Err(err) = validator.validate_with_clock(&payload, clock) {
            #[cfg(feature = "tracing")]
            tracing::warn!(jwt.alg = %alg, error = %err, "token claims rejected");
            return Err(err.into());
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(jwt.alg = %alg, "token verified");

        Ok(Token {
            header: self.header,
            payload,
            signature: Some(Signature {
                alg,
                bytes: signature,
            }),
        })
    }
}

impl Token {
    /// Constructs an unsigned token
    pub fn new(header: Header, payload: Payload) -> Self {
        Self {
            header,
            payload,
            signature: None,
        }
    }

    /// The header
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// The payload
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Mutable access to the header, discarding any signature
    pub fn header_mut(&mut self) -> &mut Header {
        self.signature = None;
        &mut self.header
    }

    /// Mutable access to the payload, discarding any signature
    pub fn payload_mut(&mut self) -> &mut Payload {
        self.signature = None;
        &mut self.payload
    }

    /// The signature, once the token has been encoded or verified
    #[must_use]
    pub fn signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    /// Extracts the header and payload
    #[must_use]
    pub fn into_parts(self) -> (Header, Payload) {
        (self.header, self.payload)
    }

    /// Serializes and signs the token, producing its compact form
    ///
    /// The signature is kept on the token.
    ///
    /// # Errors
    ///
    /// The key cannot sign with the header's algorithm, or the header or
    /// payload could not be serialized.
    pub fn encode<S>(&mut self, key: &S) -> Result<Jwt, error::JwtSigningError>
    where
        S: jws::Signer<Algorithm = jwa::Algorithm>,
        error::SigningError: From<S::Error>,
    {
        let alg = self.header.alg();

        let h_raw = Base64Url::from_raw(
            serde_json::to_vec(&self.header).map_err(error::malformed_header)?,
        );
        let p_raw = Base64Url::from_raw(
            serde_json::to_vec(&self.payload).map_err(error::malformed_payload)?,
        );

        let sig_len = alg.fixed_signature_size().unwrap_or(512);
        let mut message = String::with_capacity(
            h_raw.encoded_len() + p_raw.encoded_len() + Base64Url::calc_encoded_len(sig_len) + 2,
        );
        message.push_str(&h_raw.to_string());
        message.push('.');
        message.push_str(&p_raw.to_string());

        let signature = Base64Url::from_raw(
            key.sign(alg, message.as_bytes())
                .map_err(error::SigningError::from)?,
        );

        message.push('.');
        message.push_str(&signature.to_string());

        self.signature = Some(Signature {
            alg,
            bytes: signature,
        });

        Ok(Jwt::new(message))
    }

    /// Decodes, verifies, and validates a compact token
    ///
    /// The token's algorithm must be one of `expected` before any
    /// cryptographic work is done. Unsecured tokens additionally require
    /// [`CoreValidator::allow_unsecured()`].
    ///
    /// # Errors
    ///
    /// The token is refused for any of the reasons in [`error::JwtVerifyError`].
    pub fn decode_and_verify<V>(
        jwt: &JwtRef,
        key: &V,
        expected: &[jwa::Algorithm],
        validator: &CoreValidator,
    ) -> Result<Self, error::JwtVerifyError>
    where
        V: jws::Verifier<Algorithm = jwa::Algorithm>,
        error::JwtVerifyError: From<V::Error>,
    {
        Self::decode_and_verify_with_clock(jwt, key, expected, validator, &System)
    }

    /// Decodes, verifies, and validates a compact token, validating time
    /// claims against the given clock
    ///
    /// # Errors
    ///
    /// The token is refused for any of the reasons in [`error::JwtVerifyError`].
    pub fn decode_and_verify_with_clock<V, C>(
        jwt: &JwtRef,
        key: &V,
        expected: &[jwa::Algorithm],
        validator: &CoreValidator,
        clock: &C,
    ) -> Result<Self, error::JwtVerifyError>
    where
        V: jws::Verifier<Algorithm = jwa::Algorithm>,
        error::JwtVerifyError: From<V::Error>,
        C: Clock,
    {
        let decomposed = jwt
            .decompose_bounded(validator.max_segment_len())
            .map_err(|err| {
                #[cfg(feature = "tracing")]
                tracing::debug!(error = %err, "token could not be decomposed");
                err
            })?;

        decomposed.verify_with_clock(key, expected, validator, clock)
    }

    /// Writes the header and payload as a JSON object
    ///
    /// # Errors
    ///
    /// The writer failed.
    pub fn write<W: io::Write>(&self, writer: &mut W, pretty: bool) -> io::Result<()> {
        let value = serde_json::json!({
            "header": self.header.to_value(),
            "payload": self.payload.to_value(),
        });

        if pretty {
            write!(writer, "{:#}", value)
        } else {
            write!(writer, "{}", value)
        }
    }
}
