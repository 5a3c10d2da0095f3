use std::fmt;

use aliri_base64::Base64Url;
use serde::{Deserialize, Serialize};

use crate::{error, jwa};

/// The media type of a token, carried in `typ`
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(clippy::upper_case_acronyms)]
pub enum Type {
    /// A JSON Web Token
    #[default]
    JWT,
}

impl Type {
    /// The registered name of the type
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::JWT => "JWT",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A JWT header
///
/// Serializes as `{"typ":"JWT","alg":"<name>"}` with `typ` first. The
/// encoding is recomputed from the current state on every call, so changing
/// the algorithm is always reflected in the next encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[must_use]
pub struct Header {
    typ: Type,
    alg: jwa::Algorithm,
}

#[derive(Deserialize)]
struct HeaderDto {
    alg: String,
    #[serde(default)]
    typ: Option<String>,
}

impl Header {
    /// A header for the given algorithm
    pub const fn new(alg: jwa::Algorithm) -> Self {
        Self { typ: Type::JWT, alg }
    }

    /// The signing algorithm
    #[must_use]
    pub const fn alg(&self) -> jwa::Algorithm {
        self.alg
    }

    /// Replaces the signing algorithm
    pub fn set_alg(&mut self, alg: jwa::Algorithm) {
        self.alg = alg;
    }

    /// Replaces the signing algorithm by name
    ///
    /// # Errors
    ///
    /// The name is not a registered algorithm; the header is unchanged.
    pub fn set_alg_name(&mut self, name: &str) -> Result<(), error::UnknownAlgorithm> {
        self.alg = name.parse()?;
        Ok(())
    }

    /// The token type
    #[must_use]
    pub const fn typ(&self) -> Type {
        self.typ
    }

    /// Replaces the token type
    pub fn set_typ(&mut self, typ: Type) {
        self.typ = typ;
    }

    /// The header as a JSON value
    #[must_use]
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "typ": self.typ.name(),
            "alg": self.alg.name(),
        })
    }

    /// Compact JSON
    #[must_use]
    pub fn to_json(&self) -> String {
        self.to_string()
    }

    /// Indented JSON
    #[must_use]
    pub fn to_json_pretty(&self) -> String {
        format!("{:#}", self)
    }

    /// The compact JSON, base64url encoded
    #[must_use]
    pub fn base64_encode(&self) -> Base64Url {
        Base64Url::from_raw(self.to_json().into_bytes())
    }

    /// Decodes a base64url encoded header
    ///
    /// Invalid base64url is a [`MalformedToken`][error::MalformedToken], as
    /// it is when decoding a whole token.
    ///
    /// # Errors
    ///
    /// The input is not valid base64url, or the JSON is not a valid header,
    /// or the header names an unknown algorithm.
    pub fn base64_decode(encoded: &str) -> Result<Self, error::JwtVerifyError> {
        let raw = Base64Url::from_encoded(encoded)
            .map_err(|_| error::malformed_token("header is not valid base64url"))?;
        Self::from_json_slice(raw.as_slice())
    }

    /// Parses a header from raw JSON
    ///
    /// Field names are matched exactly; `"Alg"` does not stand in for
    /// `"alg"`. Unregistered fields are ignored.
    fn from_json_slice(raw: &[u8]) -> Result<Self, error::JwtVerifyError> {
        if raw.iter().find(|b| !b.is_ascii_whitespace()) != Some(&b'{') {
            return Err(error::malformed_header("header is not a JSON object").into());
        }

        let dto: HeaderDto = serde_json::from_slice(raw).map_err(error::malformed_header)?;

        let typ = match dto.typ.as_deref() {
            None | Some("JWT") => Type::JWT,
            Some(_) => return Err(error::malformed_header("unsupported token type").into()),
        };

        let alg = jwa::Algorithm::try_from(dto.alg)?;

        Ok(Self { typ, alg })
    }
}

/// An unsecured header
impl Default for Header {
    fn default() -> Self {
        Self::new(jwa::Algorithm::NONE)
    }
}

/// Prints compact JSON, or indented JSON with the alternate flag
impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.to_value(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_has_typ_then_alg() {
        let header = Header::new(jwa::Algorithm::HS256);
        assert_eq!(header.to_json(), r#"{"typ":"JWT","alg":"HS256"}"#);
        assert_eq!(
            serde_json::to_string(&header).unwrap(),
            r#"{"typ":"JWT","alg":"HS256"}"#
        );
        assert_eq!(
            header.to_json_pretty(),
            "{\n  \"typ\": \"JWT\",\n  \"alg\": \"HS256\"\n}"
        );
    }

    #[test]
    fn default_header_is_unsecured() {
        assert_eq!(Header::default().alg(), jwa::Algorithm::NONE);
        assert_eq!(Header::default().typ(), Type::JWT);
    }

    #[test]
    fn encoding_tracks_algorithm_changes() {
        let mut header = Header::new(jwa::Algorithm::HS256);
        let before = header.base64_encode();
        header.set_alg(jwa::Algorithm::ES384);
        let after = header.base64_encode();
        assert_ne!(before, after);
        assert_eq!(Header::base64_decode(&after.to_string()).unwrap(), header);
    }

    #[test]
    fn set_alg_name_leaves_header_on_error() {
        let mut header = Header::new(jwa::Algorithm::RS256);
        let err = header.set_alg_name("rs512").unwrap_err();
        assert_eq!(err.name(), "rs512");
        assert_eq!(header.alg(), jwa::Algorithm::RS256);

        header.set_alg_name("RS512").unwrap();
        assert_eq!(header.alg(), jwa::Algorithm::RS512);
    }

    #[test]
    fn wrongly_cased_alg_field_is_missing() {
        let err = Header::from_json_slice(br#"{"Alg":"HS256"}"#).unwrap_err();
        assert!(err.is_malformed_header());
    }

    #[test]
    fn unknown_algorithm_is_distinct() {
        let err = Header::from_json_slice(br#"{"alg":"HS1024"}"#).unwrap_err();
        assert!(err.is_unknown_algorithm());
    }

    #[test]
    fn structural_failures_are_malformed() {
        for raw in [
            &br#"[]"#[..],
            br#""alg""#,
            br#"["HS256"]"#,
            br#"{"alg":256}"#,
            br#"{"alg":"HS256","typ":"JOSE"}"#,
            br#"{"alg":"HS256","alg":"HS256"}"#,
            br#"{"alg":"HS256""#,
        ] {
            let err = Header::from_json_slice(raw).unwrap_err();
            assert!(err.is_malformed_header(), "{}", String::from_utf8_lossy(raw));
        }
    }

    #[test]
    fn invalid_base64_is_a_malformed_token() {
        for encoded in ["!!!!", "eyJhbGciOiJIUzI1NiJ9=", "e"] {
            let err = Header::base64_decode(encoded).unwrap_err();
            assert!(err.is_malformed_token(), "{}", encoded);
        }

        let err = Header::base64_decode("e30").unwrap_err();
        assert!(err.is_malformed_header());
    }

    #[test]
    fn extra_fields_and_missing_typ_are_accepted() {
        let header = Header::from_json_slice(br#"{"alg":"ES256","kid":"k1"}"#).unwrap();
        assert_eq!(header, Header::new(jwa::Algorithm::ES256));
    }
}
