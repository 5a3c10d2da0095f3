use std::fmt;

use aliri_base64::Base64Url;
use aliri_clock::{Clock, System, UnixTime};
use indexmap::IndexMap;
use serde::{
    de::{self, MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};
use serde_json::Value;

use super::{Audience, Issuer, Subject};
use crate::{claims::RegisteredClaim, error};

/// The claims of a JWT
///
/// Claims keep their insertion order and the casing they were given, but
/// two names that differ only in ASCII case can never coexist. The
/// lowercased name is the only key, so the uniqueness check and the stored
/// claims cannot drift apart.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[must_use]
pub struct Payload {
    claims: IndexMap<String, (String, Value)>,
}

fn fold(name: &str) -> String {
    name.to_ascii_lowercase()
}

impl Payload {
    /// An empty payload
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a claim
    ///
    /// If a claim with the same case-insensitive name exists and
    /// `overwrite` is `false`, nothing changes and `false` is returned.
    /// Otherwise the value is stored under the name exactly as given,
    /// replacing any differently cased name, and `true` is returned.
    pub fn add_claim(
        &mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
        overwrite: bool,
    ) -> bool {
        let name = name.into();
        let key = fold(&name);

        if !overwrite && self.claims.contains_key(&key) {
            return false;
        }

        self.claims.insert(key, (name, value.into()));
        true
    }

    /// Adds a claim that must not already be present
    ///
    /// # Errors
    ///
    /// A claim with the same case-insensitive name exists; the payload is
    /// unchanged.
    pub fn try_add_claim(
        &mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<(), error::DuplicateClaim> {
        let name = name.into();
        let key = fold(&name);

        if self.claims.contains_key(&key) {
            return Err(error::duplicate_claim(name));
        }

        self.claims.insert(key, (name, value.into()));
        Ok(())
    }

    /// Adds or replaces a claim, returning the value it replaced
    pub fn set_claim(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let name = name.into();
        self.claims
            .insert(fold(&name), (name, value.into()))
            .map(|(_, v)| v)
    }

    /// Adds a registered claim
    ///
    /// Behaves as [`add_claim()`][Self::add_claim] under the claim's
    /// registered name.
    pub fn add_registered_claim(
        &mut self,
        claim: RegisteredClaim,
        value: impl Into<Value>,
        overwrite: bool,
    ) -> bool {
        self.add_claim(claim.name(), value, overwrite)
    }

    /// Removes a claim, matching the name case-insensitively
    pub fn remove_claim(&mut self, name: &str) -> Option<Value> {
        self.claims.shift_remove(&fold(name)).map(|(_, v)| v)
    }

    /// Whether a claim exists, matching the name case-insensitively
    #[must_use]
    pub fn has_claim(&self, name: &str) -> bool {
        self.claims.contains_key(&fold(name))
    }

    /// Whether a claim exists with exactly this value, matching the name
    /// case-insensitively
    #[must_use]
    pub fn has_claim_with_value(&self, name: &str, value: &Value) -> bool {
        self.claim(name).map_or(false, |v| v == value)
    }

    /// The value of a claim, matching the name case-insensitively
    #[must_use]
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.claims.get(&fold(name)).map(|(_, v)| v)
    }

    /// The value of a registered claim
    #[must_use]
    pub fn registered_claim(&self, claim: RegisteredClaim) -> Option<&Value> {
        self.claim(claim.name())
    }

    /// Claims in insertion order, with the names as they were given
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.claims.values().map(|(n, v)| (n.as_str(), v))
    }

    /// The number of claims
    #[must_use]
    pub fn len(&self) -> usize {
        self.claims.len()
    }

    /// Whether there are no claims
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// Sets the `iss` claim
    pub fn with_issuer(mut self, iss: impl Into<Issuer>) -> Self {
        self.set_claim(RegisteredClaim::Issuer.name(), iss.into().as_str());
        self
    }

    /// Sets the `sub` claim
    pub fn with_subject(mut self, sub: impl Into<Subject>) -> Self {
        self.set_claim(RegisteredClaim::Subject.name(), sub.into().as_str());
        self
    }

    /// Sets the `aud` claim to a single audience
    pub fn with_audience(mut self, aud: impl Into<Audience>) -> Self {
        self.set_claim(RegisteredClaim::Audience.name(), aud.into().as_str());
        self
    }

    /// Sets the `aud` claim to an array of audiences
    pub fn with_audiences<I>(mut self, auds: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Audience>,
    {
        let auds: Vec<Value> = auds
            .into_iter()
            .map(|a| Value::from(a.into().as_str()))
            .collect();
        self.set_claim(RegisteredClaim::Audience.name(), auds);
        self
    }

    /// Sets the `jti` claim
    pub fn with_jwt_id(mut self, jti: impl Into<String>) -> Self {
        self.set_claim(RegisteredClaim::JwtId.name(), jti.into());
        self
    }

    /// Sets the `exp` claim
    pub fn with_expiration(mut self, time: UnixTime) -> Self {
        self.set_claim(RegisteredClaim::Expiration.name(), time.0);
        self
    }

    /// Sets the `nbf` claim
    pub fn with_not_before(mut self, time: UnixTime) -> Self {
        self.set_claim(RegisteredClaim::NotBefore.name(), time.0);
        self
    }

    /// Sets the `iat` claim
    pub fn with_issued_at(mut self, time: UnixTime) -> Self {
        self.set_claim(RegisteredClaim::IssuedAt.name(), time.0);
        self
    }

    /// Sets the `exp` claim for the JWT using the system clock
    pub fn with_future_expiration(self, secs: u64) -> Self {
        self.with_future_expiration_from_clock(secs, &System)
    }

    /// Sets the `exp` claim for the JWT using the specified clock
    pub fn with_future_expiration_from_clock<C: Clock>(self, secs: u64, clock: &C) -> Self {
        let n = clock.now();
        self.with_expiration(UnixTime(n.0.saturating_add(secs)))
    }

    /// The payload as a JSON object
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.iter()
                .map(|(n, v)| (n.to_owned(), v.clone()))
                .collect(),
        )
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
    ///
    /// # Errors
    ///
    /// The claims could not be serialized.
    pub fn base64_encode(&self) -> Result<Base64Url, error::MalformedPayload> {
        let raw = serde_json::to_vec(self).map_err(error::malformed_payload)?;
        Ok(Base64Url::from_raw(raw))
    }

    /// Decodes a base64url encoded payload
    ///
    /// # Errors
    ///
    /// The input is not valid base64url, is not a JSON object, or holds two
    /// claims whose names differ only in case.
    pub fn base64_decode(encoded: &str) -> Result<Self, error::MalformedPayload> {
        let raw = Base64Url::from_encoded(encoded).map_err(error::malformed_payload)?;
        serde_json::from_slice(raw.as_slice()).map_err(error::malformed_payload)
    }
}

/// Prints compact JSON, or indented JSON with the alternate flag
impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.to_value(), f)
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Payload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(PayloadVisitor)
    }
}

struct PayloadVisitor;

impl<'de> Visitor<'de> for PayloadVisitor {
    type Value = Payload;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a JSON object of claims")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut payload = Payload::new();
        while let Some((name, value)) = map.next_entry::<String, Value>()? {
            payload
                .try_add_claim(name, value)
                .map_err(de::Error::custom)?;
        }
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use aliri_clock::TestClock;
    use serde_json::json;

    use super::*;

    #[test]
    fn duplicate_names_differing_in_case_are_refused() {
        let mut payload = Payload::new();
        assert!(payload.add_claim("sub", "v1", false));
        assert!(!payload.add_claim("SUB", "v2", false));

        assert!(payload.has_claim("Sub"));
        assert!(payload.has_claim_with_value("sub", &json!("v1")));
        assert!(payload.has_claim_with_value("SUB", &json!("v1")));
        assert!(!payload.has_claim_with_value("sub", &json!("v2")));
        assert_eq!(payload.len(), 1);
    }

    #[test]
    fn try_add_claim_reports_the_name() {
        let mut payload = Payload::new();
        payload.try_add_claim("Role", "admin").unwrap();
        let err = payload.try_add_claim("role", "user").unwrap_err();
        assert_eq!(err.name(), "role");
        assert_eq!(payload.claim("ROLE"), Some(&json!("admin")));
    }

    #[test]
    fn overwrite_adopts_new_casing() {
        let mut payload = Payload::new();
        payload.add_claim("first", 1, false);
        payload.add_claim("Scope", "read", false);
        payload.add_claim("last", 3, false);

        assert!(payload.add_claim("SCOPE", "write", true));
        assert_eq!(payload.len(), 3);
        assert_eq!(payload.to_json(), r#"{"first":1,"SCOPE":"write","last":3}"#);
        assert!(payload.has_claim_with_value("scope", &json!("write")));
    }

    #[test]
    fn set_and_remove() {
        let mut payload = Payload::new();
        assert_eq!(payload.set_claim("a", 1), None);
        assert_eq!(payload.set_claim("A", 2), Some(json!(1)));
        assert_eq!(payload.remove_claim("a"), Some(json!(2)));
        assert!(payload.is_empty());
    }

    #[test]
    fn serialization_keeps_insertion_order_and_casing() {
        let mut payload = Payload::new()
            .with_issuer("tessera")
            .with_subject("alice")
            .with_audiences(["api", "web"]);
        payload.add_claim("Custom", json!({"z": 1, "a": [true, null]}), false);

        assert_eq!(
            payload.to_json(),
            r#"{"iss":"tessera","sub":"alice","aud":["api","web"],"Custom":{"z":1,"a":[true,null]}}"#
        );
        assert_eq!(serde_json::to_string(&payload).unwrap(), payload.to_json());

        let names: Vec<_> = payload.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["iss", "sub", "aud", "Custom"]);
    }

    #[test]
    fn decode_rejects_case_duplicates() {
        let encoded = Base64Url::from_raw(br#"{"sub":"a","Sub":"b"}"#.to_vec()).to_string();
        assert!(Payload::base64_decode(&encoded).is_err());

        let encoded = Base64Url::from_raw(br#"["sub"]"#.to_vec()).to_string();
        assert!(Payload::base64_decode(&encoded).is_err());
    }

    #[test]
    fn base64_round_trip() {
        let payload = Payload::new().with_jwt_id("id-1").with_issued_at(UnixTime(10));
        let encoded = payload.base64_encode().unwrap();
        assert_eq!(Payload::base64_decode(&encoded.to_string()).unwrap(), payload);
    }

    #[test]
    fn future_expiration_uses_clock() {
        let clock = TestClock::new(UnixTime(1_000));
        let payload = Payload::new().with_future_expiration_from_clock(60, &clock);
        assert_eq!(
            payload.registered_claim(RegisteredClaim::Expiration),
            Some(&json!(1_060))
        );
    }

    #[test]
    fn pretty_output_is_indented() {
        let payload = Payload::new().with_subject("alice");
        assert_eq!(payload.to_json_pretty(), "{\n  \"sub\": \"alice\"\n}");
    }
}
