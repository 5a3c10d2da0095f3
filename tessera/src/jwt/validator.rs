use std::time::Duration;

use aliri_clock::{Clock, System, UnixTime};
use regex::Regex;
use serde_json::Value;

use super::{Audience, Issuer, Payload, Subject};
use crate::{claims::RegisteredClaim, error::ClaimsRejected};

/// Default bound on the decoded size of each token segment
pub const DEFAULT_MAX_SEGMENT_LEN: usize = 16 * 1024;

/// A core validator for JWTs
///
/// By default, `exp` and `nbf` are checked whenever they are present, with
/// no grace period, nothing else is required, and unsecured tokens are
/// refused.
#[derive(Clone, Debug)]
#[must_use]
pub struct CoreValidator {
    leeway: Duration,
    validate_exp: bool,
    validate_nbf: bool,
    required: Vec<RegisteredClaim>,
    allowed_issuers: Vec<Issuer>,
    allowed_audiences: Vec<Audience>,
    subject: Option<Subject>,
    valid_subjects: Option<Regex>,
    jwt_id: Option<String>,
    allow_unsecured: bool,
    max_segment_len: usize,
}

impl Default for CoreValidator {
    #[inline]
    fn default() -> Self {
        Self {
            leeway: Duration::default(),
            validate_exp: true,
            validate_nbf: true,
            required: Vec::new(),
            allowed_issuers: Vec::new(),
            allowed_audiences: Vec::new(),
            subject: None,
            valid_subjects: None,
            jwt_id: None,
            allow_unsecured: false,
            max_segment_len: DEFAULT_MAX_SEGMENT_LEN,
        }
    }
}

impl CoreValidator {
    /// Allows a grace period for token validation
    ///
    /// Applies on either side of the "not before" and "expires" claims.
    #[inline]
    pub fn with_leeway(self, leeway: Duration) -> Self {
        Self { leeway, ..self }
    }

    /// Allows a grace period (in seconds) for token validation
    ///
    /// Applies on either side of the "not before" and "expires" claims.
    #[inline]
    pub fn with_leeway_secs(self, leeway: u64) -> Self {
        Self {
            leeway: Duration::from_secs(leeway),
            ..self
        }
    }

    /// Enforces expiration checks
    #[inline]
    pub fn check_expiration(self) -> Self {
        Self {
            validate_exp: true,
            ..self
        }
    }

    /// Enforces "not valid before" checks
    #[inline]
    pub fn check_not_before(self) -> Self {
        Self {
            validate_nbf: true,
            ..self
        }
    }

    /// Skips expiration checks
    #[inline]
    pub fn ignore_expiration(self) -> Self {
        Self {
            validate_exp: false,
            ..self
        }
    }

    /// Skips "not valid before" checks
    #[inline]
    pub fn ignore_not_before(self) -> Self {
        Self {
            validate_nbf: false,
            ..self
        }
    }

    /// Requires that a registered claim be present
    #[inline]
    pub fn require_claim(self, claim: RegisteredClaim) -> Self {
        let mut this = self;
        if !this.required.contains(&claim) {
            this.required.push(claim);
        }
        this
    }

    /// Adds a single issuer to the set of allowed issuers
    #[inline]
    pub fn add_allowed_issuer(self, issuer: impl Into<Issuer>) -> Self {
        let mut this = self;
        this.allowed_issuers.push(issuer.into());
        this
    }

    /// Adds a single audience to the set of allowed audiences
    #[inline]
    pub fn add_allowed_audience(self, audience: impl Into<Audience>) -> Self {
        let mut this = self;
        this.allowed_audiences.push(audience.into());
        this
    }

    /// Adds multiple audiences to the set of allowed audiences
    #[inline]
    pub fn extend_allowed_audiences<I: IntoIterator<Item = Audience>>(self, aud: I) -> Self {
        let mut this = self;
        this.allowed_audiences.extend(aud);
        this
    }

    /// Require that the `sub` claim be exactly this subject
    #[inline]
    pub fn require_subject(self, subject: impl Into<Subject>) -> Self {
        Self {
            subject: Some(subject.into()),
            ..self
        }
    }

    /// Require that the `sub` claim exists and matches a particular
    /// regular expression
    #[inline]
    pub fn check_subject(self, sub_regex: Regex) -> Self {
        Self {
            valid_subjects: Some(sub_regex),
            ..self
        }
    }

    /// Require that the `jti` claim be exactly this identifier
    #[inline]
    pub fn require_jwt_id(self, jti: impl Into<String>) -> Self {
        Self {
            jwt_id: Some(jti.into()),
            ..self
        }
    }

    /// Accepts unsecured (`NONE`) tokens
    ///
    /// The algorithm must also be among those the caller expects.
    #[inline]
    pub fn allow_unsecured(self) -> Self {
        Self {
            allow_unsecured: true,
            ..self
        }
    }

    /// Bounds the decoded size of each token segment, in bytes
    #[inline]
    pub fn with_max_segment_len(self, max_segment_len: usize) -> Self {
        Self {
            max_segment_len,
            ..self
        }
    }

    /// Whether unsecured tokens are accepted
    #[must_use]
    pub fn allows_unsecured(&self) -> bool {
        self.allow_unsecured
    }

    /// The bound on the decoded size of each token segment
    #[must_use]
    pub fn max_segment_len(&self) -> usize {
        self.max_segment_len
    }

    /// Validates the claims against the system clock
    ///
    /// # Errors
    ///
    /// The claims are rejected by this validator.
    pub fn validate(&self, claims: &Payload) -> Result<(), ClaimsRejected> {
        self.validate_with_clock(claims, &System)
    }

    /// Validates the claims against the given clock
    ///
    /// # Errors
    ///
    /// The claims are rejected by this validator.
    pub fn validate_with_clock<C: Clock>(
        &self,
        claims: &Payload,
        clock: &C,
    ) -> Result<(), ClaimsRejected> {
        let now = clamp(clock.now());
        let leeway = i64::try_from(self.leeway.as_secs()).unwrap_or(i64::MAX);

        for claim in &self.required {
            if claims.registered_claim(*claim).is_none() {
                return Err(ClaimsRejected::ClaimMissing(claim.name()));
            }
        }

        for claim in RegisteredClaim::ALL.iter().filter(|c| c.is_time()) {
            if let Some(value) = claims.registered_claim(*claim) {
                if numeric_date(value).is_none() {
                    return Err(ClaimsRejected::ClaimMismatch(claim.name()));
                }
            }
        }

        if self.validate_exp {
            if let Some(exp) = claims
                .registered_claim(RegisteredClaim::Expiration)
                .and_then(numeric_date)
            {
                if now > exp.saturating_add(leeway) {
                    return Err(ClaimsRejected::TokenExpired);
                }
            }
        }

        if self.validate_nbf {
            if let Some(nbf) = claims
                .registered_claim(RegisteredClaim::NotBefore)
                .and_then(numeric_date)
            {
                if now < nbf.saturating_sub(leeway) {
                    return Err(ClaimsRejected::TokenNotYetValid);
                }
            }
        }

        if !self.allowed_issuers.is_empty() {
            let iss = string_claim(claims, RegisteredClaim::Issuer)?;
            if !self.allowed_issuers.iter().any(|e| e.as_str() == iss) {
                return Err(ClaimsRejected::ClaimMismatch(RegisteredClaim::Issuer.name()));
            }
        }

        if !self.allowed_audiences.is_empty() {
            let name = RegisteredClaim::Audience.name();
            let allowed = |a: &str| self.allowed_audiences.iter().any(|e| e.as_str() == a);

            let found = match claims.registered_claim(RegisteredClaim::Audience) {
                None => return Err(ClaimsRejected::ClaimMissing(name)),
                Some(Value::String(aud)) => allowed(aud.as_str()),
                Some(Value::Array(auds)) => auds
                    .iter()
                    .filter_map(Value::as_str)
                    .any(allowed),
                Some(_) => false,
            };

            if !found {
                return Err(ClaimsRejected::ClaimMismatch(name));
            }
        }

        if self.subject.is_some() || self.valid_subjects.is_some() {
            let sub = string_claim(claims, RegisteredClaim::Subject)?;

            let exact = self.subject.as_ref().map_or(true, |s| s.as_str() == sub);
            let pattern = self.valid_subjects.as_ref().map_or(true, |r| r.is_match(sub));

            if !exact || !pattern {
                return Err(ClaimsRejected::ClaimMismatch(RegisteredClaim::Subject.name()));
            }
        }

        if let Some(expected) = &self.jwt_id {
            let jti = string_claim(claims, RegisteredClaim::JwtId)?;
            if jti != expected.as_str() {
                return Err(ClaimsRejected::ClaimMismatch(RegisteredClaim::JwtId.name()));
            }
        }

        Ok(())
    }
}

fn clamp(time: UnixTime) -> i64 {
    i64::try_from(time.0).unwrap_or(i64::MAX)
}

/// Reads a NumericDate, truncating any fractional seconds toward negative
/// infinity
fn numeric_date(value: &Value) -> Option<i64> {
    let n = match value {
        Value::Number(n) => n,
        _ => return None,
    };

    if let Some(i) = n.as_i64() {
        Some(i)
    } else if n.as_u64().is_some() {
        Some(i64::MAX)
    } else {
        // Float to int casts saturate
        n.as_f64().map(|f| f.floor() as i64)
    }
}

fn string_claim(claims: &Payload, claim: RegisteredClaim) -> Result<&str, ClaimsRejected> {
    match claims.registered_claim(claim) {
        None => Err(ClaimsRejected::ClaimMissing(claim.name())),
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(_) => Err(ClaimsRejected::ClaimMismatch(claim.name())),
    }
}

#[cfg(test)]
mod tests {
    use aliri_clock::TestClock;
    use color_eyre::Result;
    use serde_json::json;

    use super::*;

    const NOW: u64 = 1_000_000;

    fn clock() -> TestClock {
        TestClock::new(UnixTime(NOW))
    }

    fn validate(validator: &CoreValidator, claims: &Payload) -> Result<(), ClaimsRejected> {
        validator.validate_with_clock(claims, &clock())
    }

    #[test]
    fn empty_payload_passes_default_validator() {
        validate(&CoreValidator::default(), &Payload::new()).unwrap();
    }

    #[test]
    fn expiration_with_and_without_skew() {
        let claims = Payload::new().with_expiration(UnixTime(NOW - 1));

        let err = validate(&CoreValidator::default(), &claims).unwrap_err();
        assert!(err.is_expired());

        validate(&CoreValidator::default().with_leeway_secs(5), &claims).unwrap();
        validate(&CoreValidator::default().ignore_expiration(), &claims).unwrap();
    }

    #[test]
    fn expiration_boundary_is_inclusive() {
        let claims = Payload::new().with_expiration(UnixTime(NOW));
        validate(&CoreValidator::default(), &claims).unwrap();
    }

    #[test]
    fn not_before_with_and_without_skew() {
        let claims = Payload::new().with_not_before(UnixTime(NOW + 3));

        let err = validate(&CoreValidator::default(), &claims).unwrap_err();
        assert!(err.is_not_yet_valid());

        validate(&CoreValidator::default().with_leeway_secs(3), &claims).unwrap();
        validate(&CoreValidator::default().ignore_not_before(), &claims).unwrap();
    }

    #[test]
    fn fractional_dates_are_floored() {
        let mut claims = Payload::new();
        claims.set_claim("exp", json!(NOW as f64 - 0.5));
        let err = validate(&CoreValidator::default(), &claims).unwrap_err();
        assert!(err.is_expired());

        claims.set_claim("exp", json!(NOW as f64 + 0.9));
        validate(&CoreValidator::default(), &claims).unwrap();
    }

    #[test]
    fn non_numeric_dates_mismatch() {
        let mut claims = Payload::new();
        claims.set_claim("nbf", "yesterday");
        let err = validate(&CoreValidator::default().ignore_not_before(), &claims).unwrap_err();
        assert!(matches!(err, ClaimsRejected::ClaimMismatch("nbf")));
    }

    #[test]
    fn huge_dates_do_not_overflow() {
        let mut claims = Payload::new();
        claims.set_claim("exp", u64::MAX);
        claims.set_claim("nbf", i64::MIN);
        validate(&CoreValidator::default().with_leeway_secs(u64::MAX), &claims).unwrap();
    }

    #[test]
    fn required_claims() {
        let validator = CoreValidator::default().require_claim(RegisteredClaim::Expiration);
        let err = validate(&validator, &Payload::new()).unwrap_err();
        assert!(matches!(err, ClaimsRejected::ClaimMissing("exp")));

        let claims = Payload::new().with_expiration(UnixTime(NOW + 10));
        validate(&validator, &claims).unwrap();
    }

    #[test]
    fn claim_lookup_is_case_insensitive() {
        let mut claims = Payload::new();
        claims.add_claim("ISS", "authority", false);
        let validator = CoreValidator::default().add_allowed_issuer("authority");
        validate(&validator, &claims).unwrap();
    }

    #[test]
    fn issuer_checks() {
        let validator = CoreValidator::default()
            .add_allowed_issuer("one")
            .add_allowed_issuer("two");

        validate(&validator, &Payload::new().with_issuer("two")).unwrap();

        let err = validate(&validator, &Payload::new().with_issuer("three")).unwrap_err();
        assert!(matches!(err, ClaimsRejected::ClaimMismatch("iss")));

        let err = validate(&validator, &Payload::new()).unwrap_err();
        assert!(matches!(err, ClaimsRejected::ClaimMissing("iss")));

        let mut claims = Payload::new();
        claims.set_claim("iss", 1);
        let err = validate(&validator, &claims).unwrap_err();
        assert!(matches!(err, ClaimsRejected::ClaimMismatch("iss")));
    }

    #[test]
    fn audience_checks() -> Result<()> {
        let validator = CoreValidator::default().add_allowed_audience("api");

        validate(&validator, &Payload::new().with_audience("api"))?;
        validate(&validator, &Payload::new().with_audiences(["web", "api"]))?;

        let err = validate(&validator, &Payload::new().with_audiences(["web"])).unwrap_err();
        assert!(matches!(err, ClaimsRejected::ClaimMismatch("aud")));

        let err = validate(&validator, &Payload::new().with_audience("apis")).unwrap_err();
        assert!(matches!(err, ClaimsRejected::ClaimMismatch("aud")));

        let err = validate(&validator, &Payload::new()).unwrap_err();
        assert!(matches!(err, ClaimsRejected::ClaimMissing("aud")));

        Ok(())
    }

    #[test]
    fn subject_checks() -> Result<()> {
        let validator = CoreValidator::default()
            .require_subject("alice")
            .check_subject(Regex::new("^a")?);

        validate(&validator, &Payload::new().with_subject("alice"))?;

        let err = validate(&validator, &Payload::new().with_subject("anne")).unwrap_err();
        assert!(matches!(err, ClaimsRejected::ClaimMismatch("sub")));

        let only_pattern = CoreValidator::default().check_subject(Regex::new("^Al.ri$")?);
        validate(&only_pattern, &Payload::new().with_subject("Aliri"))?;
        let err = validate(&only_pattern, &Payload::new()).unwrap_err();
        assert!(matches!(err, ClaimsRejected::ClaimMissing("sub")));

        Ok(())
    }

    #[test]
    fn jwt_id_checks() {
        let validator = CoreValidator::default().require_jwt_id("id-7");
        validate(&validator, &Payload::new().with_jwt_id("id-7")).unwrap();

        let err = validate(&validator, &Payload::new().with_jwt_id("id-8")).unwrap_err();
        assert!(matches!(err, ClaimsRejected::ClaimMismatch("jti")));
    }
}
