//! JWT token issuing and verification.
//!
//! Tokens are HS256-signed and carry the subject, role, and issue/expiry
//! timestamps. The issued string is prefixed with [`BEARER_PREFIX`] so the
//! carrier can recognize and strip it uniformly.

use base64::{Engine, engine::general_purpose::STANDARD};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::auth::BEARER_PREFIX;
use crate::db::UserRole;

/// Default token lifetime: 60 minutes
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(60 * 60);

/// Minimum decoded signing secret length (256 bits for HS256).
pub const MIN_SECRET_BYTES: usize = 32;

/// JWT claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,
    /// User role
    #[serde(rename = "auth")]
    pub role: UserRole,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Result of issuing a token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Prefixed token string, e.g. `Bearer eyJ...`
    pub token: String,
    /// Issued at timestamp (Unix seconds)
    pub issued_at: u64,
    /// Expiration timestamp (Unix seconds)
    pub expires_at: u64,
    /// Token duration in seconds
    pub duration: u64,
}

/// Source of the current time for issuing and expiry checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Clock frozen at a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub SystemTime);

impl Clock for FixedClock {
    fn now(&self) -> SystemTime {
        self.0
    }
}

/// Signing key, algorithm and token lifetime.
#[derive(Clone)]
pub struct JwtConfig {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl JwtConfig {
    /// Create a new JWT configuration with the given (already decoded) secret.
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock used for `iat`/`exp` and expiry checks.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn now_secs(&self) -> Result<u64, JwtError> {
        self.clock
            .now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .map_err(|_| JwtError::TimeError)
    }

    /// Issue a signed token for a user.
    pub fn issue(&self, subject: &str, role: UserRole) -> Result<IssuedToken, JwtError> {
        let now = self.now_secs()?;
        let duration = self.ttl.as_secs();
        let exp = now.checked_add(duration).ok_or(JwtError::TimeError)?;

        let claims = Claims {
            sub: subject.to_string(),
            role,
            iat: now,
            exp,
        };

        let body = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(JwtError::Encoding)?;

        Ok(IssuedToken {
            token: format!("{}{}", BEARER_PREFIX, body),
            issued_at: now,
            expires_at: exp,
            duration,
        })
    }

    /// Validate and decode a token body (without the scheme prefix).
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        if token.trim().is_empty() {
            return Err(JwtError::EmptyOrInvalidClaims);
        }

        // Expiry is checked below against our own clock.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        // Anything past the header is signed, so a JSON failure below is a
        // claims problem rather than a malformed token.
        jsonwebtoken::decode_header(token).map_err(|_| JwtError::Malformed)?;

        let claims = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(JwtError::from_decode)?
            .claims;

        if claims.sub.is_empty() {
            return Err(JwtError::EmptyOrInvalidClaims);
        }

        if self.now_secs()? >= claims.exp {
            return Err(JwtError::Expired);
        }

        Ok(claims)
    }
}

/// Decode the base64 signing secret supplied at startup.
pub fn decode_signing_secret(encoded: &str) -> Result<Vec<u8>, KeyError> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(KeyError::InvalidBase64)?;

    if bytes.len() < MIN_SECRET_BYTES {
        return Err(KeyError::TooShort(bytes.len()));
    }

    Ok(bytes)
}

/// Errors that can occur during JWT operations.
#[derive(Debug)]
pub enum JwtError {
    /// Error encoding the token
    Encoding(jsonwebtoken::errors::Error),
    /// System time error
    TimeError,
    /// Signature does not verify under the signing key
    BadSignature,
    /// Not a structurally valid token
    Malformed,
    /// `exp` is not in the future
    Expired,
    /// Signed with an algorithm other than HS256
    UnsupportedFormat,
    /// Empty token or missing/empty required claims
    EmptyOrInvalidClaims,
}

impl JwtError {
    fn from_decode(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::InvalidSignature => JwtError::BadSignature,
            ErrorKind::ExpiredSignature => JwtError::Expired,
            ErrorKind::InvalidAlgorithm => JwtError::UnsupportedFormat,
            ErrorKind::MissingRequiredClaim(_)
            | ErrorKind::InvalidSubject
            | ErrorKind::Json(_) => JwtError::EmptyOrInvalidClaims,
            _ => JwtError::Malformed,
        }
    }
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::Encoding(e) => write!(f, "Failed to encode token: {}", e),
            JwtError::TimeError => write!(f, "System time error"),
            JwtError::BadSignature => write!(f, "Invalid token signature"),
            JwtError::Malformed => write!(f, "Malformed token"),
            JwtError::Expired => write!(f, "Expired token"),
            JwtError::UnsupportedFormat => write!(f, "Unsupported token format"),
            JwtError::EmptyOrInvalidClaims => write!(f, "Empty or invalid token claims"),
        }
    }
}

impl std::error::Error for JwtError {}

/// Signing secret could not be derived at startup.
#[derive(Debug)]
pub enum KeyError {
    InvalidBase64(base64::DecodeError),
    TooShort(usize),
}

impl std::fmt::Display for KeyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyError::InvalidBase64(e) => write!(f, "JWT secret is not valid base64: {}", e),
            KeyError::TooShort(len) => write!(
                f,
                "JWT secret decodes to {} bytes, at least {} required",
                len, MIN_SECRET_BYTES
            ),
        }
    }
}

impl std::error::Error for KeyError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::strip_bearer;

    const SECRET: &[u8] = b"test-secret-key-for-testing-0123456789";

    fn config() -> JwtConfig {
        JwtConfig::new(SECRET, DEFAULT_TOKEN_TTL)
    }

    fn body(issued: &IssuedToken) -> &str {
        strip_bearer(&issued.token).unwrap()
    }

    #[test]
    fn test_issue_and_verify() {
        let config = config();

        for (subject, role) in [
            ("alice", UserRole::User),
            ("bob", UserRole::Admin),
            ("한글", UserRole::User),
        ] {
            let issued = config.issue(subject, role).unwrap();
            assert!(issued.token.starts_with("Bearer "));

            let claims = config.verify(body(&issued)).unwrap();
            assert_eq!(claims.sub, subject);
            assert_eq!(claims.role, role);
            assert_eq!(claims.iat, issued.issued_at);
            assert_eq!(claims.exp, issued.expires_at);
        }
    }

    #[test]
    fn test_expiry_is_issued_at_plus_ttl() {
        let issued = config().issue("alice", UserRole::User).unwrap();
        assert_eq!(issued.duration, 3600);
        assert_eq!(issued.expires_at - issued.issued_at, 3600);
    }

    #[test]
    fn test_role_claim_key_is_auth() {
        let issued = config().issue("alice", UserRole::User).unwrap();
        let payload = body(&issued).split('.').nth(1).unwrap();
        let json = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(payload)
            .unwrap();
        let json = String::from_utf8(json).unwrap();

        assert!(json.contains(r#""auth":"USER""#), "payload: {}", json);
        assert!(json.contains(r#""sub":"alice""#), "payload: {}", json);
    }

    #[test]
    fn test_strip_then_prefix_reproduces_token() {
        let issued = config().issue("alice", UserRole::User).unwrap();
        let rebuilt = format!("{}{}", BEARER_PREFIX, body(&issued));
        assert_eq!(rebuilt, issued.token);
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let config = config();
        let issued = config.issue("alice", UserRole::User).unwrap();
        let token = body(&issued);
        let sig_start = token.rfind('.').unwrap() + 1;

        // The final character carries padding bits, so only full-sextet
        // positions are guaranteed to change the decoded signature.
        for i in sig_start..token.len() - 1 {
            let mut bytes = token.as_bytes().to_vec();
            bytes[i] = if bytes[i] == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(bytes).unwrap();

            assert!(
                matches!(config.verify(&tampered), Err(JwtError::BadSignature)),
                "position {} accepted",
                i
            );
        }
    }

    #[test]
    fn test_wrong_secret() {
        let config1 = JwtConfig::new(b"secret-1-secret-1-secret-1-secret-1", DEFAULT_TOKEN_TTL);
        let config2 = JwtConfig::new(b"secret-2-secret-2-secret-2-secret-2", DEFAULT_TOKEN_TTL);

        let issued = config1.issue("alice", UserRole::User).unwrap();
        assert!(matches!(
            config2.verify(body(&issued)),
            Err(JwtError::BadSignature)
        ));
    }

    #[test]
    fn test_expired_token() {
        let past = SystemTime::now() - DEFAULT_TOKEN_TTL - Duration::from_secs(1);
        let issuer = config().with_clock(Arc::new(FixedClock(past)));

        let issued = issuer.issue("alice", UserRole::User).unwrap();

        let result = config().verify(body(&issued));
        assert!(matches!(result, Err(JwtError::Expired)));
    }

    #[test]
    fn test_token_expires_exactly_at_exp() {
        let start = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let issued = config()
            .with_clock(Arc::new(FixedClock(start)))
            .issue("alice", UserRole::User)
            .unwrap();

        let just_before = start + DEFAULT_TOKEN_TTL - Duration::from_secs(1);
        let at_exp = start + DEFAULT_TOKEN_TTL;

        assert!(
            config()
                .with_clock(Arc::new(FixedClock(just_before)))
                .verify(body(&issued))
                .is_ok()
        );
        assert!(matches!(
            config()
                .with_clock(Arc::new(FixedClock(at_exp)))
                .verify(body(&issued)),
            Err(JwtError::Expired)
        ));
    }

    #[test]
    fn test_other_algorithm_unsupported() {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let claims = Claims {
            sub: "alice".to_string(),
            role: UserRole::User,
            iat: now,
            exp: now + 60,
        };
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS384),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert!(matches!(
            config().verify(&token),
            Err(JwtError::UnsupportedFormat)
        ));
    }

    #[test]
    fn test_malformed_token() {
        assert!(matches!(
            config().verify("not-a-token"),
            Err(JwtError::Malformed)
        ));
        assert!(matches!(
            config().verify("a.b.c"),
            Err(JwtError::Malformed)
        ));
    }

    #[test]
    fn test_empty_token() {
        assert!(matches!(
            config().verify(""),
            Err(JwtError::EmptyOrInvalidClaims)
        ));
    }

    #[test]
    fn test_ttl_overflow_is_an_error() {
        let config = JwtConfig::new(SECRET, Duration::from_secs(u64::MAX));
        assert!(matches!(
            config.issue("alice", UserRole::User),
            Err(JwtError::TimeError)
        ));
    }

    #[test]
    fn test_signed_token_with_bad_claims() {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let sign = |claims: serde_json::Value| {
            jsonwebtoken::encode(
                &Header::new(Algorithm::HS256),
                &claims,
                &EncodingKey::from_secret(SECRET),
            )
            .unwrap()
        };

        let unknown_role = sign(serde_json::json!({
            "sub": "alice", "auth": "ROOT", "iat": now, "exp": now + 60
        }));
        assert!(matches!(
            config().verify(&unknown_role),
            Err(JwtError::EmptyOrInvalidClaims)
        ));

        let missing_iat = sign(serde_json::json!({
            "sub": "alice", "auth": "USER", "exp": now + 60
        }));
        assert!(matches!(
            config().verify(&missing_iat),
            Err(JwtError::EmptyOrInvalidClaims)
        ));
    }

    #[test]
    fn test_empty_subject_rejected() {
        let issued = config().issue("", UserRole::User).unwrap();
        assert!(matches!(
            config().verify(body(&issued)),
            Err(JwtError::EmptyOrInvalidClaims)
        ));
    }

    #[test]
    fn test_decode_signing_secret() {
        let encoded = STANDARD.encode([7u8; 32]);
        assert_eq!(decode_signing_secret(&encoded).unwrap(), vec![7u8; 32]);
        assert_eq!(
            decode_signing_secret(&format!("  {}\n", encoded)).unwrap(),
            vec![7u8; 32]
        );

        assert!(matches!(
            decode_signing_secret("not base64!"),
            Err(KeyError::InvalidBase64(_))
        ));
        assert!(matches!(
            decode_signing_secret(&STANDARD.encode(b"short")),
            Err(KeyError::TooShort(5))
        ));
    }
}
