use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Duration, OffsetDateTime};

use crate::core::config::Settings;

#[derive(Debug, Error)]
pub(crate) enum SecurityError {
    #[error("jwt encoding failed")]
    JwtEncoding,
    #[error("jwt decoding failed")]
    JwtDecoding,
    #[error("unsupported jwt algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

/// Claims carried by the identity token presented at sign-in. The identity
/// service signs these with the shared secret; we only ever verify.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct IdTokenClaims {
    pub(crate) sub: String,
    pub(crate) email: String,
    #[serde(default)]
    pub(crate) name: Option<String>,
    pub(crate) exp: i64,
}

/// Claims minted into the session cookie after sign-in. Role is captured at
/// session creation from the admin allow-list and stays fixed for the
/// lifetime of the cookie.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SessionClaims {
    pub(crate) sub: String,
    pub(crate) email: String,
    pub(crate) role: String,
    pub(crate) exp: i64,
}

pub(crate) fn verify_id_token(
    token: &str,
    settings: &Settings,
) -> Result<IdTokenClaims, SecurityError> {
    let algorithm = algorithm_from_settings(settings)?;
    let mut validation = Validation::new(algorithm);
    validation.validate_exp = true;
    validation.required_spec_claims.insert("exp".to_string());
    validation.required_spec_claims.insert("sub".to_string());

    decode::<IdTokenClaims>(
        token,
        &DecodingKey::from_secret(settings.security().secret_key.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| SecurityError::JwtDecoding)
}

pub(crate) fn create_session_token(
    subject: &str,
    email: &str,
    role: &str,
    settings: &Settings,
    expires_in: Duration,
) -> Result<String, SecurityError> {
    let algorithm = algorithm_from_settings(settings)?;
    let expire = OffsetDateTime::now_utc() + expires_in;

    let claims = SessionClaims {
        sub: subject.to_string(),
        email: email.to_string(),
        role: role.to_string(),
        exp: expire.unix_timestamp(),
    };

    encode(
        &jsonwebtoken::Header::new(algorithm),
        &claims,
        &EncodingKey::from_secret(settings.security().secret_key.as_bytes()),
    )
    .map_err(|_| SecurityError::JwtEncoding)
}

pub(crate) fn verify_session_token(
    token: &str,
    settings: &Settings,
) -> Result<SessionClaims, SecurityError> {
    let algorithm = algorithm_from_settings(settings)?;
    let mut validation = Validation::new(algorithm);
    validation.validate_exp = true;
    validation.required_spec_claims.insert("exp".to_string());
    validation.required_spec_claims.insert("sub".to_string());

    decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(settings.security().secret_key.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| SecurityError::JwtDecoding)
}

fn algorithm_from_settings(settings: &Settings) -> Result<Algorithm, SecurityError> {
    match settings.security().algorithm.as_str() {
        "HS256" => Ok(Algorithm::HS256),
        other => Err(SecurityError::UnsupportedAlgorithm(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::test_support;

    fn test_settings() -> Settings {
        let _guard = test_support::env_lock();
        std::env::set_var("SECRET_KEY", "test-secret");
        Settings::load().expect("settings")
    }

    #[test]
    fn session_token_roundtrip() {
        let settings = test_settings();

        let token = create_session_token(
            "user-123",
            "student@example.com",
            "student",
            &settings,
            Duration::minutes(5),
        )
        .expect("token");
        let claims = verify_session_token(&token, &settings).expect("claims");

        assert_eq!(claims.sub, "user-123");
        assert_eq!(claims.email, "student@example.com");
        assert_eq!(claims.role, "student");
    }

    #[test]
    fn expired_session_token_rejected() {
        let settings = test_settings();

        let token = create_session_token(
            "user-123",
            "student@example.com",
            "student",
            &settings,
            Duration::minutes(-5),
        )
        .expect("token");

        assert!(verify_session_token(&token, &settings).is_err());
    }

    #[test]
    fn id_token_roundtrip_via_session_secret() {
        let settings = test_settings();

        // Identity tokens share the signing secret with session tokens.
        let claims = IdTokenClaims {
            sub: "ext-42".to_string(),
            email: "new@example.com".to_string(),
            name: Some("New Student".to_string()),
            exp: (OffsetDateTime::now_utc() + Duration::minutes(5)).unix_timestamp(),
        };
        let token = encode(
            &jsonwebtoken::Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(settings.security().secret_key.as_bytes()),
        )
        .expect("encode");

        let verified = verify_id_token(&token, &settings).expect("verify");
        assert_eq!(verified.sub, "ext-42");
        assert_eq!(verified.email, "new@example.com");
    }

    #[test]
    fn garbage_token_rejected() {
        let settings = test_settings();
        assert!(verify_session_token("not-a-jwt", &settings).is_err());
        assert!(verify_id_token("not-a-jwt", &settings).is_err());
    }
}
