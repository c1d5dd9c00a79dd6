use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

pub const MIN_SECRET_LENGTH: usize = 32;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub issuer: String,
    pub token_expiry_days: i64,
    pub leeway_seconds: u64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            issuer: "academy".into(),
            token_expiry_days: 7,
            leeway_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iss: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

impl Claims {
    pub fn new(user_id: Uuid, issuer: &str, issued_at: DateTime<Utc>, expiry: DateTime<Utc>) -> Self {
        Self {
            sub: user_id.to_string(),
            iss: issuer.to_string(),
            exp: expiry.timestamp(),
            iat: issued_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("Malformed token")]
    Malformed,
    #[error("Invalid token signature")]
    BadSignature,
    #[error("Token expired")]
    Expired,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenSetupError {
    #[error("JWT secret must be at least {MIN_SECRET_LENGTH} characters")]
    SecretTooShort,
    #[error("Failed to encode token: {0}")]
    Encode(#[from] jsonwebtoken::errors::Error),
}

/// Issues and verifies stateless session tokens. Tokens carry only the user
/// id; there is no revocation list, so a token stays valid until `exp` even if
/// the user is deleted or demoted (the auth gate re-reads the user per request).
pub struct TokenService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenService {
    pub fn new(config: JwtConfig, secret: &str) -> Result<Self, TokenSetupError> {
        if secret.len() < MIN_SECRET_LENGTH {
            return Err(TokenSetupError::SecretTooShort);
        }

        Ok(Self {
            config,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        })
    }

    pub fn from_secret(secret: &str) -> Result<Self, TokenSetupError> {
        Self::new(JwtConfig::default(), secret)
    }

    pub fn issue(&self, user_id: Uuid) -> Result<String, TokenSetupError> {
        let now = Utc::now();
        let expiry = now + Duration::days(self.config.token_expiry_days);
        self.encode_claims(&Claims::new(user_id, &self.config.issuer, now, expiry))
    }

    fn encode_claims(&self, claims: &Claims) -> Result<String, TokenSetupError> {
        let header = Header::new(Algorithm::HS256);
        Ok(encode(&header, claims, &self.encoding_key)?)
    }

    pub fn verify(&self, token: &str) -> Result<Uuid, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iss"]);
        validation.leeway = self.config.leeway_seconds;

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            debug!("Token rejected: {e}");
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                _ => TokenError::Malformed,
            }
        })?;

        Uuid::parse_str(&data.claims.sub).map_err(|_| TokenError::Malformed)
    }

    pub fn config(&self) -> &JwtConfig {
        &self.config
    }
}

pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .or_else(|| auth_header.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "this-is-a-very-long-secret-key-for-testing-purposes-only";

    fn create_test_service() -> TokenService {
        TokenService::from_secret(SECRET).expect("Failed to create token service")
    }

    #[test]
    fn test_issue_and_verify() {
        let service = create_test_service();
        let user_id = Uuid::new_v4();

        let token = service.issue(user_id).expect("Failed to issue");
        assert_eq!(service.verify(&token), Ok(user_id));
    }

    #[test]
    fn test_short_secret_rejected() {
        assert!(matches!(
            TokenService::from_secret("short"),
            Err(TokenSetupError::SecretTooShort)
        ));
    }

    #[test]
    fn test_expired_token_with_valid_signature() {
        let service = create_test_service();
        let issued = Utc::now() - Duration::days(8);
        let claims = Claims::new(Uuid::new_v4(), "academy", issued, issued + Duration::days(7));
        let token = service.encode_claims(&claims).expect("encode");

        assert_eq!(service.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_bad_signature() {
        let service = create_test_service();
        let other = TokenService::from_secret("another-very-long-secret-key-used-to-sign-tokens")
            .expect("other service");
        let token = other.issue(Uuid::new_v4()).expect("issue");

        assert_eq!(service.verify(&token), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_malformed_token() {
        let service = create_test_service();
        assert_eq!(service.verify("invalid.token.here"), Err(TokenError::Malformed));
        assert_eq!(service.verify(""), Err(TokenError::Malformed));
    }

    #[test]
    fn test_wrong_issuer_is_rejected() {
        let service = create_test_service();
        let now = Utc::now();
        let claims = Claims::new(Uuid::new_v4(), "someone-else", now, now + Duration::days(1));
        let token = service.encode_claims(&claims).expect("encode");

        assert_eq!(service.verify(&token), Err(TokenError::Malformed));
    }

    #[test]
    fn test_expiry_is_seven_days() {
        let service = create_test_service();
        let token = service.issue(Uuid::new_v4()).expect("issue");

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&["academy"]);
        let data = decode::<Claims>(&token, &DecodingKey::from_secret(SECRET.as_bytes()), &validation)
            .expect("decode");
        assert_eq!(data.claims.exp - data.claims.iat, 7 * 24 * 60 * 60);
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("Basic abc123"), None);
    }
}
