//! JWT-backed session tokens.

use chrono::{TimeDelta, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use quill_core::ports::{AuthError, IssuedSession, SessionClaims, SessionTokenService};

const DEFAULT_SECRET: &str = "change-me-in-production";

/// Session token configuration.
#[derive(Debug, Clone)]
pub struct JwtSessionConfig {
    pub secret: String,
    pub issuer: String,
    /// Lifetime of an ordinary session.
    pub session_hours: i64,
    /// Lifetime of a "remember me" session.
    pub remember_days: i64,
}

impl Default for JwtSessionConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_SECRET.to_string(),
            issuer: "quill".to_string(),
            session_hours: 24,
            remember_days: 365,
        }
    }
}

impl JwtSessionConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let secret = std::env::var("SESSION_SECRET").unwrap_or(defaults.secret);

        if secret == DEFAULT_SECRET {
            let is_production = std::env::var("RUST_ENV")
                .map(|v| v == "production" || v == "prod")
                .unwrap_or(false);

            if is_production {
                tracing::error!(
                    "SECURITY: Using default session secret in production! Set SESSION_SECRET."
                );
            } else {
                tracing::warn!("Using default session secret. Set SESSION_SECRET for production use.");
            }
        }

        Self {
            secret,
            issuer: std::env::var("SESSION_ISSUER").unwrap_or(defaults.issuer),
            session_hours: std::env::var("SESSION_HOURS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.session_hours),
            remember_days: std::env::var("SESSION_REMEMBER_DAYS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.remember_days),
        }
    }

    fn lifetime(&self, remember: bool) -> TimeDelta {
        if remember {
            TimeDelta::days(self.remember_days)
        } else {
            TimeDelta::hours(self.session_hours)
        }
    }
}

/// Wire form of the session claims.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String, // user_id
    rem: bool,
    exp: i64,
    iat: i64,
    iss: String,
}

/// HS256-signed session tokens.
pub struct JwtSessionService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    config: JwtSessionConfig,
}

impl JwtSessionService {
    pub fn new(config: JwtSessionConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            encoding_key,
            decoding_key,
            config,
        }
    }

    pub fn from_env() -> Self {
        Self::new(JwtSessionConfig::from_env())
    }
}

impl SessionTokenService for JwtSessionService {
    fn issue(&self, user_id: Uuid, remember: bool) -> Result<IssuedSession, AuthError> {
        let now = Utc::now();
        let expires_at = now + self.config.lifetime(remember);

        let claims = Claims {
            sub: user_id.to_string(),
            rem: remember,
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        Ok(IssuedSession {
            token,
            remember,
            expires_at,
        })
    }

    fn validate(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.config.issuer]);
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(e.to_string()),
            }
        })?;

        let user_id = Uuid::parse_str(&token_data.claims.sub)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        Ok(SessionClaims {
            user_id,
            remember: token_data.claims.rem,
            issued_at: token_data.claims.iat,
            expires_at: token_data.claims.exp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> JwtSessionConfig {
        JwtSessionConfig {
            secret: "test-secret-key".to_string(),
            issuer: "test-issuer".to_string(),
            session_hours: 1,
            remember_days: 30,
        }
    }

    #[test]
    fn test_issue_and_validate() {
        let service = JwtSessionService::new(test_config());
        let user_id = Uuid::new_v4();

        let session = service.issue(user_id, false).unwrap();
        assert!(!session.token.is_empty());

        let claims = service.validate(&session.token).unwrap();
        assert_eq!(claims.user_id, user_id);
        assert!(!claims.remember);
        assert_eq!(claims.expires_at - claims.issued_at, 3600);
    }

    #[test]
    fn test_remember_extends_lifetime() {
        let service = JwtSessionService::new(test_config());

        let short = service.issue(Uuid::new_v4(), false).unwrap();
        let long = service.issue(Uuid::new_v4(), true).unwrap();

        assert!(long.remember);
        assert!(long.expires_at - short.expires_at > TimeDelta::days(29));
        assert!(service.validate(&long.token).unwrap().remember);
    }

    #[test]
    fn test_garbage_token_is_invalid() {
        let service = JwtSessionService::new(test_config());

        let result = service.validate("invalid-token");
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_tampered_token_is_invalid() {
        let service = JwtSessionService::new(test_config());
        let victim = service.issue(Uuid::new_v4(), false).unwrap().token;
        let attacker = service.issue(Uuid::new_v4(), false).unwrap().token;

        // victim's claims under attacker's signature
        let (victim_body, _) = victim.rsplit_once('.').unwrap();
        let (_, attacker_sig) = attacker.rsplit_once('.').unwrap();
        let token = format!("{victim_body}.{attacker_sig}");

        assert!(matches!(
            service.validate(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_other_secret_is_rejected() {
        let issuer = JwtSessionService::new(test_config());
        let verifier = JwtSessionService::new(JwtSessionConfig {
            secret: "another-secret".to_string(),
            ..test_config()
        });

        let token = issuer.issue(Uuid::new_v4(), false).unwrap().token;
        assert!(verifier.validate(&token).is_err());
    }

    #[test]
    fn test_wrong_issuer_is_rejected() {
        let issuer = JwtSessionService::new(JwtSessionConfig {
            issuer: "issuer1".to_string(),
            ..test_config()
        });
        let verifier = JwtSessionService::new(JwtSessionConfig {
            issuer: "issuer2".to_string(),
            ..test_config()
        });

        let token = issuer.issue(Uuid::new_v4(), false).unwrap().token;
        assert!(verifier.validate(&token).is_err());
    }

    #[test]
    fn test_expired_token_reports_expiry() {
        let service = JwtSessionService::new(JwtSessionConfig {
            session_hours: -1,
            ..test_config()
        });

        let token = service.issue(Uuid::new_v4(), false).unwrap().token;
        assert!(matches!(
            service.validate(&token),
            Err(AuthError::TokenExpired)
        ));
    }
}
