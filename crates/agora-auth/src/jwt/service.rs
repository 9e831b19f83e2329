//! Token issuance and verification.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use agora_core::config::AuthConfig;
use agora_core::result::AppResult;
use agora_core::traits::Clock;
use agora_entity::user::User;

use super::claims::Claims;
use super::duration::parse_duration_secs;
use super::error::TokenError;

/// The single algorithm tokens are signed and accepted with.
const ALGORITHM: Algorithm = Algorithm::HS256;

/// A freshly signed token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Encoded bearer token.
    pub token: String,
    /// When the token stops verifying.
    pub expires_at: DateTime<Utc>,
    /// The signed payload.
    pub claims: Claims,
}

/// Signs and verifies bearer tokens with one fixed HMAC key.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_seconds: i64,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithm", &ALGORITHM)
            .field("ttl_seconds", &self.ttl_seconds)
            .finish()
    }
}

impl TokenService {
    /// Creates a token service from auth configuration.
    pub fn new(config: &AuthConfig, clock: Arc<dyn Clock>) -> AppResult<Self> {
        let ttl_seconds = parse_duration_secs(&config.token_ttl)?;

        // Expiry is checked against the injected clock after the signature.
        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = false;
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            ttl_seconds,
            clock,
        })
    }

    /// Token lifetime in seconds.
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    /// Signs a token for `user` bound to the opaque `session_token`.
    pub fn sign_token(&self, user: &User, session_token: &str) -> Result<IssuedToken, TokenError> {
        let now = self.clock.now().timestamp();
        let claims = Claims {
            sub: user.id,
            role: user.role,
            account_level: user.account_level,
            iat: now,
            exp: now + self.ttl_seconds,
            jti: Uuid::new_v4(),
            sst: session_token.to_string(),
        };

        let token = encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok(IssuedToken {
            token,
            expires_at: claims.expires_at(),
            claims,
        })
    }

    /// Verifies signature and algorithm, then expiry.
    ///
    /// A token that fails both checks reports `SignatureInvalid`; `Expired`
    /// is only returned for tokens this service actually signed.
    pub fn verify_token(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                JwtErrorKind::InvalidSignature | JwtErrorKind::InvalidAlgorithm => {
                    TokenError::SignatureInvalid
                }
                JwtErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed(e.to_string()),
            }
        })?;

        if data.claims.remaining_seconds_at(self.clock.now()) <= 0 {
            return Err(TokenError::Expired);
        }
        Ok(data.claims)
    }

    /// Reads the payload without verifying anything. Diagnostics only.
    pub fn decode_token(&self, token: &str) -> Option<Claims> {
        let payload = token.split('.').nth(1)?;
        let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    /// Whether `token` is within `threshold_seconds` of expiry.
    ///
    /// An authentic but already expired token is due; forged or malformed
    /// tokens never are.
    pub fn should_refresh_token(&self, token: &str, threshold_seconds: i64) -> bool {
        match self.verify_token(token) {
            Ok(claims) => claims.remaining_seconds_at(self.clock.now()) <= threshold_seconds,
            Err(TokenError::Expired) => true,
            Err(_) => false,
        }
    }
}

/// Mints a fresh 256-bit random session token, URL-safe encoded.
pub fn mint_session_token() -> String {
    let bytes: [u8; 32] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// SHA-256 hex digest of a raw session token, as persisted.
pub fn hash_session_token(raw: &str) -> String {
    format!("{:x}", Sha256::digest(raw.as_bytes()))
}
