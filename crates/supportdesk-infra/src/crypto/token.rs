//! HS256 bearer tokens.
//!
//! Implements the `TokenCodec` port from `supportdesk-core`. Tokens carry the
//! user id as `sub`, the configured issuer as `iss`, and `iat`/`exp` in Unix
//! seconds. Expiry is reported separately from every other failure so the
//! HTTP layer can tell the two apart.

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use supportdesk_core::service::credential::TokenCodec;
use supportdesk_types::error::{AuthError, TokenRejection};
use supportdesk_types::user::UserId;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iss: String,
    iat: i64,
    exp: i64,
}

pub struct JwtTokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    issuer: String,
    ttl_secs: u64,
}

impl JwtTokenCodec {
    /// Build a codec from a shared secret. The secret must be non-empty;
    /// config loading enforces that before this is called.
    pub fn new(secret: &str, ttl_secs: u64, issuer: impl Into<String>) -> Self {
        let issuer = issuer.into();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            issuer,
            ttl_secs,
        }
    }

    fn encode_claims(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AuthError::Credential(format!("token signing failed: {e}")))
    }
}

impl TokenCodec for JwtTokenCodec {
    fn issue(&self, user_id: &UserId) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        self.encode_claims(&Claims {
            sub: user_id.to_string(),
            iss: self.issuer.clone(),
            iat: now,
            exp: now.saturating_add(i64::try_from(self.ttl_secs).unwrap_or(i64::MAX)),
        })
    }

    fn verify(&self, token: &str) -> Result<UserId, TokenRejection> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenRejection::Expired,
                _ => TokenRejection::Malformed,
            }
        })?;

        data.claims
            .sub
            .parse()
            .map_err(|_| TokenRejection::Malformed)
    }
}
