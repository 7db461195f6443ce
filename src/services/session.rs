//! Wallet sessions as HS256 JWTs
//!
//! Wallet-signature verification happens in the external auth collaborator;
//! this service only issues and validates the bearer tokens it hands back,
//! with the verified wallet address as the `sub` claim.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// A verified session: the wallet address the bearer token was issued for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub address: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Wallet address (0x format)
    sub: String,
    /// Expiration time (UTC Unix timestamp)
    exp: i64,
    /// Issued-at time (UTC Unix timestamp)
    iat: i64,
}

#[derive(Clone)]
pub struct Sessions {
    secret: String,
}

impl Sessions {
    pub fn new(secret: String) -> Self {
        Self { secret }
    }

    /// Issue a bearer token for a wallet address the auth collaborator has
    /// already verified
    pub fn issue(
        &self,
        address: &str,
        ttl_hours: i64,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: address.to_string(),
            exp: now + ttl_hours * 3600,
            iat: now,
        };

        encode(
            &Header::default(), // HS256
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
    }

    /// Validate an `Authorization: Bearer ...` header value. Missing, malformed
    /// and expired tokens all read as "no session".
    pub fn verify(&self, authorization: Option<&str>) -> Option<Session> {
        let token = authorization?.strip_prefix("Bearer ")?;

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(), // HS256, validates exp
        )
        .ok()?;

        Some(Session {
            address: token_data.claims.sub,
        })
    }
}
