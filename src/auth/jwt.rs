use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};

use crate::models::{Role, TraderId};

/// Claims carried by the bearer token every authenticated request presents.
/// `sub` binds the token to a `TraderId` -- the only fact the core's
/// handlers need to identify the caller; role is carried alongside so the
/// admin-only routes can check it without a database round trip.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: TraderId,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_seconds: i64,
}

impl JwtManager {
    pub fn new(secret: &str, expiry_seconds: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry_seconds,
        }
    }

    pub fn issue(&self, trader_id: TraderId, role: Role) -> anyhow::Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.expiry_seconds);
        let claims = Claims {
            sub: trader_id,
            role,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };
        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let data: TokenData<Claims> = decode(token, &self.decoding_key, &Validation::default())?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_claims() {
        let manager = JwtManager::new("test_secret", 3600);
        let trader_id = TraderId::new();
        let token = manager.issue(trader_id, Role::User).unwrap();
        let claims = manager.verify(&token).unwrap();
        assert_eq!(claims.sub, trader_id);
        assert_eq!(claims.role, Role::User);
    }

    #[test]
    fn rejects_tampered_token() {
        let manager = JwtManager::new("test_secret", 3600);
        let other = JwtManager::new("other_secret", 3600);
        let token = manager.issue(TraderId::new(), Role::Admin).unwrap();
        assert!(other.verify(&token).is_err());
    }
}
