//! Session tokens.
//!
//! A token is an HS256 JSON Web Token naming the user it was issued to. Tokens
//! are short-lived: every authenticated response carries a new one, so an
//! active client keeps extending its session while an idle one is logged out
//! once `lifetime` has passed.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{Result, CONFIG};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i32,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    lifetime: i64,
}

impl TokenKeys {
    /// `lifetime` is in seconds.
    pub fn new(secret: &[u8], lifetime: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        TokenKeys {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            lifetime,
        }
    }

    pub fn from_config() -> Self {
        TokenKeys::new(CONFIG.jwt_secret.as_bytes(), CONFIG.token_lifetime)
    }

    pub fn issue(&self, user_id: i32) -> Result<String> {
        let iat = Utc::now().timestamp();
        self.sign(&Claims {
            user_id,
            iat,
            exp: iat + self.lifetime,
        })
    }

    pub fn sign(&self, claims: &Claims) -> Result<String> {
        Ok(encode(&Header::new(Algorithm::HS256), claims, &self.encoding)?)
    }

    pub fn verify(&self, token: &str) -> Result<Claims> {
        Ok(decode::<Claims>(token, &self.decoding, &self.validation)?.claims)
    }
}
