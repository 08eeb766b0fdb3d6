use jsonwebtoken::{DecodingKey, EncodingKey};

use crate::config::AppConfig;
use crate::db::{DbPool, OrmConn};

/// Token signing and verification keys, built once at startup.
#[derive(Clone)]
pub struct AuthKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
}

impl AuthKeys {
    pub fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub auth: AuthKeys,
    pub config: AppConfig,
}
