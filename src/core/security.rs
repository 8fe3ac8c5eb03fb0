use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use thiserror::Error;
use time::{Duration, PrimitiveDateTime};

use crate::core::config::SecuritySettings;

const ARGON2_MEMORY_KIB: u32 = 102_400;
const ARGON2_TIME: u32 = 2;
const ARGON2_PARALLELISM: u32 = 8;

const AUTH_TOKEN_BYTES: usize = 32;

#[derive(Debug, Error)]
pub(crate) enum SecurityError {
    #[error("password hashing failed")]
    Hashing,
    #[error("password verification failed")]
    Verification,
}

fn argon2() -> Result<Argon2<'static>, argon2::Error> {
    let params = argon2::Params::new(ARGON2_MEMORY_KIB, ARGON2_TIME, ARGON2_PARALLELISM, None)?;
    Ok(Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params))
}

pub(crate) fn hash_password(password: &str) -> Result<String, SecurityError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = argon2().map_err(|_| SecurityError::Hashing)?;

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| SecurityError::Hashing)?
        .to_string();

    Ok(hash)
}

pub(crate) fn verify_password(password: &str, hash: &str) -> Result<bool, SecurityError> {
    let parsed = PasswordHash::new(hash).map_err(|_| SecurityError::Verification)?;
    let argon2 = argon2().map_err(|_| SecurityError::Verification)?;

    match argon2.verify_password(password.as_bytes(), &parsed) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(_) => Err(SecurityError::Verification),
    }
}

/// Opaque bearer token handed to the client. Only its hash is persisted.
pub(crate) fn generate_auth_token() -> String {
    let mut bytes = [0u8; AUTH_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

pub(crate) fn hash_auth_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

pub(crate) fn token_lifetime(settings: &SecuritySettings, keep_logged_in: bool) -> Duration {
    if keep_logged_in {
        Duration::days(settings.remember_ttl_days)
    } else {
        Duration::days(settings.token_ttl_days)
    }
}

pub(crate) fn token_expiry(
    now: PrimitiveDateTime,
    settings: &SecuritySettings,
    keep_logged_in: bool,
) -> PrimitiveDateTime {
    now + token_lifetime(settings, keep_logged_in)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn security_settings() -> SecuritySettings {
        SecuritySettings {
            token_ttl_days: 7,
            remember_ttl_days: 30,
            cookie_secure: false,
            auth_rate_limit: 10,
            auth_rate_window_seconds: 60,
        }
    }

    #[test]
    fn password_hash_roundtrip() {
        let hash = hash_password("correct-horse-battery-staple").expect("hash");
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct-horse-battery-staple", &hash).unwrap());
        assert!(!verify_password("wrong-password", &hash).unwrap());
    }

    #[test]
    fn verify_rejects_plaintext_stored_value() {
        assert!(verify_password("secret", "secret").is_err());
    }

    #[test]
    fn auth_tokens_are_unique_and_url_safe() {
        let first = generate_auth_token();
        let second = generate_auth_token();
        assert_ne!(first, second);
        assert_eq!(first.len(), 43);
        assert!(first.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn auth_token_hash_is_stable_hex() {
        let hash = hash_auth_token("abc");
        assert_eq!(hash, "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
        assert_eq!(hash_auth_token("abc"), hash);
    }

    #[test]
    fn token_expiry_honours_keep_logged_in() {
        let settings = security_settings();
        let now = datetime!(2025-01-01 12:00:00);
        assert_eq!(token_expiry(now, &settings, false), datetime!(2025-01-08 12:00:00));
        assert_eq!(token_expiry(now, &settings, true), datetime!(2025-01-31 12:00:00));
    }
}
