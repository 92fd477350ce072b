use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Argon2, Params};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};

// Argon2id, OWASP minimum profile
const ARGON2_M_COST: u32 = 19456; // 19 MiB
const ARGON2_T_COST: u32 = 2;
const ARGON2_P_COST: u32 = 1;

/// Leeway applied to `exp` when validating bearer tokens.
const TOKEN_LEEWAY_SECS: u64 = 60;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
    iat: i64,
}

fn argon2() -> Result<Argon2<'static>, argon2::password_hash::Error> {
    let params = Params::new(ARGON2_M_COST, ARGON2_T_COST, ARGON2_P_COST, None)
        .map_err(argon2::password_hash::Error::from)?;
    Ok(Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        params,
    ))
}

/// Salted one-way hash in PHC string format. Member passwords go through
/// this before they reach the store.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2()?.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed = PasswordHash::new(hash)?;
    Ok(argon2()?
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Issues an HS256 token for `subject`, valid for `ttl`.
pub fn generate_token(
    subject: &str,
    secret: &str,
    ttl: Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: subject.to_string(),
        exp: (now + ttl).timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Returns the token subject when the signature and expiry check out.
pub fn validate_token(token: &str, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = TOKEN_LEEWAY_SECS;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;
    Ok(data.claims.sub)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password_is_argon2id_and_not_plaintext() {
        let hash = hash_password("password1").unwrap();
        assert_ne!(hash, "password1");
        assert!(hash.starts_with("$argon2id$"));
    }

    #[test]
    fn test_same_password_produces_different_hashes() {
        let hash1 = hash_password("same_password").unwrap();
        let hash2 = hash_password("same_password").unwrap();
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_verify_password() {
        let hash = hash_password("correct_password").unwrap();
        assert!(verify_password("correct_password", &hash).unwrap());
        assert!(!verify_password("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_invalid_hash_format() {
        assert!(verify_password("password", "not_a_valid_hash").is_err());
    }

    #[test]
    fn test_token_round_trip() {
        let token = generate_token("operator-1", "secret", Duration::hours(1)).unwrap();
        assert_eq!(token.split('.').count(), 3);
        assert_eq!(validate_token(&token, "secret").unwrap(), "operator-1");
    }

    #[test]
    fn test_validate_token_rejects_wrong_secret() {
        let token = generate_token("operator-1", "right", Duration::hours(1)).unwrap();
        assert!(validate_token(&token, "wrong").is_err());
    }

    #[test]
    fn test_validate_token_rejects_garbage() {
        assert!(validate_token("invalid.token.here", "secret").is_err());
    }

    #[test]
    fn test_validate_token_rejects_expired_token() {
        let token = generate_token("operator-1", "secret", Duration::hours(-2)).unwrap();
        assert!(validate_token(&token, "secret").is_err());
    }
}
