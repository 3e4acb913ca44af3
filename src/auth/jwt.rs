use std::time::{SystemTime, UNIX_EPOCH};

use crate::model::role::Role;
use crate::models::Claims;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

fn now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize
}

pub fn generate_access_token(
    user_id: u64,
    email: String,
    role: Role,
    secret: &str,
    ttl: usize,
) -> String {
    let claims = Claims {
        user_id,
        sub: email,
        role,
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn roundtrip_preserves_claims() {
        let token = generate_access_token(42, "a@b.com".into(), Role::Manager, SECRET, 900);
        let claims = verify_token(&token, SECRET).unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.sub, "a@b.com");
        assert_eq!(claims.role, Role::Manager);
        assert!(claims.exp > now());
    }

    #[test]
    fn rejects_wrong_secret() {
        let token = generate_access_token(1, "a@b.com".into(), Role::User, SECRET, 900);
        assert!(verify_token(&token, "other-secret").is_err());
    }

    #[test]
    fn rejects_expired_token() {
        let claims = Claims {
            user_id: 1,
            sub: "a@b.com".into(),
            role: Role::User,
            exp: now() - 3600,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert!(verify_token(&token, SECRET).is_err());
    }

    #[test]
    fn rejects_tampered_token() {
        let token = generate_access_token(1, "a@b.com".into(), Role::User, SECRET, 900);
        let tampered = format!("{}x", token);
        assert!(verify_token(&tampered, SECRET).is_err());
    }
}
