use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::Error};
use uuid::Uuid;

use crate::{
    model::user::User,
    models::{Claims, TokenType},
};

fn now() -> usize {
    Utc::now().timestamp().max(0) as usize
}

fn issue(user: &User, token_type: TokenType, secret: &str, ttl: usize) -> Result<(String, Claims), Error> {
    let claims = Claims {
        user_id: user.id,
        sub: user.username.clone(),
        role: user.role,
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
        token_type,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok((token, claims))
}

pub fn generate_access_token(user: &User, secret: &str, ttl: usize) -> Result<String, Error> {
    issue(user, TokenType::Access, secret, ttl).map(|(token, _)| token)
}

/// Refresh tokens come back with their claims so the `jti` can be stored.
pub fn generate_refresh_token(user: &User, secret: &str, ttl: usize) -> Result<(String, Claims), Error> {
    issue(user, TokenType::Refresh, secret, ttl)
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

pub fn expires_at(claims: &Claims) -> DateTime<Utc> {
    DateTime::from_timestamp(claims.exp as i64, 0).unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::user::Role;

    fn user() -> User {
        User {
            id: 42,
            username: "staff".into(),
            password: String::new(),
            name: "Staff User".into(),
            email: "staff@plexpay.com".into(),
            role: Role::Staff,
        }
    }

    #[test]
    fn access_token_round_trips_claims() {
        let token = generate_access_token(&user(), "secret", 60).unwrap();
        let claims = verify_token(&token, "secret").unwrap();

        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.sub, "staff");
        assert_eq!(claims.role, Role::Staff);
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[test]
    fn refresh_tokens_get_unique_ids() {
        let (_, a) = generate_refresh_token(&user(), "secret", 60).unwrap();
        let (_, b) = generate_refresh_token(&user(), "secret", 60).unwrap();
        assert_eq!(a.token_type, TokenType::Refresh);
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = generate_access_token(&user(), "secret", 60).unwrap();
        assert!(verify_token(&token, "other").is_err());
    }
}
