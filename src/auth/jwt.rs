use crate::entity::user::Role;
use crate::model::auth::Claims;
use actix_web::cookie::{Cookie, SameSite};
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation, errors::Error as JwtError};

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";

pub struct JwtUtils {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

pub enum TokenVerifyResult {
    Valid(Claims),
    Expired,
    Invalid,
}

impl JwtUtils {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn generate_token(&self, username: &str, role: Role) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = Claims {
            sub: username.to_string(),
            role,
            exp: (now + self.ttl).timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
    }

    pub fn verify_token(&self, token: &str) -> TokenVerifyResult {
        match decode::<Claims>(token, &self.decoding_key, &Validation::default()) {
            Ok(data) => TokenVerifyResult::Valid(data.claims),
            Err(err) => match *err.kind() {
                ErrorKind::ExpiredSignature => TokenVerifyResult::Expired,
                _ => TokenVerifyResult::Invalid,
            },
        }
    }
}

pub fn build_access_token_cookie(token: &str, ttl: Duration) -> Cookie<'static> {
    Cookie::build(ACCESS_TOKEN_COOKIE, token.to_string())
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(ttl.num_seconds()))
        .finish()
}

pub fn build_logout_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(ACCESS_TOKEN_COOKIE, "")
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .finish();
    cookie.make_removal();
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies_with_same_secret() {
        let jwt = JwtUtils::new("secret", Duration::hours(1));
        let token = jwt.generate_token("alice", Role::User).unwrap();

        match jwt.verify_token(&token) {
            TokenVerifyResult::Valid(claims) => {
                assert_eq!(claims.sub, "alice");
                assert_eq!(claims.role, Role::User);
            }
            _ => panic!("token should be valid"),
        }
    }

    #[test]
    fn token_from_other_secret_is_invalid() {
        let token = JwtUtils::new("one", Duration::hours(1))
            .generate_token("alice", Role::Admin)
            .unwrap();

        let other = JwtUtils::new("two", Duration::hours(1));
        assert!(matches!(other.verify_token(&token), TokenVerifyResult::Invalid));
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        // 기본 leeway(60초)보다 충분히 과거
        let jwt = JwtUtils::new("secret", Duration::hours(-1));
        let token = jwt.generate_token("alice", Role::User).unwrap();

        assert!(matches!(jwt.verify_token(&token), TokenVerifyResult::Expired));
    }
}
