use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::Result as JwtResult, DecodingKey, EncodingKey, Header, Validation};
use serde_json::{Map, Value};

use crate::jwt::claims::Claims;

pub const TOKEN_LIFETIME_HOURS: i64 = 1;

pub fn create_token(mut payload: Map<String, Value>, secret: &[u8]) -> JwtResult<String> {
    // the expiry is ours to set
    payload.remove("exp");
    let my_claims = Claims {
        payload,
        exp: (Utc::now() + Duration::hours(TOKEN_LIFETIME_HOURS)).timestamp() as usize,
    };

    encode(&Header::default(), &my_claims, &EncodingKey::from_secret(secret))
}

pub fn verify_token(token: &str, secret: &[u8]) -> JwtResult<Claims> {
    decode::<Claims>(token, &DecodingKey::from_secret(secret), &Validation::default())
        .map(|data| data.claims)
}
