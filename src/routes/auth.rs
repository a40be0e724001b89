use rocket::http::{Cookie, CookieJar, SameSite};
use rocket::serde::json::{json, Json, Value};
use rocket::time::Duration;
use rocket::State;
use serde_json::Map;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::jwt::jwt_helper::{create_token, TOKEN_LIFETIME_HOURS};
use crate::services::identity::{AuthSettings, TOKEN_COOKIE};

/// Signs the posted body into a token and hands it back as an httpOnly cookie.
#[post("/jwt", format = "json", data = "<payload>")]
pub async fn issue_token(
    settings: &State<AuthSettings>,
    cookies: &CookieJar<'_>,
    payload: Json<Map<String, Value>>,
) -> ApiResult<Value> {
    let secret = settings.secret.as_deref().ok_or(ApiError::MissingSecret)?;
    let payload = payload.into_inner();
    let subject = payload
        .get("email")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();
    let token = create_token(payload, secret.as_bytes())?;

    // not `secure`: the cookie has to survive plain-http development setups
    let cookie = Cookie::build((TOKEN_COOKIE, token))
        .http_only(true)
        .secure(false)
        .same_site(SameSite::Strict)
        .max_age(Duration::hours(TOKEN_LIFETIME_HOURS));
    cookies.add(cookie);

    info!(user = %subject, "token issued");
    Ok(Json(json!({ "status": "success" })))
}

#[get("/clear-jwt")]
pub fn clear_token(cookies: &CookieJar<'_>) -> Json<Value> {
    cookies.remove(Cookie::build(TOKEN_COOKIE).same_site(SameSite::Strict));
    Json(json!({ "message": "token cleared" }))
}
