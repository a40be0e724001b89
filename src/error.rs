use rocket::http::Status;
use rocket::response::{self, status::Custom, Responder};
use rocket::serde::json::{json, Json};
use rocket::Request;
use thiserror::Error;
use tracing::error;

use crate::repository::StoreError;

pub const ALREADY_BID_MESSAGE: &str = "you have already bid on this job..";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("could not sign token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("token signing secret is not configured")]
    MissingSecret,
    #[error("{}", ALREADY_BID_MESSAGE)]
    AlreadyBid,
}

pub type ApiResult<T> = Result<Json<T>, ApiError>;

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        let (status, message) = match self {
            ApiError::AlreadyBid => (Status::BadRequest, ALREADY_BID_MESSAGE.to_string()),
            other => {
                error!(method = %request.method(), uri = %request.uri(), error = %other, "request failed");
                (Status::InternalServerError, "internal server error".to_string())
            }
        };
        Custom(status, Json(json!({ "message": message }))).respond_to(request)
    }
}
