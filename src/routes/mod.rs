pub mod auth;
pub mod bids;
pub mod jobs;

#[cfg(test)]
pub(crate) mod test_support;

use rocket::http::Status;
use rocket::serde::json::{json, Json, Value};
use rocket::{Catcher, Request, Route};

#[get("/")]
fn index() -> &'static str {
    "Hello from SoloSphere Server...."
}

// CORS preflight; the fairing adds the headers
#[options("/<_..>")]
fn all_options() -> Status {
    Status::Ok
}

#[catch(401)]
fn unauthorized() -> Json<Value> {
    Json(json!({ "message": "unauthorized access" }))
}

#[catch(404)]
fn not_found(req: &Request) -> Json<Value> {
    Json(json!({ "message": format!("404: '{}' route not found", req.uri()) }))
}

#[catch(422)]
fn unprocessable(req: &Request) -> Json<Value> {
    Json(json!({ "message": format!("422: could not parse the body of '{}'", req.uri()) }))
}

#[catch(500)]
fn internal_error() -> Json<Value> {
    Json(json!({ "message": "internal server error" }))
}

pub fn routes() -> Vec<Route> {
    routes![
        index,
        all_options,
        jobs::create_job,
        jobs::get_all_jobs,
        jobs::search_jobs,
        jobs::get_job,
        jobs::update_job,
        jobs::get_jobs_by_buyer,
        jobs::delete_job,
        bids::place_bid,
        bids::get_bids_by_bidder,
        bids::get_bid_requests,
        bids::update_bid_status,
        auth::issue_token,
        auth::clear_token,
    ]
}

pub fn catchers() -> Vec<Catcher> {
    catchers![unauthorized, not_found, unprocessable, internal_error]
}
