use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::Header;
use rocket::{Request, Response};

/// Adds CORS headers to every response. Without a configured origin any
/// origin is allowed, with one only that origin is, and with credentials.
pub struct Cors {
    allowed_origin: Option<String>,
}

impl Cors {
    pub fn new(allowed_origin: Option<String>) -> Self {
        Cors { allowed_origin }
    }
}

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        match &self.allowed_origin {
            Some(origin) => {
                response.set_header(Header::new("Access-Control-Allow-Origin", origin.clone()));
                response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
                response.set_header(Header::new("Vary", "Origin"));
            }
            None => {
                response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
            }
        }
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "POST, GET, PUT, PATCH, DELETE, OPTIONS",
        ));
        response.set_header(Header::new(
            "Access-Control-Allow-Headers",
            "Content-Type, Authorization",
        ));
    }
}
