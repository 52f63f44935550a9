use rocket::{
    fairing::{Fairing, Info, Kind},
    http::Header,
    Request, Response,
};

use crate::config::AppConfig;

/// Restricts cross-origin access to the single configured frontend origin.
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "CORS headers",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        let Some(config) = request.rocket().state::<AppConfig>() else {
            return;
        };

        response.set_header(Header::new(
            "Access-Control-Allow-Origin",
            config.allowed_origin.clone(),
        ));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "GET, POST, PUT, DELETE, OPTIONS",
        ));
        response.set_header(Header::new(
            "Access-Control-Allow-Headers",
            "Authorization, Content-Type",
        ));
    }
}

/// Preflight requests match this for every path; the fairing above fills in
/// the headers.
#[options("/<_..>")]
pub fn all_options() {}
