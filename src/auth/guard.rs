use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::Request;
use serde_json::{json, Value};

use crate::config::AppConfig;

use super::verify_token;

/// The authenticated caller, decoded from the bearer token. Every protected
/// handler takes this as a guard and scopes its queries by `user_id`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

/// Why the auth gate rejected a request; read back by the 401 catcher so the
/// two outcomes produce distinct messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthFailure {
    #[default]
    MissingToken,
    InvalidToken,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthUser {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let auth_span = tracing::info_span!("bearer_auth_guard");
        let _guard = auth_span.enter();

        let config = match request.rocket().state::<AppConfig>() {
            Some(config) => config,
            _ => {
                tracing::error!("App config not found in managed state");
                return Outcome::Error((Status::InternalServerError, ()));
            }
        };

        let token = request
            .headers()
            .get_one("Authorization")
            .and_then(|header| header.strip_prefix("Bearer "));

        match token {
            Some(token) => match verify_token(token, &config.secret_key) {
                Ok(claims) => {
                    tracing::info!(user_id = %claims.sub, "User authenticated via bearer token");
                    Outcome::Success(AuthUser {
                        user_id: claims.sub,
                    })
                }
                Err(err) => {
                    tracing::warn!(error = %err, "Invalid or expired bearer token");
                    request.local_cache(|| AuthFailure::InvalidToken);
                    Outcome::Error((Status::Unauthorized, ()))
                }
            },
            _ => {
                tracing::warn!("Request without authentication token");
                request.local_cache(|| AuthFailure::MissingToken);
                Outcome::Error((Status::Unauthorized, ()))
            }
        }
    }
}

#[catch(401)]
pub fn unauthorized_api(req: &Request) -> Custom<Json<Value>> {
    let message = match req.local_cache(AuthFailure::default) {
        AuthFailure::MissingToken => "Missing authentication token.",
        AuthFailure::InvalidToken => "Invalid or expired token.",
    };

    Custom(Status::Unauthorized, Json(json!({ "error": message })))
}
