use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};

use crate::domain::access::{Principal, Role};
use crate::error::AppError;

// Set by the gateway after it has authenticated the caller.
pub const PRINCIPAL_ID_HEADER: &str = "X-Principal-Id";
pub const PRINCIPAL_ROLE_HEADER: &str = "X-Principal-Role";
pub const CATERER_ACCOUNT_ID_HEADER: &str = "X-Caterer-Account-Id";

fn header<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
    req.headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn principal_from(req: &HttpRequest) -> Result<Principal, AppError> {
    let id = header(req, PRINCIPAL_ID_HEADER)
        .and_then(|value| value.parse::<i64>().ok())
        .ok_or(AppError::Unauthenticated)?;
    let role = header(req, PRINCIPAL_ROLE_HEADER)
        .and_then(|value| value.parse::<Role>().ok())
        .ok_or(AppError::Unauthenticated)?;
    let caterer_account_id = header(req, CATERER_ACCOUNT_ID_HEADER)
        .map(|value| value.parse::<i64>().map_err(|_| AppError::Unauthenticated))
        .transpose()?;

    Ok(Principal { id, role, caterer_account_id })
}

impl FromRequest for Principal {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = principal_from(req);
        if let Err(error) = &result {
            tracing::debug!(path = %req.path(), error = %error, "Rejected request without principal");
        }
        ready(result)
    }
}
