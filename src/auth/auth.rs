use crate::auth::jwt::verify_access_token;
use crate::config::Config;
use crate::model::role::Role;
use actix_web::{
    FromRequest, HttpMessage, HttpRequest, HttpResponse, dev::Payload, error::InternalError,
    http::StatusCode, web::Data,
};
use futures::future::{Ready, ready};
use serde_json::json;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

/// Error with the `{"message": ...}` body every endpoint answers with.
pub(crate) fn denied(status: StatusCode, message: &str) -> actix_web::Error {
    let body = HttpResponse::build(status).json(json!({ "message": message }));
    InternalError::from_response(message.to_string(), body).into()
}

fn authenticate(req: &HttpRequest) -> Result<AuthUser, actix_web::Error> {
    // set by the middleware on protected scopes
    if let Some(user) = req.extensions().get::<AuthUser>() {
        return Ok(user.clone());
    }

    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| denied(StatusCode::UNAUTHORIZED, "Missing token"))?;

    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| denied(StatusCode::INTERNAL_SERVER_ERROR, "Config missing"))?;

    let claims = verify_access_token(token, &config.jwt_secret)
        .map_err(|_| denied(StatusCode::UNAUTHORIZED, "Invalid token"))?;

    let role = Role::from_id(claims.role)
        .ok_or_else(|| denied(StatusCode::UNAUTHORIZED, "Invalid role"))?;

    Ok(AuthUser {
        user_id: claims.user_id,
        username: claims.sub,
        role,
        employee_id: claims.employee_id,
    })
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

impl AuthUser {
    pub fn require_hr_or_admin(&self) -> actix_web::Result<()> {
        if self.role.is_reviewer() {
            Ok(())
        } else {
            Err(denied(StatusCode::FORBIDDEN, "HR/Admin only"))
        }
    }

    /// The caller's employee id; requests are always owned by an employee.
    pub fn require_employee(&self) -> actix_web::Result<u64> {
        self.employee_id.ok_or_else(|| denied(StatusCode::FORBIDDEN, "No employee profile"))
    }
}
