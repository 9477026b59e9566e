use crate::auth::auth::AuthUser;
use crate::engine::stats::{StatusFilter, TypeCounts, Window, aggregate};
use crate::engine::{MirrorOutcome, RequestService};
use crate::error::EngineError;
use crate::model::request::{Decision, NewRequest, Request, RequestStatus};
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct RequestFilter {
    #[schema(example = 1000)]
    /// Filter by owning employee (organization view only)
    pub employee_id: Option<u64>,
    #[schema(example = "pending")]
    /// Filter by request status
    pub status: Option<RequestStatus>,
    #[schema(example = 2026)]
    /// Year the request occurs in
    pub year: Option<i32>,
    #[schema(example = 1)]
    /// Month the request occurs in (requires year)
    pub month: Option<u32>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct RequestListResponse {
    pub data: Vec<Request>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: usize,
}

#[derive(Serialize, ToSchema)]
pub struct RequestResponse {
    #[schema(example = "Request approved")]
    pub message: String,
    pub request: Request,
    /// false when the specialized ledger could not be updated
    #[schema(example = true)]
    pub mirrored: bool,
}

#[derive(Deserialize, ToSchema)]
pub struct RejectBody {
    #[schema(example = "Team already short staffed that week")]
    pub reason: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct StatsQuery {
    #[schema(example = 2025)]
    pub year: i32,
    #[schema(example = 9)]
    pub month: Option<u32>,
    #[schema(example = "approved")]
    /// all | approved | pending
    pub status: Option<StatusFilter>,
}

#[derive(Serialize, ToSchema)]
pub struct StatsResponse {
    #[schema(example = 2025)]
    pub year: i32,
    #[schema(example = 9)]
    pub month: Option<u32>,
    pub counts: TypeCounts,
}

fn window(year: Option<i32>, month: Option<u32>) -> Result<Option<Window>, EngineError> {
    match (year, month) {
        (_, Some(m)) if !(1..=12).contains(&m) => {
            Err(EngineError::Invalid("month must be between 1 and 12".to_string()))
        }
        (None, Some(_)) => Err(EngineError::Invalid("month requires a year".to_string())),
        (Some(y), None) => Ok(Some(Window::year(y))),
        (Some(y), Some(m)) => Ok(Some(Window::month(y, m))),
        (None, None) => Ok(None),
    }
}

fn list_response(
    requests: Vec<Request>,
    query: &RequestFilter,
) -> Result<RequestListResponse, EngineError> {
    let window = window(query.year, query.month)?;

    let matching: Vec<Request> = requests
        .into_iter()
        .filter(|r| window.is_none_or(|w| w.contains(r.occurs_on)))
        .filter(|r| query.status.is_none_or(|s| r.status == s))
        .collect();

    // -------------------------
    // Pagination
    // -------------------------
    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
    // page is reported back as u32, so it cannot go past that either
    let page = query.page.unwrap_or(1).clamp(1, u64::from(u32::MAX));
    let offset = usize::try_from((page - 1) * per_page).unwrap_or(usize::MAX);

    let total = matching.len();
    let data = matching
        .into_iter()
        .skip(offset)
        .take(per_page as usize)
        .collect();

    Ok(RequestListResponse {
        data,
        page: page as u32,
        per_page: per_page as u32,
        total,
    })
}

fn decided(message: &str, request: Request, mirror: &MirrorOutcome) -> HttpResponse {
    HttpResponse::Ok().json(RequestResponse {
        message: message.to_string(),
        request,
        mirrored: !mirror.is_failed(),
    })
}

/// The caller's own requests
#[utoipa::path(
    get,
    path = "/api/requests",
    params(RequestFilter),
    responses(
        (status = 200, description = "Paginated request list", body = RequestListResponse),
        (status = 400, description = "Invalid filter"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Request"
)]
pub async fn list_own(
    auth: AuthUser,
    service: web::Data<RequestService>,
    query: web::Query<RequestFilter>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;

    let requests = service.reconcile(Some(employee_id)).await?;
    let response = list_response(requests, &query)?;

    Ok(HttpResponse::Ok().json(response))
}

/// Every employee's requests (HR/Admin)
#[utoipa::path(
    get,
    path = "/api/requests/organization",
    params(RequestFilter),
    responses(
        (status = 200, description = "Paginated request list", body = RequestListResponse),
        (status = 400, description = "Invalid filter"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Request"
)]
pub async fn list_organization(
    auth: AuthUser,
    service: web::Data<RequestService>,
    query: web::Query<RequestFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    debug!(employee_id = ?query.employee_id, "Listing organization requests");
    let requests = service.reconcile(query.employee_id).await?;
    let response = list_response(requests, &query)?;

    Ok(HttpResponse::Ok().json(response))
}

/// Submit a request for the caller
#[utoipa::path(
    post,
    path = "/api/requests",
    request_body(
        content = NewRequest,
        description = "Request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Request submitted", body = RequestResponse),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Request"
)]
pub async fn submit(
    auth: AuthUser,
    service: web::Data<RequestService>,
    payload: web::Json<NewRequest>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;

    let outcome = service.submit(employee_id, payload.into_inner()).await?;
    if outcome.mirror.is_failed() {
        warn!(
            id = %outcome.request.id,
            mirror = ?outcome.mirror,
            "Submitted without specialized row"
        );
    }

    Ok(decided("Request submitted", outcome.request, &outcome.mirror))
}

async fn decide(
    auth: AuthUser,
    service: web::Data<RequestService>,
    id: String,
    decision: Decision,
    reason: Option<String>,
) -> actix_web::Result<HttpResponse> {
    auth.require_hr_or_admin()?;
    let reviewer = auth.require_employee()?;

    let outcome = service.transition(&id, decision, reviewer, reason).await?;
    info!(
        id = %id,
        user_id = auth.user_id,
        username = %auth.username,
        decision = %decision,
        "Request decided"
    );
    let message = match decision {
        Decision::Approved => "Request approved",
        Decision::Rejected => "Request rejected",
    };

    Ok(decided(message, outcome.request, &outcome.mirror))
}

/// Approve a request (HR/Admin)
#[utoipa::path(
    put,
    path = "/api/requests/{request_id}/approve",
    params(
        ("request_id" = String, Path, description = "ID of the request to approve")
    ),
    responses(
        (status = 200, description = "Request approved", body = RequestResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Request not found", body = Object, example = json!({
            "message": "request 5f1c9a52 not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Request"
)]
pub async fn approve(
    auth: AuthUser,
    service: web::Data<RequestService>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    decide(auth, service, path.into_inner(), Decision::Approved, None).await
}

/// Reject a request (HR/Admin)
#[utoipa::path(
    put,
    path = "/api/requests/{request_id}/reject",
    params(
        ("request_id" = String, Path, description = "ID of the request to reject")
    ),
    request_body = RejectBody,
    responses(
        (status = 200, description = "Request rejected", body = RequestResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Request"
)]
pub async fn reject(
    auth: AuthUser,
    service: web::Data<RequestService>,
    path: web::Path<String>,
    body: Option<web::Json<RejectBody>>,
) -> actix_web::Result<impl Responder> {
    let reason = body.and_then(|b| b.into_inner().reason);
    decide(auth, service, path.into_inner(), Decision::Rejected, reason).await
}

/// Per-type counts for a year or month
#[utoipa::path(
    get,
    path = "/api/requests/stats",
    params(StatsQuery),
    responses(
        (status = 200, description = "Counts per request type", body = StatsResponse),
        (status = 400, description = "Invalid window"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Request"
)]
pub async fn stats(
    auth: AuthUser,
    service: web::Data<RequestService>,
    query: web::Query<StatsQuery>,
) -> actix_web::Result<impl Responder> {
    let owner = if auth.role.is_reviewer() {
        None
    } else {
        Some(auth.require_employee()?)
    };

    let window = window(Some(query.year), query.month)?
        .ok_or_else(|| EngineError::Invalid("year is required".to_string()))?;

    let requests = service.reconcile(owner).await?;
    let counts = aggregate(&requests, window, query.status.unwrap_or_default());
    debug!(owner = ?owner, total = counts.total(), "Stats computed");

    Ok(HttpResponse::Ok().json(StatsResponse {
        year: query.year,
        month: query.month,
        counts,
    }))
}
