use crate::api::request::{
    RejectBody, RequestFilter, RequestListResponse, RequestResponse, StatsQuery, StatsResponse,
};
use crate::engine::stats::{StatusFilter, TypeCounts};
use crate::model::person::{OrgUnit, Person};
use crate::model::request::{NewRequest, Request, RequestStatus, RequestType};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Absence Ledger API",
        version = "1.0.0",
        description = r#"
## Absence Ledger

Employee absence events (planned time-off, early departure, lateness and
unplanned absence) and their approval workflow.

### Key Features
- **Reconciled timeline**
  - One de-duplicated list per employee or for the whole organization,
    newest first, merged from the generic and the three specialized ledgers
- **Approval workflow**
  - Approve or reject any request; the decision is mirrored into the
    specialized ledger when one exists
- **Dashboard counts**
  - Per-type counts for a year or month, optionally by status

### Security
Every endpoint requires a **JWT Bearer** access token. Organization-wide
views and decisions are limited to **Admin** and **HR**.
"#,
    ),
    paths(
        crate::api::request::list_own,
        crate::api::request::list_organization,
        crate::api::request::submit,
        crate::api::request::approve,
        crate::api::request::reject,
        crate::api::request::stats,
    ),
    components(
        schemas(
            Request,
            RequestType,
            RequestStatus,
            NewRequest,
            Person,
            OrgUnit,
            RequestFilter,
            RequestListResponse,
            RequestResponse,
            RejectBody,
            StatsQuery,
            StatsResponse,
            StatusFilter,
            TypeCounts
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Request", description = "Absence request APIs"),
    )
)]
pub struct ApiDoc;
