use crate::{api::request, auth::middleware::auth_middleware, config::Config};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{Scope, middleware::from_fn, web};

// Helper to build per-scope limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        60_000 / requests_per_min as u64
    };
    let cfg = GovernorConfigBuilder::default()
        .milliseconds_per_request(per_ms.max(1))
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("rate limiter period and burst are non-zero");
    Governor::new(&cfg)
}

pub fn requests_scope() -> Scope {
    web::scope("/requests")
        // /requests
        .service(
            web::resource("")
                .route(web::get().to(request::list_own))
                .route(web::post().to(request::submit)),
        )
        // /requests/organization
        .service(
            web::resource("/organization").route(web::get().to(request::list_organization)),
        )
        // /requests/stats
        .service(web::resource("/stats").route(web::get().to(request::stats)))
        // /requests/{id}/approve
        .service(web::resource("/{id}/approve").route(web::put().to(request::approve)))
        // /requests/{id}/reject
        .service(web::resource("/{id}/reject").route(web::put().to(request::reject)))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let protected_limiter = build_limiter(config.rate_protected_per_min);

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(requests_scope()),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::testing::token;
    use crate::config::test_config;
    use crate::engine::testing::Harness;
    use crate::models::TokenType;
    use actix_web::body::MessageBody;
    use actix_web::dev::ServiceResponse;
    use actix_web::{App, http::StatusCode, test, web::Data};
    use serde_json::Value;
    use std::net::SocketAddr;

    const EMPLOYEE: u8 = 3;

    fn peer() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    macro_rules! app {
        ($harness:expr) => {
            test::init_service(
                App::new()
                    .app_data(Data::new(test_config()))
                    .app_data(Data::new($harness.service.clone()))
                    .configure(|cfg| configure(cfg, test_config())),
            )
            .await
        };
    }

    async fn unauthorized_message<B: MessageBody>(resp: ServiceResponse<B>) -> String {
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(resp).await;
        body["message"].as_str().unwrap().to_string()
    }

    #[actix_web::test]
    async fn missing_header_is_rejected_with_message() {
        let harness = Harness::with_rows(vec![], vec![], vec![], vec![]);
        let app = app!(harness);

        let req = test::TestRequest::get()
            .uri("/api/requests")
            .peer_addr(peer())
            .to_request();

        assert_eq!(
            unauthorized_message(test::call_service(&app, req).await).await,
            "Missing Authorization header"
        );
    }

    #[actix_web::test]
    async fn non_bearer_header_is_rejected_with_message() {
        let harness = Harness::with_rows(vec![], vec![], vec![], vec![]);
        let app = app!(harness);

        let req = test::TestRequest::get()
            .uri("/api/requests")
            .peer_addr(peer())
            .insert_header(("Authorization", "Basic dXNlcjpwYXNz"))
            .to_request();

        assert_eq!(
            unauthorized_message(test::call_service(&app, req).await).await,
            "Authorization header must start with Bearer"
        );
    }

    #[actix_web::test]
    async fn refresh_token_is_rejected_with_message() {
        let harness = Harness::with_rows(vec![], vec![], vec![], vec![]);
        let app = app!(harness);

        let refresh = token(EMPLOYEE, Some(1), TokenType::Refresh);
        let req = test::TestRequest::get()
            .uri("/api/requests")
            .peer_addr(peer())
            .insert_header(("Authorization", format!("Bearer {}", refresh)))
            .to_request();

        assert_eq!(
            unauthorized_message(test::call_service(&app, req).await).await,
            "Invalid or expired token"
        );
    }

    #[actix_web::test]
    async fn access_token_reaches_the_handler() {
        let harness = Harness::with_rows(vec![], vec![], vec![], vec![]);
        let app = app!(harness);

        let access = token(EMPLOYEE, Some(1), TokenType::Access);
        let req = test::TestRequest::get()
            .uri("/api/requests")
            .peer_addr(peer())
            .insert_header(("Authorization", format!("Bearer {}", access)))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["total"], 0);
    }
}
