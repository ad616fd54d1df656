//! Route definitions and router setup
//!
//! Configures all API routes, guard layers and HTTP middleware.

pub mod auth;
pub mod resources;

use crate::config::CorsConfig;
use crate::guard::{
    attach_hotel_id, protect, super_admin_only, validate_ownership, Ownership, OwnershipGuard,
};
use crate::state::SharedState;
use axum::{
    http::{header, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::MakeRequestUuid,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
    ServiceBuilderExt,
};
use tracing::Level;

/// Create the application router with all routes and middleware
pub fn create_router(state: SharedState, cors: &CorsConfig) -> Router {
    let cors = build_cors_layer(cors);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let middleware_stack = ServiceBuilder::new()
        .set_x_request_id(MakeRequestUuid)
        .layer(trace_layer)
        .layer(CompressionLayer::new())
        .layer(cors)
        .propagate_x_request_id();

    let bill_owner = OwnershipGuard::new(state.clone(), Ownership::of("bill"));
    let table_owner = OwnershipGuard::new(state.clone(), Ownership::from_path());

    let protected = Router::new()
        .route("/api/v1/auth/me", get(auth::me))
        .route(
            "/api/v1/hotels/scope",
            post(auth::hotel_scope).route_layer(middleware::from_fn(attach_hotel_id)),
        )
        .route(
            "/api/v1/admin/hotel-owners/{ownerId}",
            get(auth::get_hotel_owner).route_layer(middleware::from_fn(super_admin_only)),
        )
        .route(
            "/api/v1/bills/{billId}",
            get(resources::get_bill)
                .route_layer(middleware::from_fn_with_state(bill_owner, validate_ownership)),
        )
        .route(
            "/api/v1/tables/{tableId}",
            get(resources::get_table)
                .route_layer(middleware::from_fn_with_state(table_owner, validate_ownership)),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), protect));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/logout", post(auth::logout))
        .merge(protected)
        .layer(middleware_stack)
        .with_state(state)
}

/// Build CORS layer from settings
fn build_cors_layer(cors: &CorsConfig) -> CorsLayer {
    let origins: Vec<_> = cors
        .allowed_origins
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .max_age(Duration::from_secs(3600));

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        // Cookies need an explicit origin list.
        layer.allow_origin(origins).allow_credentials(true)
    }
}

/// Health check endpoint
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "success": true,
        "message": "Server is running fine.",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::test_support::{body_json, Fixture, HOTEL_A, HOTEL_B, PASSWORD};
    use axum::{
        body::Body,
        extract::Request,
        http::{header, StatusCode},
    };
    use chrono::{Duration, Utc};
    use tower::ServiceExt;

    fn app(fixture: &Fixture) -> Router {
        create_router(fixture.state.clone(), &CorsConfig::default())
    }

    fn json_post(uri: &str, body: serde_json::Value) -> Request {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn bearer_get(uri: &str, token: &str) -> Request {
        Request::get(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let fixture = Fixture::new().await;
        let resp = app(&fixture)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_login_sets_cookie_usable_by_guard() {
        let fixture = Fixture::new().await;
        let owner = fixture
            .owner(HOTEL_A, true, Some(Utc::now() + Duration::days(365)))
            .await;

        let resp = app(&fixture)
            .oneshot(json_post(
                "/api/v1/auth/login",
                serde_json::json!({ "email": owner.email, "password": PASSWORD, "role": "HotelOwner" }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let set_cookie = resp
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap()
            .to_string();
        assert!(set_cookie.starts_with("authToken="));
        assert!(set_cookie.contains("HttpOnly"));

        let body = body_json(resp).await;
        assert_eq!(body["user"]["id"], owner.id);
        let token = body["token"].as_str().unwrap();
        assert_eq!(
            fixture.state.codec.verify(token).unwrap().role,
            Some(Role::HotelOwner)
        );

        let cookie_pair = set_cookie.split(';').next().unwrap().to_string();
        let resp = app(&fixture)
            .oneshot(
                Request::get("/api/v1/auth/me")
                    .header(header::COOKIE, cookie_pair)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["user"]["hotelId"], HOTEL_A);
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let fixture = Fixture::new().await;
        let owner = fixture.owner(HOTEL_A, true, None).await;

        let attempts = [
            serde_json::json!({ "email": owner.email, "password": "wrong", "role": "HotelOwner" }),
            serde_json::json!({ "email": owner.email, "password": PASSWORD, "role": "SuperAdmin" }),
            serde_json::json!({ "email": "ghost@example.com", "password": PASSWORD, "role": "HotelOwner" }),
        ];
        for attempt in attempts {
            let resp = app(&fixture)
                .oneshot(json_post("/api/v1/auth/login", attempt))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(body_json(resp).await["code"], "NotAuthorizedError");
        }
    }

    #[tokio::test]
    async fn test_login_validates_email() {
        let fixture = Fixture::new().await;
        let resp = app(&fixture)
            .oneshot(json_post(
                "/api/v1/auth/login",
                serde_json::json!({ "email": "not-an-email", "password": "x", "role": "HotelOwner" }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["code"], "ValidationError");
    }

    #[tokio::test]
    async fn test_logout_clears_cookie() {
        let fixture = Fixture::new().await;
        let resp = app(&fixture)
            .oneshot(Request::post("/api/v1/auth/logout").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let set_cookie = resp.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(set_cookie.starts_with("authToken="));
        assert!(set_cookie.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn test_protected_routes_require_token() {
        let fixture = Fixture::new().await;
        for uri in ["/api/v1/auth/me", "/api/v1/bills/b1", "/api/v1/admin/hotel-owners/x"] {
            let resp = app(&fixture)
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_bill_of_other_hotel() {
        let fixture = Fixture::new().await;
        fixture.bills.insert("b-ours", HOTEL_A).await;
        fixture.bills.insert("b-theirs", HOTEL_B).await;
        let owner = fixture
            .owner(HOTEL_A, true, Some(Utc::now() + Duration::days(365)))
            .await;
        let token = fixture.token_for(&owner);

        let resp = app(&fixture)
            .oneshot(bearer_get("/api/v1/bills/b-theirs", &token))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = app(&fixture)
            .oneshot(bearer_get("/api/v1/bills/b-ours", &token))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["resource"], "bill");
        assert_eq!(body["id"], "b-ours");
    }

    #[tokio::test]
    async fn test_table_route_uses_path_resource() {
        let fixture = Fixture::new().await;
        fixture.tables.insert("t-theirs", HOTEL_B).await;
        let owner = fixture
            .owner(HOTEL_A, true, Some(Utc::now() + Duration::days(365)))
            .await;

        let resp = app(&fixture)
            .oneshot(bearer_get("/api/v1/tables/t-theirs", &fixture.token_for(&owner)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_admin_hotel_scope_without_hotel_id() {
        let fixture = Fixture::new().await;
        let admin = fixture.admin().await;

        let mut req = json_post("/api/v1/hotels/scope", serde_json::json!({}));
        req.headers_mut().insert(
            header::AUTHORIZATION,
            format!("Bearer {}", fixture.token_for(&admin)).parse().unwrap(),
        );
        let resp = app(&fixture).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["code"], "BadRequestError");
    }

    #[tokio::test]
    async fn test_admin_fetches_hotel_owner() {
        let fixture = Fixture::new().await;
        let admin = fixture.admin().await;
        let owner = fixture.owner(HOTEL_A, false, None).await;

        let resp = app(&fixture)
            .oneshot(bearer_get(
                &format!("/api/v1/admin/hotel-owners/{}", owner.id),
                &fixture.token_for(&admin),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["user"]["email"], owner.email);
        assert!(body["user"].get("passwordHash").is_none());

        let resp = app(&fixture)
            .oneshot(bearer_get(
                "/api/v1/admin/hotel-owners/missing",
                &fixture.token_for(&admin),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_owner_cannot_use_admin_routes() {
        let fixture = Fixture::new().await;
        let owner = fixture
            .owner(HOTEL_A, true, Some(Utc::now() + Duration::days(365)))
            .await;

        let resp = app(&fixture)
            .oneshot(bearer_get(
                &format!("/api/v1/admin/hotel-owners/{}", owner.id),
                &fixture.token_for(&owner),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }
}
