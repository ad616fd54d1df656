//! Authentication route handlers
//!
//! Login, logout and current-principal endpoints, plus the hotel-scope and
//! admin lookups that sit behind the guard.

use crate::auth::Role;
use crate::error::{ApiResult, AppError};
use crate::state::SharedState;
use crate::users::{Principal, UserRecord};
use axum::{
    extract::{Path, State},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use validator::Validate;

// ============================================
// Request/Response Types
// ============================================

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub user: Principal,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub success: bool,
    pub user: Principal,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HotelOwnerResponse {
    pub success: bool,
    pub user: UserRecord,
}

// ============================================
// Route Handlers
// ============================================

/// POST /api/v1/auth/login
///
/// Check credentials, issue a token and set it as the auth cookie.
pub async fn login(
    State(state): State<SharedState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> ApiResult<(CookieJar, Json<LoginResponse>)> {
    req.validate()?;

    let invalid = || AppError::NotAuthorized("Invalid email or password".to_string());

    let user = state
        .credentials
        .find_by_email(req.role, &req.email)
        .await?
        .ok_or_else(invalid)?;

    if !user.match_password(&req.password)? {
        debug!(user = %user.id, "login rejected: wrong password");
        return Err(invalid());
    }

    let token = state.codec.issue(&user.id, user.role)?;
    let cookie = Cookie::build((state.auth.cookie_name.clone(), token.clone()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Strict);

    info!(user = %user.id, role = %user.role, "login succeeded");

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            success: true,
            token,
            user: Principal::from(user),
        }),
    ))
}

/// POST /api/v1/auth/logout
pub async fn logout(
    State(state): State<SharedState>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    // Always emitted, even when the request carried no cookie.
    let mut cookie = Cookie::build((state.auth.cookie_name.clone(), ""))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Strict)
        .build();
    cookie.make_removal();

    (
        jar.add(cookie),
        Json(MessageResponse {
            success: true,
            message: "Logged out".to_string(),
        }),
    )
}

/// GET /api/v1/auth/me
pub async fn me(principal: Principal) -> Json<MeResponse> {
    Json(MeResponse {
        success: true,
        user: principal,
    })
}

/// POST /api/v1/hotels/scope
///
/// Echoes the principal after `attach_hotel_id` has applied the hotel scope.
pub async fn hotel_scope(principal: Principal) -> Json<MeResponse> {
    Json(MeResponse {
        success: true,
        user: principal,
    })
}

/// GET /api/v1/admin/hotel-owners/{ownerId}
pub async fn get_hotel_owner(
    State(state): State<SharedState>,
    Path(owner_id): Path<String>,
) -> ApiResult<Json<HotelOwnerResponse>> {
    let user = state
        .credentials
        .find_by_id(Role::HotelOwner, &owner_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Hotel owner not found".to_string()))?;

    Ok(Json(HotelOwnerResponse {
        success: true,
        user,
    }))
}
