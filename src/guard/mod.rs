//! Access guard
//!
//! Axum middleware that authenticates requests and enforces role, approval,
//! membership and hotel-ownership rules. Each step either forwards the request
//! once or returns a single `AppError`; nothing responds early on its own.
//!
//! Layer order on a route (outermost first): `protect`, then any of
//! `attach_hotel_id`, `super_admin_only`, `validate_ownership`.

mod ownership;
mod token;

pub use ownership::{validate_ownership, Ownership, OwnershipGuard};
pub use token::extract_token;

use crate::auth::Role;
use crate::error::AppError;
use crate::state::{AppState, SharedState};
use crate::users::Principal;
use axum::{
    body::Body,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

/// Largest body `attach_hotel_id` will buffer
const MAX_SCOPE_BODY_BYTES: usize = 1024 * 1024;

/// Authenticate the request and attach its `Principal`
pub async fn protect(
    State(state): State<SharedState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(request.headers(), &state.auth.cookie_name)
        .ok_or_else(|| AppError::NotAuthorized("Not authorized, no token".to_string()))?;

    let principal = authenticate(&state, &token)
        .await
        .inspect_err(|e| debug!(kind = e.kind(), path = %request.uri().path(), "authentication rejected"))?;

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// Token verification, principal lookup and standing checks, in that order
pub async fn authenticate(state: &AppState, token: &str) -> Result<Principal, AppError> {
    let subject = state.codec.verify(token)?;

    let principal = state
        .resolver
        .resolve(&subject)
        .await
        .map_err(|e| match e {
            AppError::NotFound(_) => AppError::NotAuthorized("User not found".to_string()),
            other => other,
        })?;

    check_standing(&principal, Utc::now())?;
    Ok(principal)
}

/// Approval, then membership for hotel owners
pub fn check_standing(principal: &Principal, now: DateTime<Utc>) -> Result<(), AppError> {
    if !principal.is_approved {
        return Err(AppError::NotApproved("User not approved".to_string()));
    }

    if principal.role == Role::HotelOwner
        && !principal.membership_expires.is_some_and(|expires| expires >= now)
    {
        return Err(AppError::MembershipExpired("Membership expired".to_string()));
    }

    Ok(())
}

#[derive(Deserialize)]
struct HotelScope {
    #[serde(rename = "hotelId")]
    hotel_id: Option<String>,
}

/// SuperAdmins must name the hotel they act on in the JSON body.
/// Hotel owners keep their own hotel.
pub async fn attach_hotel_id(request: Request, next: Next) -> Result<Response, AppError> {
    let mut principal = current_principal(request.extensions())?;

    if principal.role != Role::SuperAdmin {
        return Ok(next.run(request).await);
    }

    let (mut parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, MAX_SCOPE_BODY_BYTES)
        .await
        .map_err(|_| AppError::BadRequest("Request body could not be read".to_string()))?;

    let hotel_id = serde_json::from_slice::<HotelScope>(&bytes)
        .ok()
        .and_then(|scope| scope.hotel_id)
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| {
            debug!(principal = %principal.id, "super admin request without hotelId");
            AppError::BadRequest(
                "Hotel ID is required for super admin role to access hotel resources".to_string(),
            )
        })?;

    principal.hotel_id = Some(hotel_id);
    parts.extensions.insert(principal);

    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}

/// Role gate for platform-only routes
pub async fn super_admin_only(request: Request, next: Next) -> Result<Response, AppError> {
    let principal = current_principal(request.extensions())?;

    if principal.role != Role::SuperAdmin {
        debug!(principal = %principal.id, role = %principal.role, "super admin gate rejected");
        return Err(AppError::Forbidden(
            "Access denied. SuperAdmin only.".to_string(),
        ));
    }

    Ok(next.run(request).await)
}

fn current_principal(extensions: &axum::http::Extensions) -> Result<Principal, AppError> {
    extensions
        .get::<Principal>()
        .cloned()
        .ok_or_else(|| AppError::NotAuthorized("Not authorized, no token".to_string()))
}

/// Handlers behind `protect` take the principal as an extractor
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current_principal(&parts.extensions)
    }
}
