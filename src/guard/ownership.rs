//! Hotel ownership checks for resource routes

use crate::auth::Role;
use crate::error::AppError;
use crate::resources::{resource_id_param, resource_name_from_path};
use crate::state::SharedState;
use axum::{
    extract::{rejection::RawPathParamsRejection, OriginalUri, RawPathParams, Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

/// Which registered resource a route serves
#[derive(Debug, Clone)]
pub enum Ownership {
    /// Registered resource name, e.g. `"bill"`
    Named(String),
    /// Taken from the `/api/v1/<resources>/...` path segment
    FromPath,
}

impl Ownership {
    pub fn of(name: &str) -> Self {
        Ownership::Named(name.to_string())
    }

    pub fn from_path() -> Self {
        Ownership::FromPath
    }
}

/// State for `validate_ownership`
#[derive(Clone)]
pub struct OwnershipGuard {
    pub app: SharedState,
    pub target: Ownership,
}

impl OwnershipGuard {
    pub fn new(app: SharedState, target: Ownership) -> Self {
        Self { app, target }
    }
}

/// Reject hotel owners acting on another hotel's resource.
/// SuperAdmins are not checked.
pub async fn validate_ownership(
    State(guard): State<OwnershipGuard>,
    params: Result<RawPathParams, RawPathParamsRejection>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let principal = request
        .extensions()
        .get::<crate::users::Principal>()
        .cloned()
        .ok_or_else(|| AppError::NotAuthorized("Not authorized, no token".to_string()))?;

    if principal.role == Role::SuperAdmin {
        return Ok(next.run(request).await);
    }

    let name = match &guard.target {
        Ownership::Named(name) => name.to_ascii_lowercase(),
        Ownership::FromPath => {
            let path = request
                .extensions()
                .get::<OriginalUri>()
                .map(|uri| uri.path().to_string())
                .unwrap_or_else(|| request.uri().path().to_string());
            resource_name_from_path(&path)
                .ok_or_else(|| AppError::BadRequest(format!("Invalid resource: {}", path)))?
        }
    };

    let resource_id = params
        .ok()
        .and_then(|params| resource_id_param(params.iter()).map(str::to_string))
        .ok_or_else(|| AppError::BadRequest("Resource ID not provided".to_string()))?;

    let lookup = guard
        .app
        .resources
        .get(&name)
        .ok_or_else(|| AppError::BadRequest(format!("Invalid resource: {}", name)))?;

    let owner = tokio::time::timeout(guard.app.auth.lookup_timeout, lookup.hotel_id_of(&resource_id))
        .await
        .map_err(|_| AppError::Internal(format!("{} lookup timed out", name)))??
        .ok_or_else(|| AppError::NotFound(format!("{} not found", name)))?;

    if principal.hotel_id.as_deref() != Some(owner.as_str()) {
        debug!(
            principal = %principal.id,
            resource = %name,
            resource_id = %resource_id,
            "ownership check rejected"
        );
        return Err(AppError::Forbidden(
            "Access denied. This resource does not belong to your hotel.".to_string(),
        ));
    }

    Ok(next.run(request).await)
}
