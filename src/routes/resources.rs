//! Hotel-owned resource route handlers
//!
//! The guard has already confirmed ownership by the time these run.

use crate::users::Principal;
use axum::{extract::Path, Json};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceAccess {
    pub success: bool,
    pub resource: &'static str,
    pub id: String,
    pub hotel_id: Option<String>,
}

/// GET /api/v1/bills/{billId}
pub async fn get_bill(principal: Principal, Path(bill_id): Path<String>) -> Json<ResourceAccess> {
    Json(ResourceAccess {
        success: true,
        resource: "bill",
        id: bill_id,
        hotel_id: principal.hotel_id,
    })
}

/// GET /api/v1/tables/{tableId}
pub async fn get_table(principal: Principal, Path(table_id): Path<String>) -> Json<ResourceAccess> {
    Json(ResourceAccess {
        success: true,
        resource: "table",
        id: table_id,
        hotel_id: principal.hotel_id,
    })
}
