//! Shared fixtures for guard and route tests

use crate::auth::{Claims, Role};
use crate::config::AuthConfig;
use crate::resources::{MemoryResourceStore, ResourceRegistry};
use crate::state::{AppState, SharedState};
use crate::users::{CredentialStore, MemoryCredentialStore, UserRecord};
use axum::response::Response;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

pub(crate) const HOTEL_A: &str = "64b7f0c2a1e4b3d5f6a7b8c9";
pub(crate) const HOTEL_B: &str = "64b7f0c2a1e4b3d5f6a7b8d0";
pub(crate) const PASSWORD: &str = "s3cure-pass";

pub(crate) struct Fixture {
    pub state: SharedState,
    pub users: Arc<MemoryCredentialStore>,
    pub bills: Arc<MemoryResourceStore>,
    pub tables: Arc<MemoryResourceStore>,
}

impl Fixture {
    pub async fn new() -> Self {
        let users = Arc::new(MemoryCredentialStore::new());
        let bills = Arc::new(MemoryResourceStore::new());
        let tables = Arc::new(MemoryResourceStore::new());

        let resources = ResourceRegistry::new()
            .register("bill", bills.clone())
            .register("table", tables.clone());

        let state = Arc::new(AppState::new(
            AuthConfig::with_secret("test-secret"),
            users.clone(),
            resources,
        ));

        Self {
            state,
            users,
            bills,
            tables,
        }
    }

    pub async fn owner(
        &self,
        hotel_id: &str,
        approved: bool,
        membership_expires: Option<DateTime<Utc>>,
    ) -> UserRecord {
        let email = format!("owner-{}@example.com", uuid::Uuid::new_v4().simple());
        let mut user = UserRecord::new("Owner", &email, PASSWORD, Role::HotelOwner).unwrap();
        user.hotel_id = Some(hotel_id.to_string());
        user.is_approved = approved;
        user.membership_expires = membership_expires;
        self.users.insert(user).await.unwrap()
    }

    pub async fn admin(&self) -> UserRecord {
        let email = format!("admin-{}@example.com", uuid::Uuid::new_v4().simple());
        let mut user = UserRecord::new("Admin", &email, PASSWORD, Role::SuperAdmin).unwrap();
        user.is_approved = true;
        self.users.insert(user).await.unwrap()
    }

    pub fn token_for(&self, user: &UserRecord) -> String {
        self.state.codec.issue(&user.id, user.role).unwrap()
    }

    pub fn expired_token_for(&self, user: &UserRecord) -> String {
        let past = Utc::now() - Duration::minutes(5);
        let claims = Claims {
            sub: user.id.clone(),
            role: Some(user.role.to_string()),
            iat: (past - Duration::days(30)).timestamp(),
            exp: past.timestamp(),
        };
        self.state.codec.sign(&claims).unwrap()
    }
}

pub(crate) async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
