//! User management module
//!
//! Credential records for both roles, the request-facing `Principal` view,
//! and the store abstraction the resolver reads from.

use crate::auth::{hash_password, verify_password, PasswordResetToken, Role};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[default]
    M,
    F,
    O,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::M => "M",
            Gender::F => "F",
            Gender::O => "O",
        }
    }
}

impl std::str::FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "M" => Ok(Gender::M),
            "F" => Ok(Gender::F),
            "O" => Ok(Gender::O),
            other => Err(format!("unknown gender: {}", other)),
        }
    }
}

/// One-time passcode issued for e-mail verification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpDetails {
    pub value: Option<i64>,
    pub expiry: Option<DateTime<Utc>>,
}

/// Stored credential record
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub gender: Gender,
    pub logo: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub hotel_id: Option<String>,
    pub is_approved: bool,
    pub is_verified: bool,
    #[serde(skip_serializing)]
    pub otp_details: OtpDetails,
    pub membership_expires: Option<DateTime<Utc>>,
    #[serde(skip_serializing)]
    pub password_reset: Option<PasswordResetToken>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// New, unapproved record. The password is hashed before it is kept.
    pub fn new(name: &str, email: &str, password: &str, role: Role) -> Result<Self, AppError> {
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4().simple().to_string(),
            name: name.to_string(),
            email: email.to_string(),
            phone: None,
            gender: Gender::default(),
            logo: None,
            password_hash: hash_password(password)?,
            role,
            hotel_id: None,
            is_approved: false,
            is_verified: false,
            otp_details: OtpDetails::default(),
            membership_expires: None,
            password_reset: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn match_password(&self, candidate: &str) -> Result<bool, AppError> {
        verify_password(candidate, &self.password_hash)
    }

    /// Replace the password. Any outstanding reset token is consumed.
    pub fn set_password(&mut self, password: &str) -> Result<(), AppError> {
        self.password_hash = hash_password(password)?;
        self.password_reset = None;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Start a password reset, replacing any earlier token. Returns the plain
    /// token to deliver to the user.
    pub fn create_password_reset_token(&mut self) -> String {
        let (plain, stored) = PasswordResetToken::generate(Utc::now());
        self.password_reset = Some(stored);
        plain
    }

    pub fn validate_password_reset_token(&self, candidate: &str) -> bool {
        self.password_reset
            .as_ref()
            .is_some_and(|reset| reset.matches(candidate, Utc::now()))
    }

    pub fn membership_active(&self, now: DateTime<Utc>) -> bool {
        self.membership_expires.is_some_and(|expires| expires >= now)
    }
}

/// Authenticated identity attached to a request. Carries no secrets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub hotel_id: Option<String>,
    pub is_approved: bool,
    pub membership_expires: Option<DateTime<Utc>>,
}

impl From<UserRecord> for Principal {
    fn from(user: UserRecord) -> Self {
        Principal {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            hotel_id: user.hotel_id,
            is_approved: user.is_approved,
            membership_expires: user.membership_expires,
        }
    }
}

/// Role-partitioned credential storage
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_id(&self, role: Role, id: &str) -> Result<Option<UserRecord>, AppError>;

    async fn find_by_email(&self, role: Role, email: &str) -> Result<Option<UserRecord>, AppError>;

    /// Insert a new record; e-mails are unique within a role's collection
    async fn insert(&self, user: UserRecord) -> Result<UserRecord, AppError>;

    /// Overwrite an existing record
    async fn save(&self, user: &UserRecord) -> Result<(), AppError>;
}

#[derive(Default)]
struct Collection {
    users: HashMap<String, UserRecord>,
    email_index: HashMap<String, String>,
}

/// In-memory credential store
pub struct MemoryCredentialStore {
    collections: Arc<RwLock<HashMap<Role, Collection>>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self {
            collections: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for MemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_id(&self, role: Role, id: &str) -> Result<Option<UserRecord>, AppError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&role)
            .and_then(|c| c.users.get(id))
            .cloned())
    }

    async fn find_by_email(&self, role: Role, email: &str) -> Result<Option<UserRecord>, AppError> {
        let collections = self.collections.read().await;
        Ok(collections.get(&role).and_then(|c| {
            c.email_index
                .get(email)
                .and_then(|id| c.users.get(id))
                .cloned()
        }))
    }

    async fn insert(&self, user: UserRecord) -> Result<UserRecord, AppError> {
        let mut collections = self.collections.write().await;
        let collection = collections.entry(user.role).or_default();

        if collection.email_index.contains_key(&user.email) {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        collection
            .email_index
            .insert(user.email.clone(), user.id.clone());
        collection.users.insert(user.id.clone(), user.clone());

        Ok(user)
    }

    async fn save(&self, user: &UserRecord) -> Result<(), AppError> {
        let mut collections = self.collections.write().await;
        let collection = collections
            .get_mut(&user.role)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let previous_email = collection
            .users
            .get(&user.id)
            .map(|existing| existing.email.clone())
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if previous_email != user.email {
            if collection.email_index.contains_key(&user.email) {
                return Err(AppError::Conflict("Email already registered".to_string()));
            }
            collection.email_index.remove(&previous_email);
            collection
                .email_index
                .insert(user.email.clone(), user.id.clone());
        }

        collection.users.insert(user.id.clone(), user.clone());
        Ok(())
    }
}
