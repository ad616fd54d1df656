// Postgres-backed credential store and resource lookups

use super::queries;
use crate::auth::{PasswordResetToken, Role};
use crate::error::AppError;
use crate::resources::ResourceLookup;
use crate::users::{CredentialStore, Gender, OtpDetails, UserRecord};
use async_trait::async_trait;
use deadpool_postgres::Pool;
use once_cell::sync::Lazy;
use regex::Regex;
use tokio_postgres::error::SqlState;
use tokio_postgres::Row;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z_][a-z0-9_]{0,62}$").expect("identifier pattern"));

/// Table names are interpolated into SQL, so only plain identifiers are allowed
pub fn validate_table_name(table: &str) -> Result<(), AppError> {
    if IDENTIFIER.is_match(table) {
        Ok(())
    } else {
        Err(AppError::Internal(format!("Invalid table name: {}", table)))
    }
}

// Credential records, one table per role
pub struct PgCredentialStore {
    pool: Pool,
}

impl PgCredentialStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    async fn query_one_user(
        &self,
        role: Role,
        sql: String,
        key: &str,
    ) -> Result<Option<UserRecord>, AppError> {
        let client = self.pool.get().await?;
        let row = client.query_opt(&sql, &[&key]).await?;
        row.map(|row| row_to_user(&row, role)).transpose()
    }
}

fn row_to_user(row: &Row, role: Role) -> Result<UserRecord, AppError> {
    let gender: String = row.try_get("gender")?;
    let reset_hash: Option<String> = row.try_get("password_reset_token")?;
    let reset_expires = row.try_get("password_reset_expires")?;

    Ok(UserRecord {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        gender: parse_gender(&gender)?,
        logo: row.try_get("logo")?,
        password_hash: row.try_get("password_hash")?,
        role,
        hotel_id: row.try_get("hotel_id")?,
        is_approved: row.try_get("is_approved")?,
        is_verified: row.try_get("is_verified")?,
        otp_details: OtpDetails {
            value: row.try_get("otp_value")?,
            expiry: row.try_get("otp_expiry")?,
        },
        membership_expires: row.try_get("membership_expires")?,
        password_reset: match (reset_hash, reset_expires) {
            (Some(token_hash), Some(expires_at)) => Some(PasswordResetToken {
                token_hash,
                expires_at,
            }),
            _ => None,
        },
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn parse_gender(raw: &str) -> Result<Gender, AppError> {
    raw.trim()
        .parse()
        .map_err(|e| AppError::Internal(format!("Corrupt credential record: {}", e)))
}

fn is_unique_violation(e: &tokio_postgres::Error) -> bool {
    e.code() == Some(&SqlState::UNIQUE_VIOLATION)
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_id(&self, role: Role, id: &str) -> Result<Option<UserRecord>, AppError> {
        self.query_one_user(role, queries::find_user_by_id(role.collection()), id)
            .await
    }

    async fn find_by_email(&self, role: Role, email: &str) -> Result<Option<UserRecord>, AppError> {
        self.query_one_user(role, queries::find_user_by_email(role.collection()), email)
            .await
    }

    async fn insert(&self, user: UserRecord) -> Result<UserRecord, AppError> {
        let client = self.pool.get().await?;
        let reset_hash = user.password_reset.as_ref().map(|r| r.token_hash.clone());
        let reset_expires = user.password_reset.as_ref().map(|r| r.expires_at);

        client
            .execute(
                &queries::insert_user(user.role.collection()),
                &[
                    &user.id,
                    &user.name,
                    &user.email,
                    &user.phone,
                    &user.gender.as_str(),
                    &user.logo,
                    &user.password_hash,
                    &user.hotel_id,
                    &user.is_approved,
                    &user.is_verified,
                    &user.otp_details.value,
                    &user.otp_details.expiry,
                    &user.membership_expires,
                    &reset_hash,
                    &reset_expires,
                    &user.created_at,
                    &user.updated_at,
                ],
            )
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Conflict("Email already registered".to_string())
                } else {
                    AppError::Database(e)
                }
            })?;

        Ok(user)
    }

    async fn save(&self, user: &UserRecord) -> Result<(), AppError> {
        let client = self.pool.get().await?;
        let reset_hash = user.password_reset.as_ref().map(|r| r.token_hash.clone());
        let reset_expires = user.password_reset.as_ref().map(|r| r.expires_at);

        let updated = client
            .execute(
                &queries::update_user(user.role.collection()),
                &[
                    &user.id,
                    &user.name,
                    &user.email,
                    &user.phone,
                    &user.gender.as_str(),
                    &user.logo,
                    &user.password_hash,
                    &user.hotel_id,
                    &user.is_approved,
                    &user.is_verified,
                    &user.otp_details.value,
                    &user.otp_details.expiry,
                    &user.membership_expires,
                    &reset_hash,
                    &reset_expires,
                    &user.updated_at,
                ],
            )
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Conflict("Email already registered".to_string())
                } else {
                    AppError::Database(e)
                }
            })?;

        if updated == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        Ok(())
    }
}

// Hotel owner of a row in a resource table
pub struct PgResourceLookup {
    pool: Pool,
    sql: String,
}

impl PgResourceLookup {
    pub fn new(pool: Pool, table: &str) -> Result<Self, AppError> {
        validate_table_name(table)?;
        Ok(Self {
            pool,
            sql: queries::resource_hotel_id(table),
        })
    }
}

#[async_trait]
impl ResourceLookup for PgResourceLookup {
    async fn hotel_id_of(&self, id: &str) -> Result<Option<String>, AppError> {
        let client = self.pool.get().await?;
        let row = client.query_opt(&self.sql, &[&id]).await?;
        Ok(row
            .map(|row| row.try_get::<_, String>("hotel_id"))
            .transpose()?)
    }
}
