//! SQL query constants and builders
//!
//! Contains all SQL used by the Postgres-backed stores. Credential tables share
//! one layout, one table per role.

/// Columns selected for a credential record, in `row_to_user` order
pub const USER_COLUMNS: &str = "id, name, email, phone, gender, logo, password_hash, hotel_id, \
     is_approved, is_verified, otp_value, otp_expiry, membership_expires, \
     password_reset_token, password_reset_expires, created_at, updated_at";

pub fn create_user_table(table: &str) -> String {
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            id TEXT PRIMARY KEY,
            name VARCHAR(255) NOT NULL,
            email VARCHAR(255) UNIQUE NOT NULL,
            phone VARCHAR(32),
            gender CHAR(1) NOT NULL DEFAULT 'M',
            logo TEXT,
            password_hash VARCHAR(255) NOT NULL,
            hotel_id TEXT,
            is_approved BOOLEAN NOT NULL DEFAULT false,
            is_verified BOOLEAN NOT NULL DEFAULT false,
            otp_value BIGINT,
            otp_expiry TIMESTAMPTZ,
            membership_expires TIMESTAMPTZ,
            password_reset_token VARCHAR(64),
            password_reset_expires TIMESTAMPTZ,
            created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
        )"#
    )
}

pub fn create_resource_table(table: &str) -> String {
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            id TEXT PRIMARY KEY,
            hotel_id TEXT NOT NULL
        )"#
    )
}

pub fn create_hotel_index(table: &str) -> String {
    format!("CREATE INDEX IF NOT EXISTS idx_{table}_hotel_id ON {table}(hotel_id)")
}

pub fn find_user_by_id(table: &str) -> String {
    format!("SELECT {USER_COLUMNS} FROM {table} WHERE id = $1")
}

pub fn find_user_by_email(table: &str) -> String {
    format!("SELECT {USER_COLUMNS} FROM {table} WHERE email = $1")
}

pub fn insert_user(table: &str) -> String {
    format!(
        "INSERT INTO {table} ({USER_COLUMNS}) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)"
    )
}

pub fn update_user(table: &str) -> String {
    format!(
        "UPDATE {table} SET name = $2, email = $3, phone = $4, gender = $5, logo = $6, \
         password_hash = $7, hotel_id = $8, is_approved = $9, is_verified = $10, \
         otp_value = $11, otp_expiry = $12, membership_expires = $13, \
         password_reset_token = $14, password_reset_expires = $15, updated_at = $16 \
         WHERE id = $1"
    )
}

pub fn resource_hotel_id(table: &str) -> String {
    format!("SELECT hotel_id FROM {table} WHERE id = $1")
}
