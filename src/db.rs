//! Database connection management
//!
//! Pool construction and schema bootstrap for the Postgres-backed stores.

pub mod queries;
mod service;

pub use service::{validate_table_name, PgCredentialStore, PgResourceLookup};

use crate::auth::Role;
use crate::config::DatabaseConfig;
use crate::error::AppError;
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;
use tracing::{debug, info};

/// Build a pool and verify it can serve a query
pub async fn init_pool(config: &DatabaseConfig) -> anyhow::Result<Pool> {
    let mut cfg = Config::new();
    cfg.host = Some(config.host.clone());
    cfg.port = Some(config.port);
    cfg.user = Some(config.user.clone());
    cfg.password = Some(config.password.clone());
    cfg.dbname = Some(config.database.clone());
    cfg.pool = Some(deadpool_postgres::PoolConfig::new(config.max_pool_size));
    cfg.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });

    let pool = if config.use_tls {
        let certs = rustls_native_certs::load_native_certs();
        let mut root_store = rustls::RootCertStore::empty();
        for cert in certs.certs {
            root_store.add(cert).ok();
        }

        let tls_config = rustls::ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        let tls = tokio_postgres_rustls::MakeRustlsConnect::new(tls_config);
        cfg.create_pool(Some(Runtime::Tokio1), tls)
            .map_err(|e| anyhow::anyhow!("Failed to create TLS pool: {}", e))?
    } else {
        cfg.create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| anyhow::anyhow!("Failed to create pool: {}", e))?
    };

    let client = pool
        .get()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to get pool connection: {}", e))?;
    client
        .query_one("SELECT 1 AS ok", &[])
        .await
        .map_err(|e| anyhow::anyhow!("Failed to verify database connection: {}", e))?;

    info!(host = %config.host, database = %config.database, tls = config.use_tls, "database pool ready");
    Ok(pool)
}

/// Create credential tables and the given resource tables if missing
pub async fn bootstrap_schema(pool: &Pool, resource_tables: &[&str]) -> Result<(), AppError> {
    let client = pool.get().await?;

    for role in Role::FALLBACK_ORDER {
        client
            .execute(&queries::create_user_table(role.collection()), &[])
            .await?;
        client
            .execute(&queries::create_hotel_index(role.collection()), &[])
            .await?;
    }

    for table in resource_tables {
        validate_table_name(table)?;
        client
            .execute(&queries::create_resource_table(table), &[])
            .await?;
        client
            .execute(&queries::create_hotel_index(table), &[])
            .await?;
        debug!(table = %table, "resource table ready");
    }

    info!("database tables initialized");
    Ok(())
}
