//! Hotel Auth API server
//!
//! Runs against Postgres when DATABASE_URL is set, otherwise on in-memory
//! stores for local development.

use hotel_auth::config::Settings;
use hotel_auth::db::{self, PgCredentialStore, PgResourceLookup};
use hotel_auth::resources::{MemoryResourceStore, ResourceRegistry};
use hotel_auth::routes::create_router;
use hotel_auth::state::AppState;
use hotel_auth::users::{CredentialStore, MemoryCredentialStore};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Resource tables guarded by ownership checks, keyed by registry name
const RESOURCE_TABLES: [(&str, &str); 2] = [("bill", "bills"), ("table", "tables")];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("🚀 Starting Hotel Auth API...");

    let settings = Settings::load()?;
    info!(auth = ?settings.auth, "📋 Configuration loaded successfully");

    let (credentials, resources): (Arc<dyn CredentialStore>, ResourceRegistry) =
        match &settings.database {
            Some(database) => {
                let pool = db::init_pool(database).await?;
                let tables: Vec<&str> = RESOURCE_TABLES.iter().map(|(_, table)| *table).collect();
                db::bootstrap_schema(&pool, &tables).await?;

                let mut resources = ResourceRegistry::new();
                for (name, table) in RESOURCE_TABLES {
                    resources =
                        resources.register(name, Arc::new(PgResourceLookup::new(pool.clone(), table)?));
                }
                (Arc::new(PgCredentialStore::new(pool)), resources)
            }
            None => {
                warn!("⚠️  DATABASE_URL not set, using in-memory stores (data is lost on restart)");
                let mut resources = ResourceRegistry::new();
                for (name, _) in RESOURCE_TABLES {
                    resources = resources.register(name, Arc::new(MemoryResourceStore::new()));
                }
                (Arc::new(MemoryCredentialStore::new()), resources)
            }
        };

    info!(
        resources = ?resources.names().collect::<Vec<_>>(),
        "ownership checks registered"
    );

    let state = Arc::new(AppState::new(settings.auth.clone(), credentials, resources));
    let app = create_router(state, &settings.cors);

    let addr = SocketAddr::from((settings.server.host, settings.server.port));

    info!("🌐 Server listening on http://{}", addr);
    info!("📚 API Endpoints:");
    info!("   GET  /health                              - Health check");
    info!("   POST /api/v1/auth/login                   - Login, sets auth cookie");
    info!("   POST /api/v1/auth/logout                  - Clear auth cookie");
    info!("   GET  /api/v1/auth/me                      - Current principal");
    info!("   POST /api/v1/hotels/scope                 - Hotel-scoped principal");
    info!("   GET  /api/v1/admin/hotel-owners/{{id}}      - Hotel owner (SuperAdmin only)");
    info!("   GET  /api/v1/bills/{{id}}                   - Bill (ownership checked)");
    info!("   GET  /api/v1/tables/{{id}}                  - Table (ownership checked)");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server shutdown complete");
    Ok(())
}

/// Initialize tracing with structured logging
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hotel_auth=debug,tower_http=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .compact(),
        )
        .init();
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("📴 Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("📴 Received terminate signal, initiating graceful shutdown...");
        },
    }
}
