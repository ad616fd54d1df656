//! Application state management
//!
//! Contains shared state accessible across all handlers and guard layers.

use crate::auth::TokenCodec;
use crate::config::AuthConfig;
use crate::resolver::PrincipalResolver;
use crate::resources::ResourceRegistry;
use crate::users::CredentialStore;
use std::sync::Arc;

/// Application state shared across all handlers
pub struct AppState {
    /// Token and guard settings
    pub auth: AuthConfig,

    /// Signs and verifies auth tokens
    pub codec: TokenCodec,

    /// Credential records for both roles
    pub credentials: Arc<dyn CredentialStore>,

    /// Token subject → principal
    pub resolver: PrincipalResolver,

    /// Lookups used by ownership checks
    pub resources: ResourceRegistry,
}

impl AppState {
    pub fn new(
        auth: AuthConfig,
        credentials: Arc<dyn CredentialStore>,
        resources: ResourceRegistry,
    ) -> Self {
        let codec = TokenCodec::new(&auth);
        let resolver = PrincipalResolver::new(credentials.clone(), auth.lookup_timeout);

        Self {
            auth,
            codec,
            credentials,
            resolver,
            resources,
        }
    }
}

/// Type alias for shared state
pub type SharedState = Arc<AppState>;
