//! appfleet-api — REST API for the appfleet admin panel.
//!
//! Every POST body carries the admin password as `ADMIN_PASS`; requests
//! without the right one get `{"success": false, "error": "not_authorized"}`.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/api/init` | Server start time and title |
//! | POST | `/api/appman` | Refresh accounts, return the directory |
//! | POST | `/api/apps/{name}/deploy` | Deploy an app (policy fields override defaults) |
//! | POST | `/api/apps/{name}/delete` | Delete an app from its account |
//! | POST | `/api/apps/{name}/config` | Get an app's config vars |
//! | POST | `/api/apps/{name}/config/set` | Set config vars on an app |
//! | POST | `/api/apps/{name}/builds` | List an app's builds |

pub mod handlers;

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::Router;
use axum::routing::{get, post};

use appfleet_core::DeploymentPolicy;
use appfleet_deployer::Deployer;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub deployer: Arc<Deployer>,
    /// Without a password every admin request is refused.
    pub admin_pass: Option<String>,
    /// Policy used for fields a deploy request leaves out.
    pub default_policy: DeploymentPolicy,
    pub title: String,
    /// Milliseconds since the epoch.
    pub started_at: u64,
}

impl ApiState {
    pub fn new(deployer: Arc<Deployer>, admin_pass: Option<String>, title: impl Into<String>) -> Self {
        Self {
            deployer,
            admin_pass: admin_pass.filter(|p| !p.is_empty()),
            default_policy: DeploymentPolicy::default(),
            title: title.into(),
            started_at: epoch_millis(),
        }
    }

    pub fn with_default_policy(mut self, policy: DeploymentPolicy) -> Self {
        self.default_policy = policy;
        self
    }

    pub(crate) fn is_admin(&self, given: Option<&str>) -> bool {
        matches!((self.admin_pass.as_deref(), given), (Some(expected), Some(given)) if expected == given)
    }
}

/// Build the API router.
pub fn build_router(state: ApiState) -> Router {
    let api_routes = Router::new()
        .route("/init", get(handlers::init))
        .route("/appman", post(handlers::appman))
        .route("/apps/{name}/deploy", post(handlers::deploy))
        .route("/apps/{name}/delete", post(handlers::delete_app))
        .route("/apps/{name}/config", post(handlers::get_config))
        .route("/apps/{name}/config/set", post(handlers::set_config))
        .route("/apps/{name}/builds", post(handlers::list_builds))
        .with_state(state);

    Router::new().nest("/api", api_routes)
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
