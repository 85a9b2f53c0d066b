//! Combines the API routes from every module into one router.

use axum::Router;
use std::sync::Arc;

use crate::shared::state::AppState;

pub fn configure_api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(crate::auth::configure())
        .merge(crate::quotes::configure())
        .merge(crate::customers::configure())
        .merge(crate::dashboards::configure())
        .merge(crate::settings::configure())
}
