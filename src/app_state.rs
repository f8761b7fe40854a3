//! Application state shared across handlers

use std::sync::Arc;

use crate::auth::AuthService;
use crate::catalog::CatalogService;
use crate::ipfs::IpfsService;

use axum::extract::FromRef;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub catalog_service: Arc<CatalogService>,
    pub auth_service: Arc<AuthService>,
    pub ipfs_service: Arc<IpfsService>,
}

impl AppState {
    pub fn new(
        catalog_service: Arc<CatalogService>,
        auth_service: Arc<AuthService>,
        ipfs_service: Arc<IpfsService>,
    ) -> Self {
        Self {
            catalog_service,
            auth_service,
            ipfs_service,
        }
    }
}

impl FromRef<AppState> for Arc<CatalogService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.catalog_service.clone()
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.auth_service.clone()
    }
}

impl FromRef<AppState> for Arc<IpfsService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.ipfs_service.clone()
    }
}
