use std::sync::Arc;

use marquee_db::{AuthStore, MovieStore};

use crate::config::ServerConfig;
use crate::notifications::email::Mailer;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (everything is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Users, tokens and permissions.
    pub auth_store: Arc<dyn AuthStore>,
    /// Movie records.
    pub movie_store: Arc<dyn MovieStore>,
    /// Immutable server configuration.
    pub config: Arc<ServerConfig>,
    /// Outbound activation mail.
    pub mailer: Arc<dyn Mailer>,
}
