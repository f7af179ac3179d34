//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds the resources every
//! handler needs: the session orchestrator and the loaded configuration.

use crate::config::Config;
use std::sync::Arc;
use yovo_core::orchestrator::SessionOrchestrator;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<SessionOrchestrator>,
    pub config: Arc<Config>,
}
