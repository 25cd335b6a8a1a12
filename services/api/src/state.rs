//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds the session registry,
//! the generation provider and the loaded configuration.

use crate::{config::Config, registry::SessionRegistry};
use revolt_core::llm_client::ModelProvider;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    pub model_provider: Arc<dyn ModelProvider>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, model_provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            registry: Arc::new(SessionRegistry::new()),
            model_provider,
            config: Arc::new(config),
        }
    }
}
