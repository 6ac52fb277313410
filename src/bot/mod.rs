//! Telegram transport: access gate, handlers and dispatcher wiring.

pub mod gate;
pub mod handlers;
pub mod runner;

use crate::bot::gate::AccessGate;
use crate::config::Settings;
use crate::llm::caller::ResilientCaller;
use crate::personas::PersonaRegistry;
use std::sync::Arc;

/// Read-only state shared by every handler invocation.
///
/// Nothing here is mutated after startup, so concurrent handler runs need
/// no locking.
pub struct AppContext {
    pub settings: Arc<Settings>,
    pub registry: PersonaRegistry,
    pub caller: ResilientCaller,
    pub gate: AccessGate,
}

impl AppContext {
    #[must_use]
    pub fn new(
        settings: Arc<Settings>,
        registry: PersonaRegistry,
        caller: ResilientCaller,
    ) -> Self {
        let gate = AccessGate::new(settings.owner_id);
        Self {
            settings,
            registry,
            caller,
            gate,
        }
    }
}
