//! Handler registry: the capability lookup from action type to executor.
//!
//! This is the engine's only extension point. External collaborators (the
//! communication hub, CRM integrations, task systems) register one handler
//! per action type they can execute; an action whose type has no handler
//! fails terminally at execution time.

use std::collections::HashMap;
use std::sync::Arc;

use crate::traits::ActionHandler;

/// Action type → executor lookup.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn ActionHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `action_type`, replacing any previous one.
    pub fn register(&mut self, action_type: impl Into<String>, handler: Arc<dyn ActionHandler>) {
        let action_type = action_type.into();
        tracing::debug!(action_type = %action_type, "handler registered");
        self.handlers.insert(action_type, handler);
    }

    pub fn get(&self, action_type: &str) -> Option<Arc<dyn ActionHandler>> {
        self.handlers.get(action_type).cloned()
    }

    pub fn contains(&self, action_type: &str) -> bool {
        self.handlers.contains_key(action_type)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
