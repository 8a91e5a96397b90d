//! In-memory implementation of `ActionStore`.

use std::collections::HashMap;

use steward_contracts::action::{ActionId, EmployeeAction};

use crate::traits::ActionStore;

/// The reference `ActionStore`: a plain keyed map.
///
/// Suitable for tests and single-process deployments; durable deployments
/// inject their own store at engine construction.
#[derive(Debug, Default)]
pub struct InMemoryActionStore {
    actions: HashMap<ActionId, EmployeeAction>,
}

impl InMemoryActionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ActionStore for InMemoryActionStore {
    fn insert(&mut self, action: EmployeeAction) {
        self.actions.insert(action.id, action);
    }

    fn get(&self, id: &ActionId) -> Option<&EmployeeAction> {
        self.actions.get(id)
    }

    fn get_mut(&mut self, id: &ActionId) -> Option<&mut EmployeeAction> {
        self.actions.get_mut(id)
    }

    fn remove(&mut self, id: &ActionId) -> Option<EmployeeAction> {
        self.actions.remove(id)
    }

    fn all(&self) -> Vec<&EmployeeAction> {
        self.actions.values().collect()
    }

    fn len(&self) -> usize {
        self.actions.len()
    }
}
