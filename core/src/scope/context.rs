use crate::errors::TrelliumError;
use crate::scope::storage::{ConcurrentStorage, ContextualStorage};
use crate::scope::types::{BeanDirectory, Contextual, ContextualInstance, CreationalContext};
use log::{debug, warn};
use std::sync::Arc;

/// A custom scope backed by a [`ConcurrentStorage`]: lookup without
/// creation, get-or-create, and teardown destruction of every instance
/// with the creational context it was created under.
pub struct ScopeContext {
    name: String,
    storage: ConcurrentStorage,
}

impl ScopeContext {
    pub fn new(name: impl Into<String>, directory: Arc<dyn BeanDirectory>) -> Self {
        Self {
            name: name.into(),
            storage: ConcurrentStorage::new(directory),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn storage(&self) -> &ConcurrentStorage {
        &self.storage
    }

    /// Committed instance for the bean's key, if any. Never creates.
    pub fn get(&self, bean: &Arc<dyn Contextual>) -> Option<ContextualInstance> {
        let key = self.storage.get_bean_key(bean);
        self.storage.get(&key)
    }

    pub fn get_or_create(
        &self,
        bean: &Arc<dyn Contextual>,
        creational_context: &CreationalContext,
    ) -> Result<ContextualInstance, TrelliumError> {
        self.storage.create_contextual_instance(bean, creational_context)
    }

    /// Destroys every populated instance and empties the storage. Entries
    /// whose bean can no longer be resolved are logged and skipped so
    /// teardown always completes.
    pub fn destroy_all(&mut self) {
        let entries = self.storage.drain();
        debug!("scope '{}': tearing down {} entries", self.name, entries.len());

        for (key, info) in entries {
            let Some((instance, creational_context)) = info.take() else {
                // reserved slot that never saw a successful create
                continue;
            };

            match self.storage.get_bean(&key) {
                Ok(bean) => bean.destroy(instance, &creational_context),
                Err(err) => warn!(
                    "scope '{}': skipping destruction for {:?}: {}",
                    self.name, key, err
                ),
            }
        }
    }
}
