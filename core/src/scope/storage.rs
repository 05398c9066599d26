use crate::errors::TrelliumError;
use crate::scope::types::{
    BeanDirectory, BeanKey, Contextual, ContextualInstance, ContextualInstanceInfo,
    CreationalContext,
};
use log::debug;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcurrencyMode {
    Exclusive,
    Concurrent,
}

/// Common protocol shared by both storage variants: key derivation, reverse
/// lookup through the injected directory, and enumeration for the owning
/// scope's teardown and passivation passes.
pub trait ContextualStorage {
    fn directory(&self) -> &Arc<dyn BeanDirectory>;

    fn concurrency_mode(&self) -> ConcurrencyMode;

    /// Snapshot of the underlying storage map. Reserved-but-empty records
    /// report no instance.
    fn storage(&self) -> Vec<(BeanKey, Arc<ContextualInstanceInfo>)>;

    /// Removes and returns every entry, for scope teardown.
    fn drain(&mut self) -> Vec<(BeanKey, Arc<ContextualInstanceInfo>)>;

    fn is_concurrent(&self) -> bool {
        self.concurrency_mode() == ConcurrencyMode::Concurrent
    }

    /// The passivation id when the bean declares one, otherwise the bean's
    /// own identity. Pure and deterministic.
    fn get_bean_key(&self, bean: &Arc<dyn Contextual>) -> BeanKey {
        BeanKey::for_bean(bean)
    }

    /// Restores the bean from its key: textual passivation ids resolve via
    /// the directory, identity keys already carry the bean.
    fn get_bean(&self, key: &BeanKey) -> Result<Arc<dyn Contextual>, TrelliumError> {
        match key {
            BeanKey::PassivationId(id) => self.directory().passivation_capable_bean(id),
            BeanKey::Identity(identity) => Ok(identity.bean()),
        }
    }
}

/// Storage for scopes whose threading contract guarantees one caller at a
/// time. Creation takes `&mut self`, so exclusivity is enforced by the
/// borrow checker rather than by a runtime lock.
pub struct ExclusiveStorage {
    instances: HashMap<BeanKey, Arc<ContextualInstanceInfo>>,
    directory: Arc<dyn BeanDirectory>,
}

impl ExclusiveStorage {
    pub fn new(directory: Arc<dyn BeanDirectory>) -> Self {
        Self {
            instances: HashMap::new(),
            directory,
        }
    }

    /// Unconditionally creates a new instance for the bean's key. No
    /// existence check: a repeated call overwrites the previous entry.
    pub fn create_contextual_instance(
        &mut self,
        bean: &Arc<dyn Contextual>,
        creational_context: &CreationalContext,
    ) -> Result<ContextualInstance, TrelliumError> {
        let key = self.get_bean_key(bean);
        let instance = bean.create(creational_context)?;

        let info = Arc::new(ContextualInstanceInfo::new());
        info.populate(Arc::clone(&instance), creational_context.clone());
        self.instances.insert(key, info);

        Ok(instance)
    }

    pub fn get(&self, key: &BeanKey) -> Option<ContextualInstance> {
        self.instances
            .get(key)
            .and_then(|info| info.contextual_instance())
    }
}

impl ContextualStorage for ExclusiveStorage {
    fn directory(&self) -> &Arc<dyn BeanDirectory> {
        &self.directory
    }

    fn concurrency_mode(&self) -> ConcurrencyMode {
        ConcurrencyMode::Exclusive
    }

    fn storage(&self) -> Vec<(BeanKey, Arc<ContextualInstanceInfo>)> {
        self.instances
            .iter()
            .map(|(key, info)| (key.clone(), Arc::clone(info)))
            .collect()
    }

    fn drain(&mut self) -> Vec<(BeanKey, Arc<ContextualInstanceInfo>)> {
        self.instances.drain().collect()
    }
}

/// Storage safe for parallel callers. Two-level locking: an atomic
/// insert-if-absent at the map level reserves a record, then the record's
/// own slot lock serializes construction for that single key. The map-level
/// write lock is never held across `bean.create`.
pub struct ConcurrentStorage {
    instances: RwLock<HashMap<BeanKey, Arc<ContextualInstanceInfo>>>,
    directory: Arc<dyn BeanDirectory>,
}

impl ConcurrentStorage {
    pub fn new(directory: Arc<dyn BeanDirectory>) -> Self {
        Self {
            instances: RwLock::new(HashMap::new()),
            directory,
        }
    }

    /// Returns the cached instance for the bean's key, creating it at most
    /// once no matter how many threads race on the same key. Every caller
    /// observes the single fully-initialized winner. A failed `create`
    /// commits nothing; the reserved record stays empty and a later call
    /// retries.
    pub fn create_contextual_instance(
        &self,
        bean: &Arc<dyn Contextual>,
        creational_context: &CreationalContext,
    ) -> Result<ContextualInstance, TrelliumError> {
        let key = self.get_bean_key(bean);
        let info = self.reserve(key.clone());

        let instance = info.get_or_create_with(creational_context, |ctx| bean.create(ctx))?;
        debug!("contextual instance ready for {:?}", key);

        Ok(instance)
    }

    pub fn get(&self, key: &BeanKey) -> Option<ContextualInstance> {
        self.instances
            .read()
            .get(key)
            .and_then(|info| info.contextual_instance())
    }

    /// Insert-if-absent: losers of the race resolve to the record the
    /// winning thread established.
    fn reserve(&self, key: BeanKey) -> Arc<ContextualInstanceInfo> {
        if let Some(info) = self.instances.read().get(&key) {
            return Arc::clone(info);
        }

        let mut map = self.instances.write();
        Arc::clone(
            map.entry(key)
                .or_insert_with(|| Arc::new(ContextualInstanceInfo::new())),
        )
    }
}

impl ContextualStorage for ConcurrentStorage {
    fn directory(&self) -> &Arc<dyn BeanDirectory> {
        &self.directory
    }

    fn concurrency_mode(&self) -> ConcurrencyMode {
        ConcurrencyMode::Concurrent
    }

    fn storage(&self) -> Vec<(BeanKey, Arc<ContextualInstanceInfo>)> {
        self.instances
            .read()
            .iter()
            .map(|(key, info)| (key.clone(), Arc::clone(info)))
            .collect()
    }

    fn drain(&mut self) -> Vec<(BeanKey, Arc<ContextualInstanceInfo>)> {
        self.instances.write().drain().collect()
    }
}
