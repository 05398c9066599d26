use crate::errors::TrelliumError;
use parking_lot::Mutex;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Type-erased bean instance shared by every caller that observes it.
pub type ContextualInstance = Arc<dyn Any + Send + Sync>;

// Counter for creational-context tracking
static CREATIONAL_CONTEXT_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Opaque per-creation token. The storage stores and forwards it to the
/// container's destruction callback, never inspecting the payload.
#[derive(Clone)]
pub struct CreationalContext {
    id: u64,
    payload: Arc<dyn Any + Send + Sync>,
}

impl CreationalContext {
    pub fn new(payload: impl Any + Send + Sync) -> Self {
        Self {
            id: CREATIONAL_CONTEXT_COUNTER.fetch_add(1, Ordering::SeqCst),
            payload: Arc::new(payload),
        }
    }

    pub fn empty() -> Self {
        Self::new(())
    }

    /// Unique ID for lifetime tracking
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Container-side accessor; this crate never reads the payload itself.
    pub fn payload(&self) -> &(dyn Any + Send + Sync) {
        self.payload.as_ref()
    }
}

impl fmt::Debug for CreationalContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CreationalContext(id={})", self.id)
    }
}

/// Bean-provider capability: creates instances on demand and destroys them
/// with the creational context they were created under.
pub trait Contextual: Send + Sync {
    fn create(&self, ctx: &CreationalContext) -> Result<ContextualInstance, TrelliumError>;

    fn destroy(&self, instance: ContextualInstance, ctx: &CreationalContext) {
        let _ = (instance, ctx);
    }

    /// Stable, serialization-safe identity for passivating scopes.
    fn passivation_id(&self) -> Option<String> {
        None
    }
}

/// Container directory capability: resolves a passivation id back to the
/// bean that produced it.
pub trait BeanDirectory: Send + Sync {
    fn passivation_capable_bean(&self, id: &str) -> Result<Arc<dyn Contextual>, TrelliumError>;
}

pub struct InMemoryBeanDirectory {
    beans: HashMap<String, Arc<dyn Contextual>>,
}

impl InMemoryBeanDirectory {
    pub fn new() -> Self {
        Self {
            beans: HashMap::new(),
        }
    }

    pub fn register(&mut self, bean: Arc<dyn Contextual>) -> Result<(), TrelliumError> {
        let id = bean
            .passivation_id()
            .ok_or_else(|| TrelliumError::Resolution {
                code: "SCOPE_BEAN_NOT_PASSIVATION_CAPABLE".to_string(),
                message: "bean does not expose a passivation id".to_string(),
            })?;
        self.beans.insert(id, bean);
        Ok(())
    }
}

impl Default for InMemoryBeanDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl BeanDirectory for InMemoryBeanDirectory {
    fn passivation_capable_bean(&self, id: &str) -> Result<Arc<dyn Contextual>, TrelliumError> {
        self.beans
            .get(id)
            .cloned()
            .ok_or_else(|| TrelliumError::Resolution {
                code: "SCOPE_PASSIVATION_ID_UNKNOWN".to_string(),
                message: format!("no passivation-capable bean registered for id '{}'", id),
            })
    }
}

/// Bean handle compared and hashed by pointer identity. Equivalent but
/// distinct descriptors get distinct identities.
#[derive(Clone)]
pub struct BeanIdentity(Arc<dyn Contextual>);

impl BeanIdentity {
    pub fn new(bean: Arc<dyn Contextual>) -> Self {
        Self(bean)
    }

    pub fn bean(&self) -> Arc<dyn Contextual> {
        Arc::clone(&self.0)
    }

    fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }
}

impl PartialEq for BeanIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl Eq for BeanIdentity {}

impl Hash for BeanIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl fmt::Debug for BeanIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BeanIdentity({:#x})", self.addr())
    }
}

/// Key under which a bean's instance is stored: the passivation id when the
/// bean declares one, otherwise the bean's own identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BeanKey {
    PassivationId(String),
    Identity(BeanIdentity),
}

impl BeanKey {
    pub fn for_bean(bean: &Arc<dyn Contextual>) -> Self {
        match bean.passivation_id() {
            Some(id) => BeanKey::PassivationId(id),
            None => BeanKey::Identity(BeanIdentity::new(Arc::clone(bean))),
        }
    }
}

struct InstanceSlot {
    instance: ContextualInstance,
    creational_context: CreationalContext,
}

/// Per-key record. The slot is set exactly once; a populated record never
/// changes for the lifetime of the record.
pub struct ContextualInstanceInfo {
    slot: Mutex<Option<InstanceSlot>>,
}

impl ContextualInstanceInfo {
    pub(crate) fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    pub fn contextual_instance(&self) -> Option<ContextualInstance> {
        self.slot
            .lock()
            .as_ref()
            .map(|slot| Arc::clone(&slot.instance))
    }

    pub fn creational_context(&self) -> Option<CreationalContext> {
        self.slot
            .lock()
            .as_ref()
            .map(|slot| slot.creational_context.clone())
    }

    pub fn is_populated(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Removes the slot contents for teardown, once the record has already
    /// left the storage map.
    pub fn take(&self) -> Option<(ContextualInstance, CreationalContext)> {
        self.slot
            .lock()
            .take()
            .map(|slot| (slot.instance, slot.creational_context))
    }

    pub(crate) fn populate(&self, instance: ContextualInstance, ctx: CreationalContext) {
        *self.slot.lock() = Some(InstanceSlot {
            instance,
            creational_context: ctx,
        });
    }

    /// The per-record critical section: holds the slot lock across `create`
    /// so racing callers of the same key block until the winner commits.
    pub(crate) fn get_or_create_with<F>(
        &self,
        ctx: &CreationalContext,
        create: F,
    ) -> Result<ContextualInstance, TrelliumError>
    where
        F: FnOnce(&CreationalContext) -> Result<ContextualInstance, TrelliumError>,
    {
        let mut slot = self.slot.lock();
        if let Some(existing) = slot.as_ref() {
            return Ok(Arc::clone(&existing.instance));
        }
        let instance = create(ctx)?;
        *slot = Some(InstanceSlot {
            instance: Arc::clone(&instance),
            creational_context: ctx.clone(),
        });
        Ok(instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PlainBean;

    impl Contextual for PlainBean {
        fn create(&self, _ctx: &CreationalContext) -> Result<ContextualInstance, TrelliumError> {
            Ok(Arc::new("plain"))
        }
    }

    struct NamedBean(String);

    impl Contextual for NamedBean {
        fn create(&self, _ctx: &CreationalContext) -> Result<ContextualInstance, TrelliumError> {
            Ok(Arc::new(self.0.clone()))
        }

        fn passivation_id(&self) -> Option<String> {
            Some(self.0.clone())
        }
    }

    #[test]
    fn test_passivation_capable_beans_share_a_key() {
        let a: Arc<dyn Contextual> = Arc::new(NamedBean("beanA-v1".to_string()));
        let b: Arc<dyn Contextual> = Arc::new(NamedBean("beanA-v1".to_string()));

        assert_eq!(BeanKey::for_bean(&a), BeanKey::for_bean(&b));
        assert_eq!(
            BeanKey::for_bean(&a),
            BeanKey::PassivationId("beanA-v1".to_string())
        );
    }

    #[test]
    fn test_plain_beans_are_keyed_by_identity() {
        let a: Arc<dyn Contextual> = Arc::new(PlainBean);
        let b: Arc<dyn Contextual> = Arc::new(PlainBean);

        assert_ne!(BeanKey::for_bean(&a), BeanKey::for_bean(&b));
        assert_eq!(BeanKey::for_bean(&a), BeanKey::for_bean(&Arc::clone(&a)));
    }

    #[test]
    fn test_directory_rejects_unknown_ids() {
        let mut directory = InMemoryBeanDirectory::new();
        directory
            .register(Arc::new(NamedBean("known".to_string())))
            .unwrap();

        assert!(directory.passivation_capable_bean("known").is_ok());
        assert!(matches!(
            directory.passivation_capable_bean("unknown"),
            Err(TrelliumError::Resolution { .. })
        ));
    }

    #[test]
    fn test_directory_rejects_plain_beans() {
        let mut directory = InMemoryBeanDirectory::new();
        assert!(matches!(
            directory.register(Arc::new(PlainBean)),
            Err(TrelliumError::Resolution { .. })
        ));
    }

    #[test]
    fn test_info_slot_is_set_once() {
        let info = ContextualInstanceInfo::new();
        let ctx = CreationalContext::empty();
        assert!(!info.is_populated());

        let first = info
            .get_or_create_with(&ctx, |_| Ok(Arc::new(1u32)))
            .unwrap();
        let second = info
            .get_or_create_with(&ctx, |_| Ok(Arc::new(2u32)))
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(info.creational_context().unwrap().id(), ctx.id());
    }
}
