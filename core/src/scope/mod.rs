pub mod context;
pub mod storage;
pub mod types;

pub use context::ScopeContext;
pub use storage::{ConcurrencyMode, ConcurrentStorage, ContextualStorage, ExclusiveStorage};
pub use types::{
    BeanDirectory, BeanIdentity, BeanKey, Contextual, ContextualInstance, ContextualInstanceInfo,
    CreationalContext, InMemoryBeanDirectory,
};
