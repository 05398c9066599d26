//! # TRELLIUM CORE LIBRARY
//!
//! **SERVER-SIDE COMPONENT FRAMEWORK CORE COMPONENTS**
//!
//! **ARCHITECTURE**: Contextual-instance storage backing custom
//! dependency-injection scopes, plus the resource-handler decorator contract
//! **GUARANTEE**: At-most-once instance creation per bean key under
//! concurrent access
//! **COMPATIBILITY**: Container integration through injected capability
//! traits (`Contextual`, `BeanDirectory`, `ResourceHandler`)

pub mod errors;
pub mod resource;
pub mod scope;
