pub mod handler;
pub mod types;

pub use handler::{ResourceHandler, ResourceHandlerWrapper, StaticResourceHandler};
pub use types::{RequestContext, Resource, ResourceMeta, ViewResource};
