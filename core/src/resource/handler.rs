use crate::errors::TrelliumError;
use crate::resource::types::{RequestContext, Resource, ResourceMeta, ViewResource};
use log::debug;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;

/// Renderer types keyed by resource-name extension.
static RENDERER_TYPES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut table = HashMap::new();
    table.insert("js", "trellium.resource.Script");
    table.insert("css", "trellium.resource.Stylesheet");
    table
});

/// Static-resource serving contract. Implementations decide how resources
/// are located; the framework core only consumes this surface.
pub trait ResourceHandler: Send + Sync {
    fn create_resource(&self, name: &str) -> Option<Resource>;

    fn create_resource_in_library(&self, name: &str, library: &str) -> Option<Resource>;

    fn create_resource_with_content_type(
        &self,
        name: &str,
        library: &str,
        content_type: &str,
    ) -> Option<Resource>;

    fn create_resource_from_id(&self, resource_id: &str) -> Option<Resource>;

    fn create_view_resource(&self, ctx: &RequestContext, name: &str) -> Option<ViewResource>;

    fn library_exists(&self, library: &str) -> bool;

    fn is_resource_request(&self, ctx: &RequestContext) -> bool;

    fn is_resource_url(&self, url: &str) -> bool;

    fn renderer_type_for_resource_name(&self, name: &str) -> Option<String>;

    fn handle_resource_request(&self, ctx: &RequestContext) -> Result<(), TrelliumError>;

    fn view_resources(&self, ctx: &RequestContext, path: &str, max_depth: usize) -> Vec<String>;
}

/// Pure forwarding decorator: every operation delegates to the wrapped
/// handler. Subclass-style customization points override selectively by
/// wrapping this type again.
pub struct ResourceHandlerWrapper {
    delegate: Arc<dyn ResourceHandler>,
}

impl ResourceHandlerWrapper {
    pub fn new(delegate: Arc<dyn ResourceHandler>) -> Self {
        Self { delegate }
    }

    pub fn wrapped(&self) -> &Arc<dyn ResourceHandler> {
        &self.delegate
    }
}

impl ResourceHandler for ResourceHandlerWrapper {
    fn create_resource(&self, name: &str) -> Option<Resource> {
        self.wrapped().create_resource(name)
    }

    fn create_resource_in_library(&self, name: &str, library: &str) -> Option<Resource> {
        self.wrapped().create_resource_in_library(name, library)
    }

    fn create_resource_with_content_type(
        &self,
        name: &str,
        library: &str,
        content_type: &str,
    ) -> Option<Resource> {
        self.wrapped()
            .create_resource_with_content_type(name, library, content_type)
    }

    fn create_resource_from_id(&self, resource_id: &str) -> Option<Resource> {
        self.wrapped().create_resource_from_id(resource_id)
    }

    fn create_view_resource(&self, ctx: &RequestContext, name: &str) -> Option<ViewResource> {
        self.wrapped().create_view_resource(ctx, name)
    }

    fn library_exists(&self, library: &str) -> bool {
        self.wrapped().library_exists(library)
    }

    fn is_resource_request(&self, ctx: &RequestContext) -> bool {
        self.wrapped().is_resource_request(ctx)
    }

    fn is_resource_url(&self, url: &str) -> bool {
        self.wrapped().is_resource_url(url)
    }

    fn renderer_type_for_resource_name(&self, name: &str) -> Option<String> {
        self.wrapped().renderer_type_for_resource_name(name)
    }

    fn handle_resource_request(&self, ctx: &RequestContext) -> Result<(), TrelliumError> {
        self.wrapped().handle_resource_request(ctx)
    }

    fn view_resources(&self, ctx: &RequestContext, path: &str, max_depth: usize) -> Vec<String> {
        self.wrapped().view_resources(ctx, path, max_depth)
    }
}

/// Registry-backed handler serving a fixed set of resources under a URL
/// prefix.
pub struct StaticResourceHandler {
    prefix: String,
    resources: Vec<ResourceMeta>,
}

impl StaticResourceHandler {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            resources: Vec::new(),
        }
    }

    pub fn add_resource(&mut self, meta: ResourceMeta) {
        self.resources.push(meta);
    }

    fn find(&self, name: &str, library: Option<&str>) -> Option<&ResourceMeta> {
        self.resources
            .iter()
            .find(|meta| meta.name == name && meta.library.as_deref() == library)
    }

    fn to_resource(&self, meta: &ResourceMeta) -> Resource {
        Resource {
            meta: meta.clone(),
            request_path: format!("{}{}", self.prefix, meta.resource_id()),
        }
    }
}

impl ResourceHandler for StaticResourceHandler {
    fn create_resource(&self, name: &str) -> Option<Resource> {
        self.find(name, None).map(|meta| self.to_resource(meta))
    }

    fn create_resource_in_library(&self, name: &str, library: &str) -> Option<Resource> {
        self.find(name, Some(library))
            .map(|meta| self.to_resource(meta))
    }

    fn create_resource_with_content_type(
        &self,
        name: &str,
        library: &str,
        content_type: &str,
    ) -> Option<Resource> {
        self.find(name, Some(library)).map(|meta| {
            let mut resource = self.to_resource(meta);
            resource.meta.content_type = Some(content_type.to_string());
            resource
        })
    }

    fn create_resource_from_id(&self, resource_id: &str) -> Option<Resource> {
        match resource_id.split_once('/') {
            Some((library, name)) => self.create_resource_in_library(name, library),
            None => self.create_resource(resource_id),
        }
    }

    fn create_view_resource(&self, _ctx: &RequestContext, name: &str) -> Option<ViewResource> {
        self.resources
            .iter()
            .find(|meta| meta.name == name)
            .map(|meta| ViewResource {
                path: meta.resource_id(),
            })
    }

    fn library_exists(&self, library: &str) -> bool {
        self.resources
            .iter()
            .any(|meta| meta.library.as_deref() == Some(library))
    }

    fn is_resource_request(&self, ctx: &RequestContext) -> bool {
        self.is_resource_url(&ctx.path)
    }

    fn is_resource_url(&self, url: &str) -> bool {
        url.starts_with(&self.prefix)
    }

    fn renderer_type_for_resource_name(&self, name: &str) -> Option<String> {
        let extension = name.rsplit_once('.')?.1;
        RENDERER_TYPES.get(extension).map(|t| t.to_string())
    }

    fn handle_resource_request(&self, ctx: &RequestContext) -> Result<(), TrelliumError> {
        if !self.is_resource_request(ctx) {
            return Err(TrelliumError::Resource {
                code: "RESOURCE_NOT_RESOURCE_REQUEST".to_string(),
                message: format!("'{}' is outside the resource prefix", ctx.path),
            });
        }

        let resource_id = &ctx.path[self.prefix.len()..];
        match self.create_resource_from_id(resource_id) {
            Some(resource) => {
                debug!("serving resource {}", resource.request_path);
                Ok(())
            }
            None => Err(TrelliumError::Resource {
                code: "RESOURCE_NOT_FOUND".to_string(),
                message: format!("no resource registered for id '{}'", resource_id),
            }),
        }
    }

    fn view_resources(&self, _ctx: &RequestContext, path: &str, max_depth: usize) -> Vec<String> {
        let base = path.trim_start_matches('/');
        self.resources
            .iter()
            .map(|meta| meta.resource_id())
            .filter(|id| {
                let Some(rest) = id.strip_prefix(base) else {
                    return false;
                };
                rest.trim_start_matches('/').split('/').count() <= max_depth
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn sample_handler() -> StaticResourceHandler {
        let mut handler = StaticResourceHandler::new("/trellium/resource/");
        handler.add_resource(ResourceMeta::new("index.css"));
        handler.add_resource(ResourceMeta::in_library("app.js", "scripts"));
        handler.add_resource(ResourceMeta::in_library("vendor.js", "scripts"));
        handler
    }

    #[test]
    fn test_create_resource_lookups() {
        let handler = sample_handler();

        assert!(handler.create_resource("index.css").is_some());
        assert!(handler.create_resource("app.js").is_none());

        let resource = handler
            .create_resource_in_library("app.js", "scripts")
            .unwrap();
        assert_eq!(resource.request_path, "/trellium/resource/scripts/app.js");

        let typed = handler
            .create_resource_with_content_type("app.js", "scripts", "text/javascript")
            .unwrap();
        assert_eq!(typed.meta.content_type.as_deref(), Some("text/javascript"));
    }

    #[test]
    fn test_create_resource_from_id() {
        let handler = sample_handler();

        assert!(handler.create_resource_from_id("index.css").is_some());
        assert!(handler.create_resource_from_id("scripts/app.js").is_some());
        assert!(handler.create_resource_from_id("scripts/missing.js").is_none());
    }

    #[test]
    fn test_library_and_url_checks() {
        let handler = sample_handler();

        assert!(handler.library_exists("scripts"));
        assert!(!handler.library_exists("themes"));
        assert!(handler.is_resource_url("/trellium/resource/index.css"));
        assert!(!handler.is_resource_url("/views/home"));
    }

    #[test]
    fn test_renderer_types() {
        let handler = sample_handler();

        assert_eq!(
            handler.renderer_type_for_resource_name("app.js").as_deref(),
            Some("trellium.resource.Script")
        );
        assert_eq!(
            handler
                .renderer_type_for_resource_name("styles.css")
                .as_deref(),
            Some("trellium.resource.Stylesheet")
        );
        assert!(handler.renderer_type_for_resource_name("logo.png").is_none());
        assert!(handler.renderer_type_for_resource_name("noext").is_none());
    }

    #[test]
    fn test_handle_resource_request() {
        let handler = sample_handler();

        let ok = RequestContext::new("/trellium/resource/scripts/app.js");
        assert!(handler.handle_resource_request(&ok).is_ok());

        let missing = RequestContext::new("/trellium/resource/ghost.css");
        assert!(matches!(
            handler.handle_resource_request(&missing),
            Err(TrelliumError::Resource { .. })
        ));

        let outside = RequestContext::new("/views/home");
        assert!(matches!(
            handler.handle_resource_request(&outside),
            Err(TrelliumError::Resource { .. })
        ));
    }

    #[test]
    fn test_view_resources_depth() {
        let handler = sample_handler();
        let ctx = RequestContext::new("/views/home");

        let shallow = handler.view_resources(&ctx, "/", 1);
        assert_eq!(shallow, vec!["index.css".to_string()]);

        let mut deep = handler.view_resources(&ctx, "/", 2);
        deep.sort();
        assert_eq!(
            deep,
            vec![
                "index.css".to_string(),
                "scripts/app.js".to_string(),
                "scripts/vendor.js".to_string()
            ]
        );
    }

    struct RecordingHandler {
        calls: Mutex<Vec<String>>,
    }

    impl RecordingHandler {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
            }
        }

        fn record(&self, call: &str) {
            self.calls.lock().push(call.to_string());
        }
    }

    impl ResourceHandler for RecordingHandler {
        fn create_resource(&self, _name: &str) -> Option<Resource> {
            self.record("create_resource");
            None
        }

        fn create_resource_in_library(&self, _name: &str, _library: &str) -> Option<Resource> {
            self.record("create_resource_in_library");
            None
        }

        fn create_resource_with_content_type(
            &self,
            _name: &str,
            _library: &str,
            _content_type: &str,
        ) -> Option<Resource> {
            self.record("create_resource_with_content_type");
            None
        }

        fn create_resource_from_id(&self, _resource_id: &str) -> Option<Resource> {
            self.record("create_resource_from_id");
            None
        }

        fn create_view_resource(
            &self,
            _ctx: &RequestContext,
            _name: &str,
        ) -> Option<ViewResource> {
            self.record("create_view_resource");
            None
        }

        fn library_exists(&self, _library: &str) -> bool {
            self.record("library_exists");
            false
        }

        fn is_resource_request(&self, _ctx: &RequestContext) -> bool {
            self.record("is_resource_request");
            false
        }

        fn is_resource_url(&self, _url: &str) -> bool {
            self.record("is_resource_url");
            false
        }

        fn renderer_type_for_resource_name(&self, _name: &str) -> Option<String> {
            self.record("renderer_type_for_resource_name");
            None
        }

        fn handle_resource_request(&self, _ctx: &RequestContext) -> Result<(), TrelliumError> {
            self.record("handle_resource_request");
            Ok(())
        }

        fn view_resources(
            &self,
            _ctx: &RequestContext,
            _path: &str,
            _max_depth: usize,
        ) -> Vec<String> {
            self.record("view_resources");
            Vec::new()
        }
    }

    #[test]
    fn test_wrapper_forwards_every_operation() {
        let delegate = Arc::new(RecordingHandler::new());
        let wrapper = ResourceHandlerWrapper::new(Arc::clone(&delegate) as Arc<dyn ResourceHandler>);
        let ctx = RequestContext::new("/trellium/resource/app.js");

        wrapper.create_resource("a");
        wrapper.create_resource_in_library("a", "lib");
        wrapper.create_resource_with_content_type("a", "lib", "text/css");
        wrapper.create_resource_from_id("lib/a");
        wrapper.create_view_resource(&ctx, "a");
        wrapper.library_exists("lib");
        wrapper.is_resource_request(&ctx);
        wrapper.is_resource_url("/x");
        wrapper.renderer_type_for_resource_name("a.js");
        wrapper.handle_resource_request(&ctx).unwrap();
        wrapper.view_resources(&ctx, "/", 1);

        assert_eq!(
            *delegate.calls.lock(),
            vec![
                "create_resource",
                "create_resource_in_library",
                "create_resource_with_content_type",
                "create_resource_from_id",
                "create_view_resource",
                "library_exists",
                "is_resource_request",
                "is_resource_url",
                "renderer_type_for_resource_name",
                "handle_resource_request",
                "view_resources"
            ]
        );
    }
}
