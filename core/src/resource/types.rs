use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceMeta {
    pub name: String,
    pub library: Option<String>,
    pub content_type: Option<String>,
}

impl ResourceMeta {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            library: None,
            content_type: None,
        }
    }

    pub fn in_library(name: &str, library: &str) -> Self {
        Self {
            name: name.to_string(),
            library: Some(library.to_string()),
            content_type: None,
        }
    }

    /// `library/name` when the resource lives in a library, else `name`.
    pub fn resource_id(&self) -> String {
        match &self.library {
            Some(library) => format!("{}/{}", library, self.name),
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub meta: ResourceMeta,
    pub request_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewResource {
    pub path: String,
}

/// Minimal per-request view passed to request-classification operations.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub path: String,
}

impl RequestContext {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
        }
    }
}
