//! Fetching image bytes for `<img src>`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::error::{PageError, PageResult};

/// Fetched bytes plus whether they came from another origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub bytes: Vec<u8>,
    pub cross_origin: bool,
}

impl Resource {
    pub fn same_origin(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            cross_origin: false,
        }
    }

    pub fn cross_origin(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            cross_origin: true,
        }
    }
}

/// Resolves a `src` attribute to bytes.
pub trait ResourceLoader {
    fn load(&self, src: &str) -> PageResult<Resource>;
}

/// In-memory resources keyed by the exact `src` string.
#[derive(Debug, Default, Clone)]
pub struct MemoryResources {
    entries: HashMap<String, Resource>,
}

impl MemoryResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, src: impl Into<String>, resource: Resource) {
        self.entries.insert(src.into(), resource);
    }

    pub fn with(mut self, src: impl Into<String>, resource: Resource) -> Self {
        self.insert(src, resource);
        self
    }
}

impl ResourceLoader for MemoryResources {
    fn load(&self, src: &str) -> PageResult<Resource> {
        self.entries
            .get(src)
            .cloned()
            .ok_or_else(|| PageError::ResourceNotFound(src.to_string()))
    }
}

/// Resolves relative `src` values against a directory.
///
/// Absolute `http(s)://` URLs are looked up under `<root>/<host>/<path>` and
/// flagged cross-origin; when no such file exists they are not found.
#[derive(Debug, Clone)]
pub struct DirResources {
    root: PathBuf,
}

impl DirResources {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, src: &str) -> (PathBuf, bool) {
        let src = src.split(['?', '#']).next().unwrap_or(src);
        for scheme in ["https://", "http://"] {
            if let Some(rest) = src.strip_prefix(scheme) {
                return (self.root.join(rest.trim_start_matches('/')), true);
            }
        }
        (self.root.join(src.trim_start_matches('/')), false)
    }
}

impl ResourceLoader for DirResources {
    fn load(&self, src: &str) -> PageResult<Resource> {
        let (path, cross_origin) = self.resolve(src);
        if !path.starts_with(&self.root) || path.components().any(|c| c.as_os_str() == "..") {
            return Err(PageError::ResourceNotFound(src.to_string()));
        }
        let bytes = std::fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PageError::ResourceNotFound(src.to_string()),
            _ => PageError::Io(e),
        })?;
        trace!(src, path = %path.display(), cross_origin, "loaded resource");
        Ok(Resource {
            bytes,
            cross_origin,
        })
    }
}
