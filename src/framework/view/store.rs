//! Template storage backends.
//!
//! A [`TemplateStore`] only answers "what is the source text for this logical
//! view name". Where the text lives is up to the implementation.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

/// Source of raw template text, keyed by logical view name (`"user/index"`).
pub trait TemplateStore: Send + Sync {
    /// Returns `Ok(None)` when no resource exists for `name`.
    fn load(&self, name: &str) -> io::Result<Option<String>>;
}

/// Loads `area/name` from `<root>/area/name.<extension>`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    extension: String,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        let extension = extension.into();
        Self {
            root: root.into(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Physical path for a logical view name. Callers validate the name first.
    pub fn path_for(&self, name: &str) -> PathBuf {
        let mut path = self.root.clone();
        path.extend(name.split('/'));
        if !self.extension.is_empty() {
            path.set_extension(&self.extension);
        }
        path
    }
}

impl TemplateStore for FileStore {
    fn load(&self, name: &str) -> io::Result<Option<String>> {
        match std::fs::read_to_string(self.path_for(name)) {
            Ok(source) => Ok(Some(source)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// In-memory templates, for tests and templates compiled into the binary.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    templates: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.templates.insert(name.into(), source.into());
        self
    }
}

impl TemplateStore for MemoryStore {
    fn load(&self, name: &str) -> io::Result<Option<String>> {
        Ok(self.templates.get(name).cloned())
    }
}
