//! View name resolution.
//!
//! [`ViewResolver`] maps logical names like `"user/index"` to compiled
//! templates. Compiled templates are kept in a process-wide table that is
//! read concurrently and replaced wholesale: readers take a snapshot of the
//! current `Arc`, writers swap in a new one, so no reader ever sees a
//! half-updated table.
//!
//! Every [`ViewResolver::reload`] starts a new generation. A compilation only
//! enters the table if no reload happened since it started reading the store.

use super::store::TemplateStore;
use super::template::Template;
use crate::framework::error::RenderError;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

/// Checks the `"<area>/<name>"` convention: one or more `/`-separated
/// segments of ASCII letters, digits, `_` or `-`.
pub fn is_valid_view_name(name: &str) -> bool {
    !name.is_empty()
        && name.split('/').all(|segment| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        })
}

/// A resolved, compiled view.
///
/// Cheap to clone. Two handles are equal when they name the same view and
/// were compiled from the same source.
#[derive(Clone)]
pub struct TemplateHandle {
    name: Arc<str>,
    template: Arc<Template>,
}

impl TemplateHandle {
    pub fn new(name: &str, template: Template) -> Self {
        Self {
            name: Arc::from(name),
            template: Arc::new(template),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template(&self) -> &Template {
        &self.template
    }
}

impl PartialEq for TemplateHandle {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && (Arc::ptr_eq(&self.template, &other.template)
                || self.template.source() == other.template.source())
    }
}

impl Eq for TemplateHandle {}

impl fmt::Debug for TemplateHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateHandle")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

type TemplateTable = HashMap<String, TemplateHandle>;

#[derive(Clone, Default)]
struct Cache {
    generation: u64,
    views: Arc<TemplateTable>,
}

/// Resolves view names against a [`TemplateStore`], compiling each view once.
pub struct ViewResolver {
    store: Arc<dyn TemplateStore>,
    cache: RwLock<Cache>,
}

impl ViewResolver {
    pub fn new(store: Arc<dyn TemplateStore>) -> Self {
        Self {
            store,
            cache: RwLock::new(Cache::default()),
        }
    }

    /// Resolves `name` to a compiled template.
    ///
    /// Fails with `ViewNotFound` for names that break the naming convention or
    /// have no backing resource.
    pub fn resolve(&self, name: &str) -> Result<TemplateHandle, RenderError> {
        if !is_valid_view_name(name) {
            return Err(RenderError::ViewNotFound(name.to_string()));
        }
        let started = self.snapshot();
        if let Some(handle) = started.views.get(name) {
            debug!(view = name, "Resolved from cache");
            return Ok(handle.clone());
        }

        let source = self
            .store
            .load(name)
            .map_err(|e| RenderError::Store {
                view: name.to_string(),
                message: e.to_string(),
            })?
            .ok_or_else(|| RenderError::ViewNotFound(name.to_string()))?;
        let handle = TemplateHandle::new(name, Template::compile(name, source)?);

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        if cache.generation != started.generation {
            // Reloaded while this source was read; it may already be stale.
            debug!(view = name, "Compiled view not cached, views were reloaded");
            return Ok(handle);
        }
        // Another request may have compiled the same view meanwhile; keep theirs.
        if let Some(existing) = cache.views.get(name) {
            return Ok(existing.clone());
        }
        Arc::make_mut(&mut cache.views).insert(name.to_string(), handle.clone());
        debug!(view = name, cached = cache.views.len(), "Compiled view");
        Ok(handle)
    }

    /// Compiles `names` up front so the first request does not pay for it.
    pub fn preload<I, S>(&self, names: I) -> Result<(), RenderError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.resolve(name.as_ref())?;
        }
        Ok(())
    }

    /// Drops every compiled template; the next resolution reads the store again.
    pub fn reload(&self) {
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        cache.generation += 1;
        cache.views = Arc::new(TemplateTable::new());
        info!(generation = cache.generation, "View cache cleared");
    }

    /// Names of the views compiled so far, sorted.
    pub fn cached_views(&self) -> Vec<String> {
        let mut names: Vec<String> = self.snapshot().views.keys().cloned().collect();
        names.sort();
        names
    }

    fn snapshot(&self) -> Cache {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl fmt::Debug for ViewResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewResolver")
            .field("cached_views", &self.cached_views())
            .finish_non_exhaustive()
    }
}
