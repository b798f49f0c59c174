//! # Views
//!
//! Everything between "an action wants view `user/index` with this data" and
//! the rendered text:
//!
//! - [`store`]: where template source comes from ([`FileStore`], [`MemoryStore`]).
//! - [`template`]: the compiler for the template syntax.
//! - [`resolver`]: logical name to compiled template, with a shared cache.
//! - [`renderer`]: executes a compiled template against a [`ViewContext`].
//!
//! [`ViewEngine`] ties them together and is what controllers see, through the
//! [`Render`] capability.
//!
//! ## Template Syntax
//!
//! ```text
//! {{ user.name }}                      escaped value
//! {{{ user.bio }}}                     raw value
//! {{#each users as user}}...{{/each}}  loop over a list
//! {{#if user.admin}}...{{else}}...{{/if}}
//! {{> user/row}}                       include another view
//! {{! comment }}
//! ```
//!
//! Blocks nest at most [`MAX_BLOCK_DEPTH`] deep; partials at most
//! [`DEFAULT_MAX_PARTIAL_DEPTH`] unless configured otherwise.

pub mod renderer;
pub mod resolver;
pub mod store;
pub mod template;

pub use renderer::{Renderer, DEFAULT_MAX_PARTIAL_DEPTH};
pub use resolver::{is_valid_view_name, TemplateHandle, ViewResolver};
pub use store::{FileStore, MemoryStore, TemplateStore};
pub use template::{Template, MAX_BLOCK_DEPTH};

use crate::framework::context::ViewContext;
use crate::framework::controller::{Output, Render};
use crate::framework::error::RenderError;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Resolver plus renderer: the production [`Render`] implementation.
#[derive(Debug)]
pub struct ViewEngine {
    resolver: Arc<ViewResolver>,
    renderer: Renderer,
}

impl ViewEngine {
    pub fn new(store: Arc<dyn TemplateStore>) -> Self {
        let resolver = Arc::new(ViewResolver::new(store));
        let renderer = Renderer::new(Arc::clone(&resolver));
        Self { resolver, renderer }
    }

    pub fn with_max_partial_depth(mut self, depth: usize) -> Self {
        self.renderer = self.renderer.with_max_partial_depth(depth);
        self
    }

    pub fn resolver(&self) -> &ViewResolver {
        &self.resolver
    }
}

impl Render for ViewEngine {
    #[instrument(skip(self, data), fields(keys = data.len()))]
    fn render(&self, view: &str, data: &ViewContext) -> Result<Output, RenderError> {
        let handle = self.resolver.resolve(view)?;
        let body = self.renderer.render(&handle, data)?;
        debug!(bytes = body.len(), "Rendered");
        Ok(Output::new(view, body))
    }
}
