//! # Controller Trait
//!
//! The contract every controller implements to be driven by the
//! [`Dispatcher`](crate::framework::Dispatcher).
//!
//! # Architecture Note
//! There is no controller base class to inherit from. A controller is any type
//! implementing [`Controller`]; the only thing it gets from the framework is the
//! [`Render`] capability passed into each action. That capability takes a view
//! name and a [`ViewContext`] and nothing else, so there is no way for an action
//! to make data visible to a template except by binding it explicitly.
//!
//! # Provided Methods (Hooks)
//! - [`Controller::before_action`] runs before the action; an error skips it.
//! - [`Controller::after_action`] runs after a successful action; an error
//!   discards the output.
//!
//! Both default to `Ok(())`.

use crate::framework::context::{RequestParams, ViewContext};
use crate::framework::error::{ContextError, RenderError};
use async_trait::async_trait;
use std::fmt::{self, Debug};
use std::str::FromStr;

/// Rendered text produced by a view.
///
/// An `Output` can only be built by a renderer, so an action cannot return
/// text that skipped the data-binding step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    view: String,
    body: String,
}

impl Output {
    pub(crate) fn new(view: impl Into<String>, body: String) -> Self {
        Self {
            view: view.into(),
            body,
        }
    }

    /// Name of the view that produced this output.
    pub fn view(&self) -> &str {
        &self.view
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn into_body(self) -> String {
        self.body
    }
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.body)
    }
}

/// The capability to turn a named view plus its data into [`Output`].
///
/// Implemented by [`ViewEngine`](crate::framework::view::ViewEngine) and by
/// [`MockRenderer`](crate::framework::mock::MockRenderer) for tests.
pub trait Render: Send + Sync {
    fn render(&self, view: &str, data: &ViewContext) -> Result<Output, RenderError>;
}

/// Why an action did not produce output.
#[derive(Debug, thiserror::Error)]
pub enum ActionError<E> {
    /// Rendering failed; the dispatcher reports the render error as-is.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// The action could not build its view context.
    #[error(transparent)]
    Context(#[from] ContextError),

    /// The action's own logic failed.
    #[error(transparent)]
    Failed(E),
}

/// Trait that any controller must implement to be registered with the dispatcher.
///
/// # Request Isolation
/// The dispatcher calls [`Controller::new`] once per request and drops the
/// instance when the request ends. Anything longer-lived (a data source, a
/// client) belongs in [`Controller::Context`], which is shared read-only
/// between requests.
#[async_trait]
pub trait Controller: Send + Sized + 'static {
    /// The actions this controller answers to, parsed from the route's action name.
    /// A parse failure is reported as `UnknownAction`.
    type Action: FromStr + Debug + Clone + Send + Sync;

    /// Dependencies injected at registration time. Use `()` if none are needed.
    type Context: Send + Sync + 'static;

    /// The error type for this controller's actions.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Action names this controller declares, for route listings.
    const ACTIONS: &'static [&'static str];

    /// Builds a fresh instance for one request.
    fn new(ctx: &Self::Context) -> Self;

    // --- Lifecycle Hooks ---

    async fn before_action(
        &mut self,
        _action: &Self::Action,
        _params: &RequestParams,
    ) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Runs the action and renders its view.
    async fn handle_action(
        &mut self,
        action: Self::Action,
        params: RequestParams,
        views: &dyn Render,
    ) -> Result<Output, ActionError<Self::Error>>;

    async fn after_action(
        &mut self,
        _action: &Self::Action,
        _output: &Output,
    ) -> Result<(), Self::Error> {
        Ok(())
    }
}
