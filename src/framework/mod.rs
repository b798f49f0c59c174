//! Generic dispatch-and-render framework.
//!
//! This module provides the building blocks every controller in the
//! application is built on: routing a request to an action, giving the action
//! a way to render a view, and turning the view plus its data into text.
//!
//! # Main Components
//!
//! - [`Controller`] - Trait that controller types implement to be dispatched to
//! - [`Dispatcher`] / [`Routes`] - Controller registry and request entry point
//! - [`Render`] - The render capability handed to actions
//! - [`view`] - View resolution, template compilation and rendering
//! - [`ViewContext`] - The data an action binds for its view
//! - [`FrameworkError`] - Everything that can go wrong with a request
//!
//! # Testing
//!
//! See [`mock`] module for utilities to test controllers without templates.

pub mod context;
pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod mock;
pub mod request;
pub mod view;

// Re-export core types for convenience
pub use context::{RequestParams, RouteTarget, ViewContext, DEFAULT_ACTION};
pub use controller::{ActionError, Controller, Output, Render};
pub use dispatcher::{Dispatcher, Handled, Routes, RoutesBuilder};
pub use error::{BoxError, ContextError, FrameworkError, RenderError};
pub use request::{RequestLifecycle, RequestState};
pub use view::ViewEngine;
