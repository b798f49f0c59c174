//! # MVC Recipe
//!
//! > **A Recipe for request dispatch and view rendering in Rust.**
//!
//! A request names a controller and an action. The [`Dispatcher`](framework::Dispatcher)
//! finds the controller, builds a fresh instance of it, runs the action, and the
//! action renders a named view with the data it bound explicitly. Either rendered
//! text comes back, or one structured [`FrameworkError`](framework::FrameworkError).
//!
//! ## 🏗️ Design Notes
//!
//! ### 1. No implicit view data
//! A view sees exactly the keys the action put in its
//! [`ViewContext`](framework::ViewContext). Referencing anything else is an
//! `UndefinedVariable` error, never an empty string.
//!
//! ### 2. Controllers are traits, not base classes
//! [`Controller`](framework::Controller) has associated `Action`, `Context` and
//! `Error` types and async `before_action`/`after_action` hooks. The only framework
//! facility an action receives is the [`Render`](framework::Render) capability.
//!
//! ### 3. Request isolation
//! One controller instance and one `ViewContext` per request. The route table and
//! the compiled-view cache are the only shared state; both are read-mostly and
//! replaced by swapping an `Arc`.
//!
//! ### 4. Observability
//! `tracing` spans per dispatch and per render. See [`lifecycle::tracing`].
//!
//! ## 🗺️ Module Tour
//!
//! - [`framework`]: dispatcher, controller trait, view resolution and rendering, errors.
//! - [`model`]: plain data handed to views ([`User`](model::User)).
//! - [`user_controller`]: the `user` controller with `index` and `show`.
//! - [`lifecycle`]: settings, the [`App`](lifecycle::App) orchestrator, tracing setup.
//!
//! ## 🚀 Running the Demo
//!
//! ```bash
//! RUST_LOG=info cargo run -- user/index
//! ```

pub mod framework;
pub mod lifecycle;
pub mod model;
pub mod user_controller;
