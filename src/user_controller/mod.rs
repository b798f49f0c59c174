//! User controller: lists users and shows one user.

pub mod actions;
pub mod controller;
pub mod directory;
pub mod error;

pub use actions::UserAction;
pub use directory::*;
pub use error::*;

use crate::framework::RoutesBuilder;
use std::sync::Arc;

/// Route name the controller is registered under.
pub const NAME: &str = "user";

/// Dependencies shared by every [`UserController`] instance.
#[derive(Clone)]
pub struct UserContext {
    directory: Arc<dyn UserDirectory>,
}

impl UserContext {
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self { directory }
    }
}

/// Per-request controller for the `user` routes.
pub struct UserController {
    directory: Arc<dyn UserDirectory>,
}

/// Registers the User controller under [`NAME`].
pub fn register(routes: RoutesBuilder, directory: Arc<dyn UserDirectory>) -> RoutesBuilder {
    routes.controller::<UserController>(NAME, UserContext::new(directory))
}
