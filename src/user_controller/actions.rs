//! Actions of the User controller.
//!
//! Each variant maps to one route action name; see
//! [`impl Controller for UserController`](super::UserController#impl-Controller-for-UserController)
//! for what they render.

use super::error::UserError;
use std::str::FromStr;

/// Actions the `user` controller answers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    /// Lists every user. Renders `user/index` with `users` and `count`.
    Index,
    /// Shows the user whose email matches the `email` parameter.
    /// Renders `user/show` with `user`.
    Show,
}

impl UserAction {
    pub const ALL: &'static [&'static str] = &["index", "show"];
}

impl FromStr for UserAction {
    type Err = UserError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "index" => Ok(UserAction::Index),
            "show" => Ok(UserAction::Show),
            other => Err(UserError::UnknownAction(other.to_string())),
        }
    }
}
