//! Pure data structures that controllers build and bind into a [`ViewContext`](crate::framework::ViewContext).

pub mod user;

pub use user::*;
