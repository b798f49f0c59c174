//! # Framework Errors
//!
//! Every failure the dispatch-and-render pipeline can report. All of them are
//! terminal for the request that hit them: nothing here is retried, and no
//! layer turns one of these into a successful-looking response.

use crate::framework::request::RequestState;

/// Boxed error returned by an action, opaque to the framework.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by the [`Dispatcher`](crate::framework::Dispatcher).
#[derive(Debug, thiserror::Error)]
pub enum FrameworkError {
    #[error("Unknown controller: {0}")]
    UnknownController(String),

    #[error("Unknown action `{action}` on controller `{controller}`")]
    UnknownAction { controller: String, action: String },

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Action `{controller}/{action}` failed: {source}")]
    ActionFailure {
        controller: String,
        action: String,
        #[source]
        source: BoxError,
    },

    #[error("Invalid route: {0:?}")]
    InvalidRoute(String),

    #[error("Controller registered twice: {0}")]
    DuplicateController(String),

    #[error("Illegal request transition {from:?} -> {to:?}")]
    IllegalTransition { from: RequestState, to: RequestState },
}

impl FrameworkError {
    /// The render error behind this failure, if rendering is what failed.
    pub fn as_render(&self) -> Option<&RenderError> {
        match self {
            FrameworkError::Render(e) => Some(e),
            _ => None,
        }
    }
}

/// Errors raised while resolving or executing a view.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderError {
    #[error("View not found: {0}")]
    ViewNotFound(String),

    #[error("Undefined variable `{name}` in view `{view}`")]
    UndefinedVariable { view: String, name: String },

    #[error("Template syntax error in `{view}` at line {line}: {message}")]
    TemplateSyntax {
        view: String,
        line: usize,
        message: String,
    },

    #[error("Variable `{name}` in view `{view}` is a list or object and cannot be printed")]
    NotRenderable { view: String, name: String },

    #[error("Variable `{name}` in view `{view}` is not a list")]
    NotIterable { view: String, name: String },

    #[error("Partials nested deeper than {limit} levels in view `{view}`")]
    PartialDepthExceeded { view: String, limit: usize },

    #[error("Template store error for `{view}`: {message}")]
    Store { view: String, message: String },
}

/// Errors raised while an action builds its [`ViewContext`](crate::framework::ViewContext).
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("Key already bound in view context: {0}")]
    DuplicateKey(String),

    #[error("Could not bind `{key}`: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}
