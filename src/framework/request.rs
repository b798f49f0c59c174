//! # Request Lifecycle
//!
//! The state machine every dispatched request walks through:
//!
//! ```text
//! Received -> Resolved -> Instantiated -> ActionExecuting
//!     ActionExecuting -> Rendering -> Rendered -> Responded
//!     any non-terminal state -> Failed
//! ```
//!
//! `Responded` and `Failed` are terminal. There are no retries at this layer.

use crate::framework::error::FrameworkError;
use tracing::debug;

/// One stage of a request's life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Received,
    Resolved,
    Instantiated,
    ActionExecuting,
    Rendering,
    Rendered,
    Failed,
    Responded,
}

impl RequestState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RequestState::Failed | RequestState::Responded)
    }

    fn can_advance_to(self, next: RequestState) -> bool {
        use RequestState::*;
        match (self, next) {
            (from, Failed) => !from.is_terminal(),
            (Received, Resolved)
            | (Resolved, Instantiated)
            | (Instantiated, ActionExecuting)
            | (ActionExecuting, Rendering)
            | (Rendering, Rendered)
            // An action may render more than once (e.g. a fragment, then the page).
            | (Rendered, Rendering)
            | (Rendered, Responded) => true,
            _ => false,
        }
    }
}

/// Tracks the current state of one request and the path it took to get there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLifecycle {
    history: Vec<RequestState>,
}

impl Default for RequestLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestLifecycle {
    pub fn new() -> Self {
        Self {
            history: vec![RequestState::Received],
        }
    }

    pub fn state(&self) -> RequestState {
        // history is never empty: it starts with Received and only grows
        self.history
            .last()
            .copied()
            .unwrap_or(RequestState::Received)
    }

    pub fn history(&self) -> &[RequestState] {
        &self.history
    }

    /// Moves to `next`, rejecting transitions the state machine does not allow.
    pub fn advance(&mut self, next: RequestState) -> Result<(), FrameworkError> {
        let from = self.state();
        if !from.can_advance_to(next) {
            return Err(FrameworkError::IllegalTransition { from, to: next });
        }
        debug!(?from, to = ?next, "Request transition");
        self.history.push(next);
        Ok(())
    }

    /// Moves to `Failed` unless the request already reached a terminal state.
    pub fn fail(&mut self) {
        if !self.state().is_terminal() {
            debug!(from = ?self.state(), "Request failed");
            self.history.push(RequestState::Failed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RequestState::*;
    use super::*;

    #[test]
    fn walks_the_happy_path() {
        let mut lifecycle = RequestLifecycle::new();
        for next in [Resolved, Instantiated, ActionExecuting, Rendering, Rendered, Responded] {
            lifecycle.advance(next).unwrap();
        }
        assert_eq!(lifecycle.state(), Responded);
        assert_eq!(lifecycle.history().len(), 7);
    }

    #[test]
    fn allows_rendering_twice() {
        let mut lifecycle = RequestLifecycle::new();
        for next in [Resolved, Instantiated, ActionExecuting, Rendering, Rendered, Rendering, Rendered] {
            lifecycle.advance(next).unwrap();
        }
        assert_eq!(lifecycle.state(), Rendered);
    }

    #[test]
    fn rejects_skipping_stages() {
        let mut lifecycle = RequestLifecycle::new();
        let err = lifecycle.advance(ActionExecuting).unwrap_err();
        assert!(matches!(
            err,
            FrameworkError::IllegalTransition { from: Received, to: ActionExecuting }
        ));
        assert_eq!(lifecycle.state(), Received);
    }

    #[test]
    fn action_must_render_before_responding() {
        let mut lifecycle = RequestLifecycle::new();
        for next in [Resolved, Instantiated, ActionExecuting] {
            lifecycle.advance(next).unwrap();
        }
        assert!(lifecycle.advance(Responded).is_err());
    }

    #[test]
    fn terminal_states_are_final() {
        let mut lifecycle = RequestLifecycle::new();
        lifecycle.fail();
        assert_eq!(lifecycle.state(), Failed);
        assert!(lifecycle.advance(Resolved).is_err());
        assert!(lifecycle.advance(Failed).is_err());

        lifecycle.fail();
        assert_eq!(lifecycle.history(), &[Received, Failed]);
    }
}
