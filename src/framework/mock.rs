//! # Mock Framework
//!
//! Utilities for testing controllers without templates.
//!
//! [`MockRenderer`] implements [`Render`], so it can be passed straight into
//! [`Controller::handle_action`](crate::framework::Controller::handle_action) or
//! given to a [`Dispatcher`](crate::framework::Dispatcher) in place of a
//! [`ViewEngine`](crate::framework::view::ViewEngine). Queue the renders you expect
//! with [`MockRenderer::expect_render`], run the code under test, then inspect
//! what was bound with [`MockRenderer::calls`] and finish with
//! [`MockRenderer::verify`].
//!
//! This module is compiled into the library rather than behind `#[cfg(test)]`
//! so integration tests in `tests/` can use it.

use crate::framework::context::ViewContext;
use crate::framework::controller::{Output, Render};
use crate::framework::error::RenderError;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

/// An expected render call and the response to give it.
struct Expectation {
    view: String,
    response: Result<String, RenderError>,
}

/// One render call received by the mock.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderCall {
    pub view: String,
    pub data: ViewContext,
}

/// A [`Render`] implementation with expectation tracking.
///
/// # Example
/// ```ignore
/// let mut views = MockRenderer::new();
/// views.expect_render("user/index").return_ok("<ul>...</ul>");
///
/// let output = controller.handle_action(UserAction::Index, params, &views).await?;
///
/// assert!(views.calls()[0].data.contains_key("users"));
/// views.verify(); // Ensures all expectations were met
/// ```
#[derive(Clone, Default)]
pub struct MockRenderer {
    expectations: Arc<Mutex<VecDeque<Expectation>>>,
    calls: Arc<Mutex<Vec<RenderCall>>>,
}

impl MockRenderer {
    /// Creates a new mock renderer with no expectations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Expects a render of `view`. Expectations are consumed in order.
    pub fn expect_render(&mut self, view: impl Into<String>) -> RenderExpectationBuilder {
        RenderExpectationBuilder {
            view: view.into(),
            expectations: self.expectations.clone(),
        }
    }

    /// Every render call received so far, in order.
    pub fn calls(&self) -> Vec<RenderCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let exps = self.expectations.lock().unwrap();
        if !exps.is_empty() {
            let pending: Vec<&str> = exps.iter().map(|e| e.view.as_str()).collect();
            panic!("Not all expectations were met. Pending renders: {pending:?}");
        }
    }
}

impl Render for MockRenderer {
    fn render(&self, view: &str, data: &ViewContext) -> Result<Output, RenderError> {
        self.calls.lock().unwrap().push(RenderCall {
            view: view.to_string(),
            data: data.clone(),
        });

        let expectation = self.expectations.lock().unwrap().pop_front();
        match expectation {
            Some(Expectation { view: expected, response }) if expected == view => {
                response.map(|body| Output::new(view, body))
            }
            Some(Expectation { view: expected, .. }) => {
                panic!("Expected render of `{expected}`, got `{view}`")
            }
            None => panic!("Unexpected render of `{view}`"),
        }
    }
}

/// Builder for render expectations.
pub struct RenderExpectationBuilder {
    view: String,
    expectations: Arc<Mutex<VecDeque<Expectation>>>,
}

impl RenderExpectationBuilder {
    /// Sets the expectation to return `body` as the rendered output.
    pub fn return_ok(self, body: impl Into<String>) {
        let mut exps = self.expectations.lock().unwrap();
        exps.push_back(Expectation {
            view: self.view,
            response: Ok(body.into()),
        });
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: RenderError) {
        let mut exps = self.expectations.lock().unwrap();
        exps.push_back(Expectation {
            view: self.view,
            response: Err(error),
        });
    }
}
