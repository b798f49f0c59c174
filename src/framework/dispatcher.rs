//! # Dispatcher
//!
//! Routes a request to a controller action and returns what the action rendered.
//!
//! # Architecture Note
//! The route table ([`Routes`]) is plain configuration: built once at startup,
//! then shared read-only by every request. Controllers of different types sit
//! behind one private `Endpoint` trait so the table can hold them side by side;
//! each endpoint knows how to parse its controller's action names, build a
//! fresh controller and run the hooks in order.
//!
//! ## Per-request flow
//!
//! 1. Look up the controller name (`UnknownController` if absent).
//! 2. Parse the action name (`UnknownAction` if the controller has no such action).
//! 3. `Controller::new` builds a fresh instance.
//! 4. `before_action`, `handle_action`, `after_action`.
//! 5. Return the rendered [`Output`], or the first failure.
//!
//! Every render call made during the request goes through a per-request
//! wrapper. If any of them failed, the request fails with that error even when
//! the action caught it and returned something else.

use crate::framework::context::{RequestParams, RouteTarget, ViewContext};
use crate::framework::controller::{ActionError, Controller, Output, Render};
use crate::framework::error::{BoxError, FrameworkError, RenderError};
use crate::framework::request::{RequestLifecycle, RequestState};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::{info, info_span, warn, Instrument};

// =============================================================================
// ENDPOINTS
// =============================================================================

#[async_trait]
trait Endpoint: Send + Sync {
    fn actions(&self) -> &'static [&'static str];

    async fn invoke(
        &self,
        target: &RouteTarget,
        params: RequestParams,
        views: &RequestViews<'_>,
    ) -> Result<Output, FrameworkError>;
}

struct ControllerEndpoint<C: Controller> {
    context: C::Context,
    _controller: PhantomData<fn() -> C>,
}

#[async_trait]
impl<C: Controller> Endpoint for ControllerEndpoint<C> {
    fn actions(&self) -> &'static [&'static str] {
        C::ACTIONS
    }

    async fn invoke(
        &self,
        target: &RouteTarget,
        params: RequestParams,
        views: &RequestViews<'_>,
    ) -> Result<Output, FrameworkError> {
        let action: C::Action =
            target
                .action()
                .parse()
                .map_err(|_| FrameworkError::UnknownAction {
                    controller: target.controller().to_string(),
                    action: target.action().to_string(),
                })?;
        views.advance(RequestState::Resolved)?;

        let mut controller = C::new(&self.context);
        views.advance(RequestState::Instantiated)?;

        let failure = |source: BoxError| FrameworkError::ActionFailure {
            controller: target.controller().to_string(),
            action: target.action().to_string(),
            source,
        };

        views.advance(RequestState::ActionExecuting)?;
        controller
            .before_action(&action, &params)
            .await
            .map_err(|e| failure(Box::new(e)))?;

        let output = match controller.handle_action(action.clone(), params, views).await {
            Ok(output) => output,
            Err(ActionError::Render(e)) => return Err(FrameworkError::Render(e)),
            Err(ActionError::Context(e)) => return Err(failure(Box::new(e))),
            Err(ActionError::Failed(e)) => return Err(failure(Box::new(e))),
        };

        controller
            .after_action(&action, &output)
            .await
            .map_err(|e| failure(Box::new(e)))?;
        Ok(output)
    }
}

// =============================================================================
// PER-REQUEST RENDER TRACKING
// =============================================================================

/// The [`Render`] handed to actions: forwards to the real views while
/// recording lifecycle transitions and the first failure.
struct RequestViews<'a> {
    views: &'a dyn Render,
    lifecycle: Mutex<RequestLifecycle>,
    failure: Mutex<Option<FrameworkError>>,
}

impl<'a> RequestViews<'a> {
    fn new(views: &'a dyn Render) -> Self {
        Self {
            views,
            lifecycle: Mutex::new(RequestLifecycle::new()),
            failure: Mutex::new(None),
        }
    }

    fn advance(&self, next: RequestState) -> Result<(), FrameworkError> {
        self.lifecycle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .advance(next)
    }

    fn fail(&self) {
        self.lifecycle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .fail();
    }

    fn record_failure(&self, error: FrameworkError) {
        let mut failure = self.failure.lock().unwrap_or_else(PoisonError::into_inner);
        if failure.is_none() {
            *failure = Some(error);
        }
    }

    fn take_failure(&self) -> Option<FrameworkError> {
        self.failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    fn into_lifecycle(self) -> RequestLifecycle {
        self.lifecycle
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Render for RequestViews<'_> {
    fn render(&self, view: &str, data: &ViewContext) -> Result<Output, RenderError> {
        if let Err(e) = self.advance(RequestState::Rendering) {
            self.record_failure(e);
        }
        match self.views.render(view, data) {
            Ok(output) => {
                if let Err(e) = self.advance(RequestState::Rendered) {
                    self.record_failure(e);
                }
                Ok(output)
            }
            Err(e) => {
                self.record_failure(FrameworkError::Render(e.clone()));
                Err(e)
            }
        }
    }
}

// =============================================================================
// ROUTE TABLE
// =============================================================================

/// Immutable table of registered controllers.
#[derive(Clone, Default)]
pub struct Routes {
    endpoints: HashMap<String, Arc<dyn Endpoint>>,
}

impl Routes {
    pub fn builder() -> RoutesBuilder {
        RoutesBuilder::default()
    }

    /// Registered controller names, sorted.
    pub fn controllers(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.endpoints.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Action names declared by `controller`.
    pub fn actions(&self, controller: &str) -> Option<&'static [&'static str]> {
        self.endpoints.get(controller).map(|endpoint| endpoint.actions())
    }

    pub fn contains(&self, controller: &str) -> bool {
        self.endpoints.contains_key(controller)
    }

    fn endpoint(&self, controller: &str) -> Option<&Arc<dyn Endpoint>> {
        self.endpoints.get(controller)
    }
}

impl fmt::Debug for Routes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Routes")
            .field("controllers", &self.controllers())
            .finish()
    }
}

/// Collects controller registrations for a [`Routes`] table.
#[derive(Default)]
pub struct RoutesBuilder {
    endpoints: HashMap<String, Arc<dyn Endpoint>>,
    errors: Vec<FrameworkError>,
}

impl RoutesBuilder {
    /// Registers controller type `C` under `name`, with the dependencies every
    /// instance of it will be built from.
    pub fn controller<C: Controller>(mut self, name: impl Into<String>, context: C::Context) -> Self {
        let name = name.into();
        if name.is_empty() || name.contains('/') {
            self.errors.push(FrameworkError::InvalidRoute(name));
            return self;
        }
        if self.endpoints.contains_key(&name) {
            self.errors.push(FrameworkError::DuplicateController(name));
            return self;
        }
        let endpoint = ControllerEndpoint::<C> {
            context,
            _controller: PhantomData,
        };
        self.endpoints.insert(name, Arc::new(endpoint));
        self
    }

    /// Fails with the first registration error, if any.
    pub fn build(self) -> Result<Routes, FrameworkError> {
        match self.errors.into_iter().next() {
            Some(e) => Err(e),
            None => Ok(Routes {
                endpoints: self.endpoints,
            }),
        }
    }
}

// =============================================================================
// DISPATCHER
// =============================================================================

/// Outcome of one request plus the lifecycle it went through.
#[derive(Debug)]
pub struct Handled {
    pub result: Result<Output, FrameworkError>,
    pub lifecycle: RequestLifecycle,
}

impl Handled {
    pub fn into_result(self) -> Result<Output, FrameworkError> {
        self.result
    }
}

/// Maps requests to controller actions.
///
/// Shareable across tasks (`Arc<Dispatcher>`); each request gets its own
/// controller instance and its own render tracking, and nothing else is
/// mutable between requests.
pub struct Dispatcher {
    routes: RwLock<Arc<Routes>>,
    views: Arc<dyn Render>,
}

impl Dispatcher {
    pub fn new(routes: Routes, views: Arc<dyn Render>) -> Self {
        info!(controllers = ?routes.controllers(), "Dispatcher ready");
        Self {
            routes: RwLock::new(Arc::new(routes)),
            views,
        }
    }

    /// Snapshot of the current route table.
    pub fn routes(&self) -> Arc<Routes> {
        self.routes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the route table. Requests already running keep the table they started with.
    pub fn reload_routes(&self, routes: Routes) {
        info!(controllers = ?routes.controllers(), "Routes reloaded");
        let mut current = self.routes.write().unwrap_or_else(PoisonError::into_inner);
        *current = Arc::new(routes);
    }

    /// Runs the request and returns the rendered output.
    pub async fn dispatch(
        &self,
        target: &RouteTarget,
        params: RequestParams,
    ) -> Result<Output, FrameworkError> {
        self.handle(target, params).await.into_result()
    }

    /// Like [`dispatch`](Self::dispatch), also returning the request's lifecycle.
    pub async fn handle(&self, target: &RouteTarget, params: RequestParams) -> Handled {
        let span = info_span!(
            "dispatch",
            controller = target.controller(),
            action = target.action()
        );
        async move {
            let views = RequestViews::new(self.views.as_ref());
            let outcome = self.invoke(target, params, &views).await;

            // A render failure the action swallowed still fails the request.
            let mut result = match views.take_failure() {
                Some(failure) => Err(failure),
                None => outcome,
            };
            if result.is_ok() {
                if let Err(e) = views.advance(RequestState::Responded) {
                    result = Err(e);
                }
            }

            match &result {
                Ok(output) => info!(view = output.view(), bytes = output.body().len(), "Responded"),
                Err(e) => {
                    views.fail();
                    warn!(error = %e, "Request failed");
                }
            }
            Handled {
                result,
                lifecycle: views.into_lifecycle(),
            }
        }
        .instrument(span)
        .await
    }

    async fn invoke(
        &self,
        target: &RouteTarget,
        params: RequestParams,
        views: &RequestViews<'_>,
    ) -> Result<Output, FrameworkError> {
        let routes = self.routes();
        let endpoint = routes
            .endpoint(target.controller())
            .ok_or_else(|| FrameworkError::UnknownController(target.controller().to_string()))?;
        endpoint.invoke(target, params, views).await
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.routes())
            .finish_non_exhaustive()
    }
}
