use crate::framework::view::{FileStore, TemplateStore};
use crate::framework::{
    Dispatcher, FrameworkError, Output, RequestParams, RouteTarget, Routes, ViewEngine,
};
use crate::lifecycle::config::AppConfig;
use crate::user_controller::{self, UserDirectory};
use std::sync::Arc;
use tracing::info;

/// The application orchestrator.
///
/// `App` is responsible for:
/// - **Wiring**: building the template store, the [`ViewEngine`] and the route
///   table from an [`AppConfig`]
/// - **Dependency Injection**: handing the [`UserDirectory`] to the User controller
/// - **Warm-up**: compiling the configured views before the first request
///
/// # Example
///
/// ```ignore
/// let app = App::new(AppConfig::load(None)?, Arc::new(StaticUserDirectory::sample()))?;
///
/// let page = app.dispatch("user/index", RequestParams::new()).await?;
/// println!("{page}");
/// ```
pub struct App {
    config: AppConfig,
    views: Arc<ViewEngine>,
    dispatcher: Arc<Dispatcher>,
}

impl App {
    /// Builds the application with templates read from `config.views_dir`.
    pub fn new(config: AppConfig, directory: Arc<dyn UserDirectory>) -> Result<Self, FrameworkError> {
        let store = FileStore::new(&config.views_dir, &config.view_extension);
        Self::with_store(config, Arc::new(store), directory)
    }

    /// Builds the application on top of any template store.
    pub fn with_store(
        config: AppConfig,
        store: Arc<dyn TemplateStore>,
        directory: Arc<dyn UserDirectory>,
    ) -> Result<Self, FrameworkError> {
        let views = Arc::new(ViewEngine::new(store).with_max_partial_depth(config.max_partial_depth));
        views.resolver().preload(&config.preload_views)?;

        let routes = user_controller::register(Routes::builder(), directory).build()?;
        let dispatcher = Arc::new(Dispatcher::new(routes, views.clone()));

        info!(
            views_dir = %config.views_dir.display(),
            preloaded = config.preload_views.len(),
            "App ready"
        );
        Ok(Self {
            config,
            views,
            dispatcher,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Shared handle for serving requests from several tasks.
    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.dispatcher)
    }

    pub fn views(&self) -> &ViewEngine {
        &self.views
    }

    /// Parses `route` (`controller/action` or `controller`) and dispatches it.
    pub async fn dispatch(&self, route: &str, params: RequestParams) -> Result<Output, FrameworkError> {
        let target: RouteTarget = route.parse()?;
        self.dispatcher.dispatch(&target, params).await
    }

    /// Drops compiled views and compiles the configured ones again.
    pub fn reload_views(&self) -> Result<(), FrameworkError> {
        let resolver = self.views.resolver();
        resolver.reload();
        resolver.preload(&self.config.preload_views)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::view::MemoryStore;
    use crate::framework::RenderError;
    use crate::user_controller::StaticUserDirectory;

    fn store() -> Arc<MemoryStore> {
        Arc::new(
            MemoryStore::new()
                .with("user/index", "{{#each users as u}}{{u.name}};{{/each}}")
                .with("user/show", "{{user.name}}"),
        )
    }

    #[tokio::test]
    async fn test_app_preloads_configured_views() {
        let config = AppConfig {
            preload_views: vec!["user/index".into()],
            ..AppConfig::default()
        };
        let app = App::with_store(config, store(), Arc::new(StaticUserDirectory::sample())).unwrap();
        assert_eq!(app.views().resolver().cached_views(), vec!["user/index"]);

        app.reload_views().unwrap();
        assert_eq!(app.views().resolver().cached_views(), vec!["user/index"]);
    }

    #[tokio::test]
    async fn test_missing_preload_view_fails_startup() {
        let config = AppConfig {
            preload_views: vec!["user/missing".into()],
            ..AppConfig::default()
        };
        let err = App::with_store(config, store(), Arc::new(StaticUserDirectory::sample()))
            .err()
            .unwrap();
        assert!(matches!(
            err.as_render(),
            Some(RenderError::ViewNotFound(name)) if name == "user/missing"
        ));
    }

    #[tokio::test]
    async fn test_dispatch_by_route_string() {
        let app = App::with_store(
            AppConfig::default(),
            store(),
            Arc::new(StaticUserDirectory::sample()),
        )
        .unwrap();

        let output = app.dispatch("user", RequestParams::new()).await.unwrap();
        assert_eq!(output.body(), "John Doe;Jane Doe;");

        let err = app.dispatch("a/b/c", RequestParams::new()).await.unwrap_err();
        assert!(matches!(err, FrameworkError::InvalidRoute(_)));
    }
}
