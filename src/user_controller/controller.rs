//! Controller trait implementation for [`UserController`].
//!
//! See the trait implementation on [`UserController`] for what each action binds.

use super::actions::UserAction;
use super::error::UserError;
use super::{UserContext, UserController};
use crate::framework::{ActionError, Controller, Output, Render, RequestParams, ViewContext};
use async_trait::async_trait;
use tracing::debug;

#[async_trait]
impl Controller for UserController {
    type Action = UserAction;
    type Context = UserContext;
    type Error = UserError;

    const ACTIONS: &'static [&'static str] = UserAction::ALL;

    fn new(ctx: &UserContext) -> Self {
        Self {
            directory: ctx.directory.clone(),
        }
    }

    /// Rejects `show` requests without an `email` parameter before any lookup happens.
    async fn before_action(
        &mut self,
        action: &UserAction,
        params: &RequestParams,
    ) -> Result<(), UserError> {
        debug!(?action, params = params.len(), "Before user action");
        match action {
            UserAction::Show if params.get("email").is_none() => {
                Err(UserError::MissingParam("email"))
            }
            _ => Ok(()),
        }
    }

    /// Runs the action.
    ///
    /// # Bindings
    /// - `index`: `users` (every user) and `count`, view `user/index`
    /// - `show`: `user`, view `user/show`
    async fn handle_action(
        &mut self,
        action: UserAction,
        params: RequestParams,
        views: &dyn Render,
    ) -> Result<Output, ActionError<UserError>> {
        match action {
            UserAction::Index => {
                let users = self.directory.list().await.map_err(ActionError::Failed)?;
                let data = ViewContext::new()
                    .with("users", &users)?
                    .with("count", &users.len())?;
                Ok(views.render("user/index", &data)?)
            }
            UserAction::Show => {
                let email = params
                    .get("email")
                    .ok_or(ActionError::Failed(UserError::MissingParam("email")))?;
                let user = self
                    .directory
                    .find_by_email(email)
                    .await
                    .map_err(ActionError::Failed)?
                    .ok_or_else(|| ActionError::Failed(UserError::NotFound(email.to_string())))?;
                let data = ViewContext::new().with("user", &user)?;
                Ok(views.render("user/show", &data)?)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::mock::MockRenderer;
    use crate::model::User;
    use crate::user_controller::{StaticUserDirectory, UserDirectory};
    use serde_json::json;
    use std::sync::Arc;

    /// A directory whose backing store is down.
    struct UnavailableDirectory;

    #[async_trait]
    impl UserDirectory for UnavailableDirectory {
        async fn list(&self) -> Result<Vec<User>, UserError> {
            Err(UserError::DirectoryError("connection refused".into()))
        }

        async fn find_by_email(&self, _email: &str) -> Result<Option<User>, UserError> {
            Err(UserError::DirectoryError("connection refused".into()))
        }
    }

    fn controller() -> UserController {
        let ctx = UserContext::new(Arc::new(StaticUserDirectory::sample()));
        UserController::new(&ctx)
    }

    #[tokio::test]
    async fn test_index_binds_users() {
        let mut views = MockRenderer::new();
        views.expect_render("user/index").return_ok("users");

        let output = controller()
            .handle_action(UserAction::Index, RequestParams::new(), &views)
            .await
            .unwrap();
        assert_eq!(output.body(), "users");

        let calls = views.calls();
        assert_eq!(calls[0].view, "user/index");
        assert_eq!(
            calls[0].data.get("users"),
            Some(&json!([
                { "name": "John Doe", "email": "john@example.com" },
                { "name": "Jane Doe", "email": "jane@example.com" }
            ]))
        );
        assert_eq!(calls[0].data.get("count"), Some(&json!(2)));
        views.verify();
    }

    #[tokio::test]
    async fn test_show_binds_user() {
        let mut views = MockRenderer::new();
        views.expect_render("user/show").return_ok("jane");

        let params = RequestParams::new().with("email", "jane@example.com");
        controller()
            .handle_action(UserAction::Show, params, &views)
            .await
            .unwrap();

        let calls = views.calls();
        assert_eq!(
            calls[0].data.get("user"),
            Some(&json!({ "name": "Jane Doe", "email": "jane@example.com" }))
        );
        assert!(!calls[0].data.contains_key("users"));
        views.verify();
    }

    #[tokio::test]
    async fn test_show_unknown_email() {
        let views = MockRenderer::new();
        let params = RequestParams::new().with("email", "nobody@example.com");

        let err = controller()
            .handle_action(UserAction::Show, params, &views)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ActionError::Failed(UserError::NotFound(ref email)) if email == "nobody@example.com"
        ));
        assert!(views.calls().is_empty());
    }

    #[tokio::test]
    async fn test_directory_failure_skips_rendering() {
        let ctx = UserContext::new(Arc::new(UnavailableDirectory));
        let views = MockRenderer::new();

        for (action, params) in [
            (UserAction::Index, RequestParams::new()),
            (UserAction::Show, RequestParams::new().with("email", "john@example.com")),
        ] {
            let err = UserController::new(&ctx)
                .handle_action(action, params, &views)
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                ActionError::Failed(UserError::DirectoryError(ref msg)) if msg == "connection refused"
            ));
        }
        assert!(views.calls().is_empty());
    }

    #[tokio::test]
    async fn test_before_action_requires_email_for_show() {
        let mut ctrl = controller();
        let err = ctrl
            .before_action(&UserAction::Show, &RequestParams::new())
            .await
            .unwrap_err();
        assert_eq!(err, UserError::MissingParam("email"));

        ctrl.before_action(&UserAction::Index, &RequestParams::new())
            .await
            .unwrap();
    }

    #[test]
    fn test_action_names_parse() {
        for name in UserController::ACTIONS {
            assert!(name.parse::<UserAction>().is_ok(), "{name} should parse");
        }
        assert_eq!(
            "delete".parse::<UserAction>(),
            Err(UserError::UnknownAction("delete".into()))
        );
    }
}
