//! # Request & View Data
//!
//! The values that flow through one request: the [`RouteTarget`] and
//! [`RequestParams`] handed in by the transport, and the [`ViewContext`] an
//! action hands to the renderer.

use crate::framework::error::{ContextError, FrameworkError};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Action used when a route names only a controller.
pub const DEFAULT_ACTION: &str = "index";

/// The `(controller, action)` pair a request is routed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteTarget {
    controller: String,
    action: String,
}

impl RouteTarget {
    pub fn new(controller: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            controller: controller.into(),
            action: action.into(),
        }
    }

    pub fn controller(&self) -> &str {
        &self.controller
    }

    pub fn action(&self) -> &str {
        &self.action
    }
}

/// Parses `"controller/action"`, or `"controller"` for its `index` action.
/// Leading and trailing slashes are ignored.
impl FromStr for RouteTarget {
    type Err = FrameworkError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim().trim_matches('/');
        let mut parts = trimmed.split('/');
        let controller = parts.next().unwrap_or_default();
        let action = parts.next().unwrap_or(DEFAULT_ACTION);

        if controller.is_empty() || action.is_empty() || parts.next().is_some() {
            return Err(FrameworkError::InvalidRoute(raw.to_string()));
        }
        Ok(Self::new(controller, action))
    }
}

impl fmt::Display for RouteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.controller, self.action)
    }
}

/// Request parameters as decoded by the transport layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams {
    values: BTreeMap<String, String>,
}

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RequestParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// The variables visible to a template while it renders.
///
/// Keys are unique: binding the same key twice is an error rather than a
/// silent overwrite, so an action cannot accidentally shadow its own data.
/// The renderer only ever borrows a context, it never mutates it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewContext {
    values: BTreeMap<String, Value>,
}

impl ViewContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes `value` and binds it under `key`.
    pub fn insert<T: Serialize + ?Sized>(
        &mut self,
        key: impl Into<String>,
        value: &T,
    ) -> Result<&mut Self, ContextError> {
        let key = key.into();
        if self.values.contains_key(&key) {
            return Err(ContextError::DuplicateKey(key));
        }
        let value = serde_json::to_value(value).map_err(|source| ContextError::Serialize {
            key: key.clone(),
            source,
        })?;
        self.values.insert(key, value);
        Ok(self)
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with<T: Serialize + ?Sized>(
        mut self,
        key: impl Into<String>,
        value: &T,
    ) -> Result<Self, ContextError> {
        self.insert(key, value)?;
        Ok(self)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_target_parses_controller_and_action() {
        let target: RouteTarget = "user/show".parse().unwrap();
        assert_eq!(target.controller(), "user");
        assert_eq!(target.action(), "show");
        assert_eq!(target.to_string(), "user/show");
    }

    #[test]
    fn route_target_defaults_to_index() {
        let target: RouteTarget = "/user/".parse().unwrap();
        assert_eq!(target, RouteTarget::new("user", "index"));
    }

    #[test]
    fn route_target_rejects_malformed_input() {
        for raw in ["", "/", "  ", "a/b/c", "user//show"] {
            assert!(
                matches!(raw.parse::<RouteTarget>(), Err(FrameworkError::InvalidRoute(_))),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn view_context_rejects_duplicate_keys() {
        let mut ctx = ViewContext::new();
        ctx.insert("user", "John").unwrap();
        let err = ctx.insert("user", "Jane").unwrap_err();
        assert!(matches!(err, ContextError::DuplicateKey(key) if key == "user"));
        assert_eq!(ctx.get("user"), Some(&Value::from("John")));
    }

    #[test]
    fn view_context_serializes_values() {
        #[derive(Serialize)]
        struct Row {
            name: &'static str,
        }

        let ctx = ViewContext::new()
            .with("rows", &[Row { name: "a" }, Row { name: "b" }])
            .unwrap()
            .with("count", &2)
            .unwrap();

        assert_eq!(ctx.len(), 2);
        assert_eq!(ctx.get("rows").unwrap()[1]["name"], "b");
        assert_eq!(ctx.keys().collect::<Vec<_>>(), vec!["count", "rows"]);
    }

    #[test]
    fn request_params_lookup() {
        let params: RequestParams = [("email", "john@example.com")].into_iter().collect();
        assert_eq!(params.get("email"), Some("john@example.com"));
        assert_eq!(params.get("missing"), None);
        assert_eq!(params.len(), 1);
    }
}
