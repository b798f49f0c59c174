//! Template execution.
//!
//! The [`Renderer`] walks a compiled template with a [`ViewContext`] as its only
//! variable scope. Every reference must resolve, including those in branches
//! that do not run: a missing key is an `UndefinedVariable` error, never an
//! empty string. Output is built in a
//! private buffer and only handed back once the whole template succeeded.

use super::resolver::{TemplateHandle, ViewResolver};
use super::template::{Node, VarPath};
use crate::framework::context::ViewContext;
use crate::framework::error::RenderError;
use serde_json::Value;
use std::borrow::Cow;
use std::sync::Arc;

/// Default limit on `{{> partial}}` nesting.
pub const DEFAULT_MAX_PARTIAL_DEPTH: usize = 8;

/// Executes compiled templates.
#[derive(Debug)]
pub struct Renderer {
    resolver: Arc<ViewResolver>,
    max_partial_depth: usize,
}

impl Renderer {
    /// `resolver` is used to look up partials.
    pub fn new(resolver: Arc<ViewResolver>) -> Self {
        Self {
            resolver,
            max_partial_depth: DEFAULT_MAX_PARTIAL_DEPTH,
        }
    }

    pub fn with_max_partial_depth(mut self, depth: usize) -> Self {
        self.max_partial_depth = depth;
        self
    }

    pub fn render(&self, handle: &TemplateHandle, data: &ViewContext) -> Result<String, RenderError> {
        let mut chain = vec![handle.name().to_string()];
        self.check_bindings(handle.name(), handle.template().nodes(), data, &mut Vec::new(), &mut chain)?;

        let mut out = String::with_capacity(handle.template().source().len());
        let mut scope = Scope {
            root: data,
            frames: Vec::new(),
        };
        self.render_nodes(handle.name(), handle.template().nodes(), &mut scope, &mut out, 0)?;
        Ok(out)
    }

    /// Checks every reference the template can reach, in branches that will not
    /// run and loops over empty lists too. Only the top-level key is checked
    /// here; fields below it depend on the data and are checked while rendering.
    ///
    /// `bound` holds the enclosing loop bindings, `chain` the views being
    /// checked. A partial already in `chain` is skipped: it was checked with
    /// fewer bindings further out.
    fn check_bindings(
        &self,
        view: &str,
        nodes: &[Node],
        data: &ViewContext,
        bound: &mut Vec<String>,
        chain: &mut Vec<String>,
    ) -> Result<(), RenderError> {
        let check = |path: &VarPath, bound: &[String]| {
            let head = path.head();
            if bound.iter().any(|name| name == head) || data.contains_key(head) {
                Ok(())
            } else {
                Err(RenderError::UndefinedVariable {
                    view: view.to_string(),
                    name: path.raw().to_string(),
                })
            }
        };

        for node in nodes {
            match node {
                Node::Text(_) => {}
                Node::Var { path, .. } => check(path, bound.as_slice())?,
                Node::Each { path, binding, body } => {
                    check(path, bound.as_slice())?;
                    bound.push(binding.clone());
                    let result = self.check_bindings(view, body, data, bound, chain);
                    bound.pop();
                    result?;
                }
                Node::If { path, then, otherwise } => {
                    check(path, bound.as_slice())?;
                    self.check_bindings(view, then, data, bound, chain)?;
                    self.check_bindings(view, otherwise, data, bound, chain)?;
                }
                Node::Partial(name) => {
                    if chain.iter().any(|seen| seen == name) {
                        continue;
                    }
                    if chain.len() > self.max_partial_depth {
                        return Err(RenderError::PartialDepthExceeded {
                            view: view.to_string(),
                            limit: self.max_partial_depth,
                        });
                    }
                    let partial = self.resolver.resolve(name)?;
                    chain.push(name.clone());
                    let result =
                        self.check_bindings(partial.name(), partial.template().nodes(), data, bound, chain);
                    chain.pop();
                    result?;
                }
            }
        }
        Ok(())
    }

    fn render_nodes<'v>(
        &self,
        view: &str,
        nodes: &[Node],
        scope: &mut Scope<'v>,
        out: &mut String,
        depth: usize,
    ) -> Result<(), RenderError> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Var { path, escape } => {
                    let value = scope.lookup(view, path)?;
                    let text = scalar_text(view, path, value)?;
                    if *escape {
                        escape_html_into(out, &text);
                    } else {
                        out.push_str(&text);
                    }
                }
                Node::Each { path, binding, body } => {
                    let Value::Array(items) = scope.lookup(view, path)? else {
                        return Err(RenderError::NotIterable {
                            view: view.to_string(),
                            name: path.raw().to_string(),
                        });
                    };
                    for item in items {
                        scope.frames.push((binding.clone(), item));
                        let result = self.render_nodes(view, body, scope, out, depth);
                        scope.frames.pop();
                        result?;
                    }
                }
                Node::If { path, then, otherwise } => {
                    let branch = if is_truthy(scope.lookup(view, path)?) {
                        then
                    } else {
                        otherwise
                    };
                    self.render_nodes(view, branch, scope, out, depth)?;
                }
                Node::Partial(name) => {
                    if depth >= self.max_partial_depth {
                        return Err(RenderError::PartialDepthExceeded {
                            view: view.to_string(),
                            limit: self.max_partial_depth,
                        });
                    }
                    let partial = self.resolver.resolve(name)?;
                    self.render_nodes(
                        partial.name(),
                        partial.template().nodes(),
                        scope,
                        out,
                        depth + 1,
                    )?;
                }
            }
        }
        Ok(())
    }
}

/// The bound context plus the loop variables currently in scope.
struct Scope<'v> {
    root: &'v ViewContext,
    frames: Vec<(String, &'v Value)>,
}

impl<'v> Scope<'v> {
    fn lookup(&self, view: &str, path: &VarPath) -> Result<&'v Value, RenderError> {
        let undefined = || RenderError::UndefinedVariable {
            view: view.to_string(),
            name: path.raw().to_string(),
        };

        let head = path.head();
        let mut value = self
            .frames
            .iter()
            .rev()
            .find(|(name, _)| name == head)
            .map(|(_, value)| *value)
            .or_else(|| self.root.get(head))
            .ok_or_else(undefined)?;

        for segment in path.tail() {
            value = match value {
                Value::Object(fields) => fields.get(segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            }
            .ok_or_else(undefined)?;
        }
        Ok(value)
    }
}

fn scalar_text<'a>(view: &str, path: &VarPath, value: &'a Value) -> Result<Cow<'a, str>, RenderError> {
    match value {
        Value::String(s) => Ok(Cow::Borrowed(s)),
        Value::Number(n) => Ok(Cow::Owned(n.to_string())),
        Value::Bool(b) => Ok(Cow::Borrowed(if *b { "true" } else { "false" })),
        Value::Null => Ok(Cow::Borrowed("")),
        Value::Array(_) | Value::Object(_) => Err(RenderError::NotRenderable {
            view: view.to_string(),
            name: path.raw().to_string(),
        }),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

fn escape_html_into(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::view::store::MemoryStore;
    use serde_json::json;

    fn renderer(store: MemoryStore) -> (Arc<ViewResolver>, Renderer) {
        let resolver = Arc::new(ViewResolver::new(Arc::new(store)));
        let renderer = Renderer::new(Arc::clone(&resolver));
        (resolver, renderer)
    }

    fn render_one(source: &str, data: &ViewContext) -> Result<String, RenderError> {
        let (resolver, renderer) = renderer(MemoryStore::new().with("test/view", source));
        let handle = resolver.resolve("test/view")?;
        renderer.render(&handle, data)
    }

    #[test]
    fn interpolates_and_escapes() {
        let data = ViewContext::new()
            .with("user", &json!({ "name": "<b>Jo & Co</b>", "age": 41, "admin": false }))
            .unwrap();
        let out = render_one(
            "{{ user.name }}|{{{ user.name }}}|{{ user.age }}|{{ user.admin }}",
            &data,
        )
        .unwrap();
        assert_eq!(out, "&lt;b&gt;Jo &amp; Co&lt;/b&gt;|<b>Jo & Co</b>|41|false");
    }

    #[test]
    fn undefined_variable_fails_instead_of_rendering_empty() {
        let err = render_one("Hello {{user}}!", &ViewContext::new()).unwrap_err();
        assert_eq!(
            err,
            RenderError::UndefinedVariable {
                view: "test/view".into(),
                name: "user".into(),
            }
        );
    }

    #[test]
    fn undefined_nested_field_fails() {
        let data = ViewContext::new().with("user", &json!({ "name": "Jo" })).unwrap();
        let err = render_one("{{ user.email }}", &data).unwrap_err();
        assert!(matches!(err, RenderError::UndefinedVariable { name, .. } if name == "user.email"));
    }

    #[test]
    fn iterates_with_loop_bindings_and_indices() {
        let data = ViewContext::new()
            .with("users", &json!([{ "name": "John" }, { "name": "Jane" }]))
            .unwrap();
        let out = render_one(
            "{{#each users as user}}[{{ user.name }}]{{/each}} first={{ users.0.name }}",
            &data,
        )
        .unwrap();
        assert_eq!(out, "[John][Jane] first=John");
    }

    #[test]
    fn loop_binding_is_not_visible_after_the_loop() {
        let data = ViewContext::new().with("users", &json!(["a"])).unwrap();
        let err = render_one("{{#each users as u}}{{u}}{{/each}}{{u}}", &data).unwrap_err();
        assert!(matches!(err, RenderError::UndefinedVariable { name, .. } if name == "u"));
    }

    #[test]
    fn conditionals_follow_truthiness() {
        let data = ViewContext::new()
            .with("empty", &json!([]))
            .unwrap()
            .with("name", "Jo")
            .unwrap();
        let out = render_one(
            "{{#if empty}}yes{{else}}no{{/if}}-{{#if name}}{{name}}{{/if}}",
            &data,
        )
        .unwrap();
        assert_eq!(out, "no-Jo");
    }

    #[test]
    fn untaken_branches_are_checked_too() {
        let data = ViewContext::new().with("show", &false).unwrap();
        let err = render_one("{{#if show}}{{user}}{{/if}}", &data).unwrap_err();
        assert_eq!(
            err,
            RenderError::UndefinedVariable {
                view: "test/view".into(),
                name: "user".into(),
            }
        );

        let err = render_one("{{#if show}}{{{ footer }}}{{else}}-{{/if}}", &data).unwrap_err();
        assert!(matches!(err, RenderError::UndefinedVariable { name, .. } if name == "footer"));
    }

    #[test]
    fn empty_loops_are_checked_too() {
        // `user` instead of the loop's own `u`: must fail even with no users.
        let data = ViewContext::new().with("users", &json!([])).unwrap();
        let err = render_one("{{#each users as u}}{{ user }}{{/each}}", &data).unwrap_err();
        assert_eq!(
            err,
            RenderError::UndefinedVariable {
                view: "test/view".into(),
                name: "user".into(),
            }
        );

        assert_eq!(
            render_one("{{#each users as u}}{{ u.name }}{{/each}}", &data).unwrap(),
            ""
        );
    }

    #[test]
    fn partials_in_untaken_branches_are_checked_with_their_bindings() {
        let (resolver, renderer) = renderer(
            MemoryStore::new()
                .with("user/index", "{{#each users as user}}{{> user/row}}{{/each}}{{#if none}}{{> user/empty}}{{/if}}")
                .with("user/row", "<li>{{ user.name }}</li>")
                .with("user/empty", "{{ message }}"),
        );
        let handle = resolver.resolve("user/index").unwrap();

        let data = ViewContext::new()
            .with("users", &json!([]))
            .unwrap()
            .with("none", &false)
            .unwrap();
        let err = renderer.render(&handle, &data).unwrap_err();
        assert!(matches!(err, RenderError::UndefinedVariable { view, name }
            if view == "user/empty" && name == "message"));

        let data = ViewContext::new()
            .with("users", &json!([]))
            .unwrap()
            .with("none", &true)
            .unwrap()
            .with("message", "nobody here")
            .unwrap();
        assert_eq!(renderer.render(&handle, &data).unwrap(), "nobody here");
    }

    #[test]
    fn conditional_on_missing_key_is_an_error() {
        let err = render_one("{{#if flag}}x{{/if}}", &ViewContext::new()).unwrap_err();
        assert!(matches!(err, RenderError::UndefinedVariable { .. }));
    }

    #[test]
    fn objects_cannot_be_printed_and_scalars_cannot_be_iterated() {
        let data = ViewContext::new().with("user", &json!({ "name": "Jo" })).unwrap();
        assert!(matches!(
            render_one("{{ user }}", &data),
            Err(RenderError::NotRenderable { .. })
        ));
        assert!(matches!(
            render_one("{{#each user.name as c}}{{/each}}", &data),
            Err(RenderError::NotIterable { .. })
        ));
    }

    #[test]
    fn partials_share_the_current_scope() {
        let (resolver, renderer) = renderer(
            MemoryStore::new()
                .with("user/index", "<ul>{{#each users as user}}{{> user/row}}{{/each}}</ul>")
                .with("user/row", "<li>{{ user.name }}</li>"),
        );
        let data = ViewContext::new()
            .with("users", &json!([{ "name": "John" }, { "name": "Jane" }]))
            .unwrap();
        let handle = resolver.resolve("user/index").unwrap();
        assert_eq!(
            renderer.render(&handle, &data).unwrap(),
            "<ul><li>John</li><li>Jane</li></ul>"
        );
    }

    #[test]
    fn errors_inside_partials_name_the_partial() {
        let (resolver, renderer) = renderer(
            MemoryStore::new()
                .with("page/main", "{{> page/missing_key}}")
                .with("page/missing_key", "{{ nope }}"),
        );
        let handle = resolver.resolve("page/main").unwrap();
        let err = renderer.render(&handle, &ViewContext::new()).unwrap_err();
        assert!(matches!(err, RenderError::UndefinedVariable { view, .. } if view == "page/missing_key"));
    }

    #[test]
    fn recursive_partials_hit_the_depth_limit() {
        let (resolver, renderer) = renderer(MemoryStore::new().with("loop/self", "x{{> loop/self}}"));
        let renderer = renderer.with_max_partial_depth(3);
        let handle = resolver.resolve("loop/self").unwrap();
        assert_eq!(
            renderer.render(&handle, &ViewContext::new()),
            Err(RenderError::PartialDepthExceeded {
                view: "loop/self".into(),
                limit: 3,
            })
        );
    }

    #[test]
    fn rendering_does_not_touch_the_callers_context() {
        let data = ViewContext::new().with("users", &json!(["a", "b"])).unwrap();
        let before = data.clone();
        render_one("{{#each users as users}}{{ users }}{{/each}}", &data).unwrap();
        assert_eq!(data, before);
    }
}
