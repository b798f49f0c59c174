//! Template compiler.
//!
//! Turns template source into a tree of [`Node`]s once, at resolution time, so
//! rendering never re-parses text. Syntax errors surface as
//! [`RenderError::TemplateSyntax`] with the line the offending tag starts on.

use crate::framework::error::RenderError;

/// Deepest `#each`/`#if` nesting a template may use.
pub const MAX_BLOCK_DEPTH: usize = 64;

/// A dotted variable reference such as `user.name` or `users.0.email`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct VarPath {
    raw: String,
    segments: Vec<String>,
}

impl VarPath {
    pub(crate) fn raw(&self) -> &str {
        &self.raw
    }

    pub(crate) fn head(&self) -> &str {
        &self.segments[0]
    }

    pub(crate) fn tail(&self) -> &[String] {
        &self.segments[1..]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Node {
    Text(String),
    Var { path: VarPath, escape: bool },
    Each { path: VarPath, binding: String, body: Vec<Node> },
    If { path: VarPath, then: Vec<Node>, otherwise: Vec<Node> },
    Partial(String),
}

/// A compiled template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    nodes: Vec<Node>,
}

impl Template {
    /// Compiles `source`; `view` is only used for error messages.
    pub fn compile(view: &str, source: impl Into<String>) -> Result<Self, RenderError> {
        let source = source.into();
        let tokens = tokenize(view, &source)?;
        let mut parser = Parser {
            view,
            tokens: tokens.into_iter(),
        };
        let (nodes, stop) = parser.parse_block(0)?;
        match stop {
            Stop::Eof => Ok(Self { source, nodes }),
            Stop::Else { line } => Err(syntax(view, line, "{{else}} outside of {{#if}}")),
            Stop::Close { kind, line } => {
                Err(syntax(view, line, format!("unexpected {{{{/{kind}}}}}")))
            }
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub(crate) fn nodes(&self) -> &[Node] {
        &self.nodes
    }
}

fn syntax(view: &str, line: usize, message: impl Into<String>) -> RenderError {
    RenderError::TemplateSyntax {
        view: view.to_string(),
        line,
        message: message.into(),
    }
}

// =============================================================================
// TOKENIZER
// =============================================================================

#[derive(Debug)]
enum TokenKind {
    Text(String),
    Var { path: VarPath, escape: bool },
    OpenEach { path: VarPath, binding: String },
    OpenIf { path: VarPath },
    Else,
    Close(String),
    Partial(String),
}

#[derive(Debug)]
struct Token {
    kind: TokenKind,
    line: usize,
}

fn tokenize(view: &str, source: &str) -> Result<Vec<Token>, RenderError> {
    let mut tokens = Vec::new();
    let mut rest = source;
    let mut line = 1;

    while let Some(start) = rest.find("{{") {
        if start > 0 {
            tokens.push(Token {
                kind: TokenKind::Text(rest[..start].to_string()),
                line,
            });
            line += rest[..start].matches('\n').count();
        }

        let after = &rest[start..];
        let (open, close) = if after.starts_with("{{{") {
            ("{{{", "}}}")
        } else {
            ("{{", "}}")
        };
        let body_start = open.len();
        let Some(end) = after[body_start..].find(close) else {
            return Err(syntax(view, line, format!("unclosed `{open}`")));
        };
        let tag = &after[body_start..body_start + end];

        if let Some(kind) = parse_tag(view, line, tag, open == "{{{")? {
            tokens.push(Token { kind, line });
        }

        line += tag.matches('\n').count();
        rest = &after[body_start + end + close.len()..];
    }

    if !rest.is_empty() {
        tokens.push(Token {
            kind: TokenKind::Text(rest.to_string()),
            line,
        });
    }
    Ok(tokens)
}

/// Parses the inside of one `{{ ... }}` tag. Comments yield `None`.
fn parse_tag(view: &str, line: usize, tag: &str, raw: bool) -> Result<Option<TokenKind>, RenderError> {
    let tag = tag.trim();
    if tag.is_empty() {
        return Err(syntax(view, line, "empty tag"));
    }
    if raw {
        return parse_path(view, line, tag).map(|path| Some(TokenKind::Var { path, escape: false }));
    }

    let kind = if tag.starts_with('!') {
        return Ok(None);
    } else if let Some(block) = tag.strip_prefix('#') {
        let words: Vec<&str> = block.split_whitespace().collect();
        match words.as_slice() {
            ["each", path, "as", binding] => TokenKind::OpenEach {
                path: parse_path(view, line, path)?,
                binding: parse_identifier(view, line, binding)?,
            },
            ["if", path] => TokenKind::OpenIf {
                path: parse_path(view, line, path)?,
            },
            ["each", ..] => {
                return Err(syntax(view, line, "expected `{{#each <path> as <name>}}`"));
            }
            ["if", ..] => return Err(syntax(view, line, "expected `{{#if <path>}}`")),
            _ => return Err(syntax(view, line, format!("unknown block `{block}`"))),
        }
    } else if let Some(kind) = tag.strip_prefix('/') {
        match kind.trim() {
            k @ ("each" | "if") => TokenKind::Close(k.to_string()),
            other => return Err(syntax(view, line, format!("unknown block `/{other}`"))),
        }
    } else if tag == "else" {
        TokenKind::Else
    } else if let Some(name) = tag.strip_prefix('>') {
        let name = name.trim();
        if name.is_empty() {
            return Err(syntax(view, line, "partial name missing"));
        }
        TokenKind::Partial(name.to_string())
    } else {
        TokenKind::Var {
            path: parse_path(view, line, tag)?,
            escape: true,
        }
    };
    Ok(Some(kind))
}

fn parse_path(view: &str, line: usize, raw: &str) -> Result<VarPath, RenderError> {
    let segments: Vec<String> = raw.split('.').map(str::to_string).collect();
    let valid = segments.iter().all(|s| {
        !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    });
    if !valid {
        return Err(syntax(view, line, format!("invalid variable `{raw}`")));
    }
    Ok(VarPath {
        raw: raw.to_string(),
        segments,
    })
}

fn parse_identifier(view: &str, line: usize, raw: &str) -> Result<String, RenderError> {
    let mut chars = raw.chars();
    let starts_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if starts_ok && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(raw.to_string())
    } else {
        Err(syntax(view, line, format!("invalid loop variable `{raw}`")))
    }
}

// =============================================================================
// PARSER
// =============================================================================

enum Stop {
    Eof,
    Else { line: usize },
    Close { kind: String, line: usize },
}

struct Parser<'v> {
    view: &'v str,
    tokens: std::vec::IntoIter<Token>,
}

impl Parser<'_> {
    /// Collects nodes until the end of input or a token that ends a block.
    /// `depth` is the number of blocks enclosing this one.
    fn parse_block(&mut self, depth: usize) -> Result<(Vec<Node>, Stop), RenderError> {
        let mut nodes = Vec::new();
        while let Some(Token { kind, line }) = self.tokens.next() {
            match kind {
                TokenKind::Text(text) => nodes.push(Node::Text(text)),
                TokenKind::Var { path, escape } => nodes.push(Node::Var { path, escape }),
                TokenKind::Partial(name) => nodes.push(Node::Partial(name)),
                TokenKind::Else => return Ok((nodes, Stop::Else { line })),
                TokenKind::Close(kind) => return Ok((nodes, Stop::Close { kind, line })),
                TokenKind::OpenEach { path, binding } => {
                    self.check_depth(depth, line)?;
                    let (body, stop) = self.parse_block(depth + 1)?;
                    self.expect_close("each", line, stop)?;
                    nodes.push(Node::Each { path, binding, body });
                }
                TokenKind::OpenIf { path } => {
                    self.check_depth(depth, line)?;
                    let (then, stop) = self.parse_block(depth + 1)?;
                    let otherwise = match stop {
                        Stop::Else { .. } => {
                            let (otherwise, stop) = self.parse_block(depth + 1)?;
                            self.expect_close("if", line, stop)?;
                            otherwise
                        }
                        stop => {
                            self.expect_close("if", line, stop)?;
                            Vec::new()
                        }
                    };
                    nodes.push(Node::If { path, then, otherwise });
                }
            }
        }
        Ok((nodes, Stop::Eof))
    }

    fn check_depth(&self, depth: usize, line: usize) -> Result<(), RenderError> {
        if depth >= MAX_BLOCK_DEPTH {
            return Err(syntax(
                self.view,
                line,
                format!("blocks nested deeper than {MAX_BLOCK_DEPTH} levels"),
            ));
        }
        Ok(())
    }

    fn expect_close(&self, expected: &str, opened_at: usize, stop: Stop) -> Result<(), RenderError> {
        match stop {
            Stop::Close { kind, .. } if kind == expected => Ok(()),
            Stop::Close { kind, line } => Err(syntax(
                self.view,
                line,
                format!("expected {{{{/{expected}}}}}, found {{{{/{kind}}}}}"),
            )),
            Stop::Else { line } => Err(syntax(self.view, line, "{{else}} outside of {{#if}}")),
            Stop::Eof => Err(syntax(
                self.view,
                opened_at,
                format!("unclosed {{{{#{expected}}}}}"),
            )),
        }
    }
}
