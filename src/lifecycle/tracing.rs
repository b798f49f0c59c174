//! # Observability & Tracing
//!
//! [`setup_tracing`] installs the global `tracing` subscriber used by the demo
//! binary. Log levels come from `RUST_LOG`; the output is the compact format
//! with module paths hidden (`with_target(false)`), since the structured
//! fields already say where an event came from.
//!
//! ## What Gets Traced
//!
//! - **Requests**: a `dispatch` span per request carrying `controller` and
//!   `action`, closed by `Responded` (info) or `Request failed` (warn)
//! - **Renders**: a `render` span per view with the number of bound keys
//! - **View cache**: resets (info), compilations and cache hits (debug)
//! - **Lifecycle**: every request state transition, at debug level
//!
//! ## Usage Examples
//!
//! ```bash
//! # One line per request
//! RUST_LOG=info cargo run -- user/index
//!
//! # State transitions and render sizes
//! RUST_LOG=debug cargo run -- user/index user/show?email=jane@example.com
//!
//! # Only the framework internals
//! RUST_LOG=mvc_recipe::framework=debug cargo run
//! ```
//!
//! With `RUST_LOG=info` a successful request reads:
//!
//! ```text
//! INFO App ready views_dir="views" preloaded=0
//! INFO dispatch: Responded controller="user" action="index" view="user/index" bytes=212
//! ```
//!
//! and a failing one:
//!
//! ```text
//! WARN dispatch: Request failed controller="post" action="index" error=Unknown controller: post
//! ```

/// Installs the global subscriber. Call once, at startup.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
