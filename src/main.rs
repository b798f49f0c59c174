//! # MVC Recipe demo
//!
//! Dispatches each route given on the command line and prints the page.
//!
//! ```bash
//! RUST_LOG=info cargo run -- user/index "user/show?email=jane@example.com"
//! ```
//!
//! With no arguments it dispatches `user/index`. Settings are read from the
//! TOML file named by `MVC_CONFIG` (if set) and then from `MVC_*` variables;
//! see [`mvc_recipe::lifecycle::config`].

use mvc_recipe::framework::RequestParams;
use mvc_recipe::lifecycle::{setup_tracing, App, AppConfig};
use mvc_recipe::user_controller::StaticUserDirectory;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// Splits `user/show?email=a@b.c&x=y` into the route and its parameters.
fn parse_request(raw: &str) -> (&str, RequestParams) {
    match raw.split_once('?') {
        Some((route, query)) => {
            let params = query
                .split('&')
                .filter_map(|pair| pair.split_once('='))
                .collect();
            (route, params)
        }
        None => (raw, RequestParams::new()),
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let config_path = std::env::var_os("MVC_CONFIG").map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref()).map_err(|e| e.to_string())?;

    let app = App::new(config, Arc::new(StaticUserDirectory::sample())).map_err(|e| e.to_string())?;

    let mut requests: Vec<String> = std::env::args().skip(1).collect();
    if requests.is_empty() {
        requests.push("user/index".to_string());
    }

    let mut failed = 0;
    for raw in &requests {
        let (route, params) = parse_request(raw);
        match app.dispatch(route, params).await {
            Ok(output) => println!("{output}"),
            Err(e) => {
                error!(route, error = %e, "Dispatch failed");
                failed += 1;
            }
        }
    }

    info!(requests = requests.len(), failed, "Done");
    if failed > 0 {
        return Err(format!("{failed} of {} requests failed", requests.len()));
    }
    Ok(())
}
