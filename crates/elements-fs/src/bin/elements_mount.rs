//! elements-mount: Browse an Elements media store over WebDAV.
//!
//! This binary starts a local, read-only WebDAV server backed by an Elements
//! server, so the media store can be mounted from Finder, Windows Explorer
//! or any WebDAV client.
//!
//! # Usage
//!
//! ```bash
//! # Start WebDAV server
//! elements-mount --config elements.toml
//!
//! # Then mount in Finder: Cmd+K → http://localhost:4918
//! ```

use clap::Parser;
use elements_fs::webdav;
use elements_fs::ElementsConfig;
use env_logger::Env;
use log::{error, info};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

/// Mount an Elements media store via WebDAV server.
#[derive(Parser, Debug)]
#[command(name = "elements-mount")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Base URL of the Elements server (overrides the config file)
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// API token (overrides the config file)
    #[arg(long, env = "ELEMENTS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Path prefix applied to every request (overrides the config file)
    #[arg(long)]
    prefix: Option<String>,

    /// Port to listen on (default: 4918)
    #[arg(short, long, default_value = "4918")]
    port: u16,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn load_config(args: &Args) -> Result<ElementsConfig, String> {
    let mut config = match (&args.config, &args.url) {
        (Some(path), _) => ElementsConfig::load(path).map_err(|e| e.to_string())?,
        (None, Some(url)) => ElementsConfig::new(url.clone()),
        (None, None) => return Err("either --config or --url is required".to_string()),
    };

    if let Some(url) = &args.url {
        config.base_url = url.clone();
    }
    if let Some(token) = &args.token {
        config.token = Some(token.clone());
        config.username = None;
    }
    if let Some(prefix) = &args.prefix {
        config.prefix = prefix.clone();
    }
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn main() {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_timestamp_millis()
        .init();

    let config = match load_config(&args) {
        Ok(c) => c,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            process::exit(1);
        }
    };

    info!("Elements server: {}", config.base_url);
    if !config.prefix.is_empty() {
        info!("Prefix: {}", config.prefix);
    }
    info!("Root strategy: {:?}", config.root_strategy);

    // The blocking HTTP client must be built outside the async runtime.
    let adapter = match config.build_adapter() {
        Ok(a) => Arc::new(a),
        Err(e) => {
            error!("Failed to create adapter: {}", e);
            process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(r) => r,
        Err(e) => {
            error!("Failed to start runtime: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(webdav::serve(adapter, args.port)) {
        error!("Server error: {}", e);
        process::exit(1);
    }
}
